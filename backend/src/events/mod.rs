//! Domain event log — an append-only audit trail of state transitions
//! (asset status changes, transaction advancement, bid placement/settlement).
//! This is an ambient observability concern, independent of any transport or
//! logging-backend choice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    AssetStatusChanged {
        asset_id: Uuid,
        from: String,
        to: String,
    },
    AssetListingChanged {
        asset_id: Uuid,
        from: String,
        to: String,
    },
    TransactionStatusChanged {
        transaction_id: Uuid,
        asset_id: Uuid,
        from: String,
        to: String,
    },
    BidPlaced {
        auction_id: Uuid,
        bid_id: Uuid,
        bidder: String,
        amount: rust_decimal::Decimal,
    },
    BidDisplaced {
        auction_id: Uuid,
        bid_id: Uuid,
    },
    AuctionSettled {
        auction_id: Uuid,
        transaction_id: Option<Uuid>,
    },
    AuctionCancelled {
        auction_id: Uuid,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

/// An in-memory, append-only log. Queryable for audit/debugging; nothing in
/// this core depends on events for correctness, so a dropped or unread log
/// never affects an invariant.
#[derive(Debug, Default)]
pub struct EventLog {
    records: Mutex<Vec<EventRecord>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: DomainEvent) {
        let record = EventRecord {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        };
        tracing::debug!(event = ?record.event, "domain event recorded");
        self.records.lock().expect("mutex poisoned").push(record);
    }

    pub fn all(&self) -> Vec<EventRecord> {
        self.records.lock().expect("mutex poisoned").clone()
    }

    pub fn for_entity(&self, predicate: impl Fn(&DomainEvent) -> bool) -> Vec<EventRecord> {
        self.records
            .lock()
            .expect("mutex poisoned")
            .iter()
            .filter(|r| predicate(&r.event))
            .cloned()
            .collect()
    }
}
