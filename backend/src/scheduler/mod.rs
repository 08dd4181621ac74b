//! Clock/Scheduler — the periodic tick that advances time-driven auction
//! transitions.
//!
//! Each tick performs exactly two scans, each as a single
//! pass over the store equivalent to one `UPDATE ... WHERE` statement:
//! flip `SCHEDULED` auctions whose `start_time` has passed to `ACTIVE`, then
//! flip `ACTIVE` auctions whose `end_time` has passed to `ENDED`. Neither
//! scan calls into [`crate::auctions::AuctionEngine`] — settlement stays an
//! explicit, separate action so a dispute window exists between `ENDED` and
//! `SETTLED`.
//!
//! The scheduler does not own an `AuctionEngine`; it is a narrower
//! direct-to-store clock than the engine that handles bids and settlement.

use crate::models::AuctionStatus;
use crate::store::{AuctionFilter, Pagination, Store};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// The set of auction ids each scan flipped, for callers/tests that want to
/// observe what a tick actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub activated: Vec<Uuid>,
    pub ended: Vec<Uuid>,
}

pub struct Scheduler {
    store: Arc<Store>,
    tick_interval: Duration,
}

impl Scheduler {
    pub fn new(store: Arc<Store>, tick_interval: Duration) -> Self {
        Self { store, tick_interval }
    }

    /// Runs every `{SCHEDULED, ACTIVE}` auction through one tick. Idempotent
    /// and safe under concurrent invocations: an auction already past the
    /// boundary it's being checked against is simply skipped by the status
    /// filter on the next pass.
    #[tracing::instrument(skip(self))]
    pub fn tick_once(&self) -> TickReport {
        let now = Utc::now();
        let mut report = TickReport::default();

        let scheduled = self.store.atomic(|txn| {
            Ok(txn
                .list_auctions(
                    &AuctionFilter {
                        status: Some(AuctionStatus::Scheduled),
                        ..Default::default()
                    },
                    Pagination::new(Some(1), Some(10_000), 10_000, 10_000),
                )
                .data)
        });
        if let Ok(scheduled) = scheduled {
            for auction in scheduled {
                if auction.start_time() <= now {
                    let activated = self.store.atomic(|txn| {
                        let mut a = txn.get_auction(auction.id())?;
                        if a.status() == AuctionStatus::Scheduled && a.start_time() <= now {
                            a.set_status(AuctionStatus::Active);
                            txn.update_auction(a)?;
                            Ok(true)
                        } else {
                            Ok(false)
                        }
                    });
                    if matches!(activated, Ok(true)) {
                        tracing::info!(auction_id = %auction.id(), "auction activated by scheduler tick");
                        report.activated.push(auction.id());
                    }
                }
            }
        }

        let active = self.store.atomic(|txn| {
            Ok(txn
                .list_auctions(
                    &AuctionFilter {
                        status: Some(AuctionStatus::Active),
                        ..Default::default()
                    },
                    Pagination::new(Some(1), Some(10_000), 10_000, 10_000),
                )
                .data)
        });
        if let Ok(active) = active {
            for auction in active {
                if auction.end_time() <= now {
                    let ended = self.store.atomic(|txn| {
                        let mut a = txn.get_auction(auction.id())?;
                        if a.status() == AuctionStatus::Active && a.end_time() <= now {
                            a.set_status(AuctionStatus::Ended);
                            txn.update_auction(a)?;
                            Ok(true)
                        } else {
                            Ok(false)
                        }
                    });
                    if matches!(ended, Ok(true)) {
                        tracing::info!(auction_id = %auction.id(), "auction ended by scheduler tick");
                        report.ended.push(auction.id());
                    }
                }
            }
        }

        report
    }

    /// Runs [`Self::tick_once`] on `tick_interval` until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("scheduler stopping on cancellation");
                    return;
                }
                _ = interval.tick() => {
                    self.tick_once();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Auction;
    use rust_decimal_macros::dec;

    #[test]
    fn tick_activates_due_scheduled_auctions() {
        let store = Arc::new(Store::new());
        let now = Utc::now();
        let asset_id = Uuid::new_v4();
        let auction = store
            .atomic(|txn| {
                txn.create_auction(Auction::new(
                    asset_id,
                    dec!(100),
                    10,
                    now - chrono::Duration::seconds(1),
                    now + chrono::Duration::hours(1),
                    now - chrono::Duration::minutes(10),
                ))
            })
            .unwrap();
        assert_eq!(auction.status(), AuctionStatus::Scheduled);

        let scheduler = Scheduler::new(store.clone(), Duration::from_secs(30));
        let report = scheduler.tick_once();
        assert_eq!(report.activated, vec![auction.id()]);

        let refreshed = store.atomic(|txn| txn.get_auction(auction.id())).unwrap();
        assert_eq!(refreshed.status(), AuctionStatus::Active);
    }

    #[test]
    fn tick_ends_expired_active_auctions() {
        let store = Arc::new(Store::new());
        let now = Utc::now();
        let asset_id = Uuid::new_v4();
        let auction = store
            .atomic(|txn| {
                txn.create_auction(Auction::new(
                    asset_id,
                    dec!(100),
                    10,
                    now - chrono::Duration::hours(2),
                    now - chrono::Duration::seconds(1),
                    now - chrono::Duration::hours(3),
                ))
            })
            .unwrap();
        assert_eq!(auction.status(), AuctionStatus::Active);

        let scheduler = Scheduler::new(store.clone(), Duration::from_secs(30));
        let report = scheduler.tick_once();
        assert_eq!(report.ended, vec![auction.id()]);

        let refreshed = store.atomic(|txn| txn.get_auction(auction.id())).unwrap();
        assert_eq!(refreshed.status(), AuctionStatus::Ended);
    }

    #[test]
    fn tick_is_idempotent() {
        let store = Arc::new(Store::new());
        let now = Utc::now();
        let asset_id = Uuid::new_v4();
        store
            .atomic(|txn| {
                txn.create_auction(Auction::new(
                    asset_id,
                    dec!(100),
                    10,
                    now - chrono::Duration::hours(2),
                    now - chrono::Duration::seconds(1),
                    now - chrono::Duration::hours(3),
                ))
            })
            .unwrap();
        let scheduler = Scheduler::new(store.clone(), Duration::from_secs(30));
        let first = scheduler.tick_once();
        let second = scheduler.tick_once();
        assert_eq!(first.ended.len(), 1);
        assert_eq!(second.ended.len(), 0);
    }
}
