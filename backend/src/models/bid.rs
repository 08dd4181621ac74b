//! Bid model — exists only under its [`crate::models::auction::Auction`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    id: Uuid,
    auction_id: Uuid,
    bidder: String,
    amount: Decimal,
    signature: Option<String>,
    is_winning: bool,
    created_at: DateTime<Utc>,
}

impl Bid {
    pub fn new(auction_id: Uuid, bidder: String, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            auction_id,
            bidder,
            amount,
            signature: None,
            is_winning: true,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn auction_id(&self) -> Uuid {
        self.auction_id
    }

    pub fn bidder(&self) -> &str {
        &self.bidder
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_winning(&self) -> bool {
        self.is_winning
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_winning(&mut self, winning: bool) {
        self.is_winning = winning;
    }

    pub(crate) fn set_signature(&mut self, signature: String) {
        self.signature = Some(signature);
    }
}
