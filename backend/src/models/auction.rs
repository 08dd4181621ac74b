//! Auction model — time-boxed competitive sale of a fixed `token_amount` of
//! one asset.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    Scheduled,
    Active,
    Ended,
    Settled,
    Cancelled,
}

impl AuctionStatus {
    /// Auctions in these statuses occupy the asset's schedule and must not
    /// overlap another auction's window (invariant 3).
    pub fn occupies_schedule(self) -> bool {
        matches!(self, AuctionStatus::Scheduled | AuctionStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    id: Uuid,
    asset_id: Uuid,
    reserve_price: Decimal,
    current_bid: Option<Decimal>,
    current_bidder: Option<String>,
    token_amount: u64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: AuctionStatus,
    settled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Auction {
    pub fn new(
        asset_id: Uuid,
        reserve_price: Decimal,
        token_amount: u64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = if start_time > now {
            AuctionStatus::Scheduled
        } else {
            AuctionStatus::Active
        };
        Self {
            id: Uuid::new_v4(),
            asset_id,
            reserve_price,
            current_bid: None,
            current_bidder: None,
            token_amount,
            start_time,
            end_time,
            status,
            settled_at: None,
            created_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn asset_id(&self) -> Uuid {
        self.asset_id
    }

    pub fn reserve_price(&self) -> Decimal {
        self.reserve_price
    }

    pub fn current_bid(&self) -> Option<Decimal> {
        self.current_bid
    }

    pub fn current_bidder(&self) -> Option<&str> {
        self.current_bidder.as_deref()
    }

    pub fn token_amount(&self) -> u64 {
        self.token_amount
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn status(&self) -> AuctionStatus {
        self.status
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Minimum accepted bid: the reserve price if there is no bid yet,
    /// otherwise the current bid plus `bid_increment_pct`.    /// Boundary is inclusive (`>=`).
    pub fn minimum_bid(&self, bid_increment_pct: Decimal) -> Decimal {
        match self.current_bid {
            Some(current) => current * (Decimal::ONE + bid_increment_pct),
            None => self.reserve_price,
        }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status.occupies_schedule() && self.start_time < end && start < self.end_time
    }

    pub(crate) fn set_status(&mut self, status: AuctionStatus) {
        self.status = status;
    }

    pub(crate) fn set_end_time(&mut self, end_time: DateTime<Utc>) {
        self.end_time = end_time;
    }

    pub(crate) fn record_bid(&mut self, bidder: String, amount: Decimal) {
        self.current_bid = Some(amount);
        self.current_bidder = Some(bidder);
    }

    pub(crate) fn mark_settled(&mut self, settled_at: DateTime<Utc>) {
        self.status = AuctionStatus::Settled;
        self.settled_at = Some(settled_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn minimum_bid_is_reserve_price_when_no_bids() {
        let auction = Auction::new(
            Uuid::new_v4(),
            dec!(50_000),
            10,
            now() + chrono::Duration::hours(1),
            now() + chrono::Duration::hours(2),
            now(),
        );
        assert_eq!(auction.minimum_bid(dec!(0.05)), dec!(50_000));
    }

    #[test]
    fn minimum_bid_applies_increment_over_current_bid() {
        let mut auction = Auction::new(
            Uuid::new_v4(),
            dec!(50_000),
            10,
            now() - chrono::Duration::minutes(1),
            now() + chrono::Duration::hours(1),
            now(),
        );
        auction.record_bid("0xabc".to_string(), dec!(60_000));
        assert_eq!(auction.minimum_bid(dec!(0.05)), dec!(63_000.00));
    }

    #[test]
    fn scheduled_when_start_is_in_future() {
        let t = now();
        let auction = Auction::new(
            Uuid::new_v4(),
            dec!(1),
            1,
            t + chrono::Duration::hours(1),
            t + chrono::Duration::hours(2),
            t,
        );
        assert_eq!(auction.status(), AuctionStatus::Scheduled);
    }
}
