//! AuctionEngine — the auction state machine
//!
//! ```text
//! SCHEDULED -- now>=startTime --> ACTIVE -- now>=endTime --> ENDED -- settle --> SETTLED
//!     |                                                        |
//!     +---- cancel (any time before SETTLED) ---> CANCELLED ---+
//!                                                  cancel if no bids or reserve unmet
//! ```

use crate::collaborators::{bounded, Payment, TokenTransfer};
use crate::config::EngineConfig;
use crate::events::{DomainEvent, EventLog};
use crate::models::{Auction, AuctionStatus, Bid, Transaction, TransactionType};
use crate::store::{Page, Pagination, Store, StoreError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AuctionEngineError {
    #[error("asset {0} not found")]
    AssetNotFound(Uuid),
    #[error("auction {0} not found")]
    AuctionNotFound(Uuid),
    #[error("bid {0} not found")]
    BidNotFound(Uuid),
    #[error("bidder {0} not found")]
    BidderNotFound(String),
    #[error("asset is not tokenized")]
    NotTokenized,
    #[error("start time must be in the future")]
    InvalidStartTime,
    #[error("invalid end time: {0}")]
    InvalidEndTime(String),
    #[error("an active or scheduled auction already occupies this window")]
    OverlappingAuction,
    #[error("auction is not active")]
    AuctionNotActive,
    #[error("bid of {amount} is below the minimum of {minimum}")]
    BidTooLow { amount: Decimal, minimum: Decimal },
    #[error("bidder is not KYC-verified")]
    KycRequired,
    #[error("cannot cancel the currently winning bid")]
    CannotCancelWinning,
    #[error("caller does not own this bid")]
    NotOwner,
    #[error("auction has not ended yet")]
    AuctionNotEnded,
    #[error("winning bidder has no investor profile")]
    NoProfile,
    #[error("collaborator failure: {0}")]
    CollaboratorFailure(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct CreateAuctionInput {
    pub reserve_price: Decimal,
    pub token_amount: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Owns the auction state machine: schedule, activate, accept bids with
/// atomic displacement+refund, end, settle or cancel.
pub struct AuctionEngine<P: Payment, TT: TokenTransfer> {
    store: Arc<Store>,
    payment: Arc<P>,
    token_transfer: Arc<TT>,
    events: Arc<EventLog>,
    config: EngineConfig,
}

impl<P: Payment, TT: TokenTransfer> AuctionEngine<P, TT> {
    pub fn new(
        store: Arc<Store>,
        payment: Arc<P>,
        token_transfer: Arc<TT>,
        events: Arc<EventLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            payment,
            token_transfer,
            events,
            config,
        }
    }

    #[tracing::instrument(skip(self, input))]
    pub fn create(
        &self,
        asset_id: Uuid,
        input: CreateAuctionInput,
    ) -> Result<Auction, AuctionEngineError> {
        if input.reserve_price <= Decimal::ZERO {
            return Err(AuctionEngineError::InvalidEndTime(
                "reserve_price must be positive".to_string(),
            ));
        }
        if input.token_amount == 0 {
            return Err(AuctionEngineError::InvalidEndTime(
                "token_amount must be positive".to_string(),
            ));
        }
        let now = Utc::now();
        if input.start_time <= now {
            return Err(AuctionEngineError::InvalidStartTime);
        }
        if input.end_time <= input.start_time {
            return Err(AuctionEngineError::InvalidEndTime(
                "end_time must be after start_time".to_string(),
            ));
        }
        let duration = (input.end_time - input.start_time).num_seconds();
        if duration < self.config.auction_min_duration_seconds
            || duration > self.config.auction_max_duration_seconds
        {
            return Err(AuctionEngineError::InvalidEndTime(format!(
                "duration {duration}s outside [{}, {}]",
                self.config.auction_min_duration_seconds, self.config.auction_max_duration_seconds
            )));
        }

        self.store.atomic(|txn| {
            let asset = txn
                .get_asset(asset_id)
                .map_err(|_| AuctionEngineError::AssetNotFound(asset_id))?;
            if asset.tokenization_status() != crate::models::TokenizationStatus::Tokenized {
                return Err(AuctionEngineError::NotTokenized);
            }
            if txn.has_overlapping_auction(asset_id, input.start_time, input.end_time, None) {
                return Err(AuctionEngineError::OverlappingAuction);
            }
            let auction = Auction::new(
                asset_id,
                input.reserve_price,
                input.token_amount,
                input.start_time,
                input.end_time,
                now,
            );
            Ok(txn.create_auction(auction)?)
        })
    }

    /// Bid displacement as a single unit-of-work:
    /// insert the new winning bid, flip the previous winner's `isWinning`,
    /// update the auction's `currentBid`/`currentBidder`. Collaborator calls
    /// (escrow the new bid, refund the displaced bidder) happen after the
    /// unit-of-work commits; a failure there is compensated, not rolled
    /// back.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn place_bid(
        &self,
        auction_id: Uuid,
        bidder_wallet: String,
        amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<Bid, AuctionEngineError> {
        let bidder = self
            .store
            .atomic(|txn| Ok(txn.find_user_by_wallet(&bidder_wallet)))?
            .ok_or_else(|| AuctionEngineError::BidderNotFound(bidder_wallet.clone()))?;
        if !bidder.is_verified() {
            return Err(AuctionEngineError::KycRequired);
        }

        let increment_pct = self.config.auction_bid_increment_pct;
        let (new_bid, displaced) = self.store.atomic(|txn| {
            let auction = txn
                .get_auction(auction_id)
                .map_err(|_| AuctionEngineError::AuctionNotFound(auction_id))?;
            let now = Utc::now();
            if auction.status() != AuctionStatus::Active
                || auction.start_time() > now
                || auction.end_time() < now
            {
                return Err(AuctionEngineError::AuctionNotActive);
            }
            let minimum = auction.minimum_bid(increment_pct);
            if amount < minimum {
                return Err(AuctionEngineError::BidTooLow { amount, minimum });
            }

            let displaced = txn.winning_bid(auction_id);
            if let Some(mut displaced_bid) = displaced.clone() {
                displaced_bid.set_winning(false);
                txn.update_bid(displaced_bid)?;
            }
            let new_bid = Bid::new(auction_id, bidder_wallet.clone(), amount);
            let new_bid = txn.create_bid(new_bid)?;
            let mut auction = auction;
            auction.record_bid(bidder_wallet.clone(), amount);
            txn.update_auction(auction)?;
            Ok((new_bid, displaced))
        })?;

        self.events.record(DomainEvent::BidPlaced {
            auction_id,
            bid_id: new_bid.id(),
            bidder: bidder_wallet,
            amount,
        });

        let timeout = self.config.collaborator_timeout();
        if let Err(err) = bounded(
            timeout,
            cancel,
            self.payment
                .transfer_out(new_bid.id(), &new_bid.bidder().to_string(), "auction-escrow", amount, cancel),
        )
        .await
        {
            tracing::error!(bid_id = %new_bid.id(), error = %err, "failed to escrow new bid");
        }

        if let Some(displaced_bid) = displaced {
            self.events.record(DomainEvent::BidDisplaced {
                auction_id,
                bid_id: displaced_bid.id(),
            });
            if let Err(err) = bounded(
                timeout,
                cancel,
                self.payment.transfer_out(
                    displaced_bid.id(),
                    "auction-escrow",
                    displaced_bid.bidder(),
                    displaced_bid.amount(),
                    cancel,
                ),
            )
            .await
            {
                tracing::error!(bid_id = %displaced_bid.id(), error = %err, "failed to refund displaced bid");
            }
        }

        Ok(new_bid)
    }

    #[tracing::instrument(skip(self))]
    pub fn cancel_bid(&self, bid_id: Uuid, bidder_wallet: &str) -> Result<(), AuctionEngineError> {
        self.store.atomic(|txn| {
            let bid = txn
                .get_bid(bid_id)
                .map_err(|_| AuctionEngineError::BidNotFound(bid_id))?;
            if bid.bidder() != bidder_wallet {
                return Err(AuctionEngineError::NotOwner);
            }
            let auction = txn
                .get_auction(bid.auction_id())
                .map_err(|_| AuctionEngineError::AuctionNotFound(bid.auction_id()))?;
            if auction.status() != AuctionStatus::Active {
                return Err(AuctionEngineError::AuctionNotActive);
            }
            if bid.is_winning() {
                return Err(AuctionEngineError::CannotCancelWinning);
            }
            Ok(txn.delete_bid(bid_id)?)
        })
    }

    /// Requires `status ∈ {ENDED, ACTIVE}` with `now ≥ endTime`. With no
    /// bids, or a winning bid below reserve, transitions to `CANCELLED`;
    /// otherwise settles within one unit-of-work and issues the on-chain
    /// transfer and payment release collaborator calls.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn settle(
        &self,
        auction_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Auction, AuctionEngineError> {
        let auction = self.get_by_id(auction_id)?;
        if auction.status() == AuctionStatus::Settled {
            return Ok(auction);
        }
        if !matches!(auction.status(), AuctionStatus::Ended | AuctionStatus::Active) {
            return Err(AuctionEngineError::AuctionNotEnded);
        }
        let now = Utc::now();
        if auction.end_time() > now {
            return Err(AuctionEngineError::AuctionNotEnded);
        }

        let winning_bid = self.store.atomic(|txn| Ok(txn.winning_bid(auction_id)))?;
        let reserve_met = winning_bid
            .as_ref()
            .is_some_and(|b| b.amount() >= auction.reserve_price());

        if !reserve_met {
            let auction = self.store.atomic(|txn| {
                let mut auction = txn.get_auction(auction_id)?;
                auction.set_status(AuctionStatus::Cancelled);
                txn.update_auction(auction)
            })?;
            self.refund_all_bids(auction_id, cancel).await;
            self.events.record(DomainEvent::AuctionCancelled { auction_id });
            return Ok(auction);
        }

        let winning_bid = winning_bid.expect("reserve_met implies a winning bid exists");
        let winner = self
            .store
            .atomic(|txn| Ok(txn.find_user_by_wallet(winning_bid.bidder())))?
            .ok_or_else(|| AuctionEngineError::BidderNotFound(winning_bid.bidder().to_string()))?;
        let investor_profile = self
            .store
            .atomic(|txn| Ok(txn.find_investor_profile_by_user(winner.id())))?
            .ok_or(AuctionEngineError::NoProfile)?;

        let (auction, transaction) = self.store.atomic(|txn| {
            let mut auction = txn.get_auction(auction_id)?;
            let tx = Transaction::new(
                auction.asset_id(),
                winner.id(),
                None,
                TransactionType::AuctionSettlement,
                winning_bid.amount(),
                auction.token_amount(),
            );
            let mut tx = tx;
            tx.mark_completed();
            let tx = txn.create_transaction(tx)?;
            txn.credit_holding(
                investor_profile.id(),
                auction.asset_id(),
                auction.token_amount(),
                winning_bid.amount(),
            );
            auction.mark_settled(Utc::now());
            let auction = txn.update_auction(auction)?;
            Ok((auction, tx))
        })?;

        self.events.record(DomainEvent::AuctionSettled {
            auction_id,
            transaction_id: Some(transaction.id()),
        });

        let timeout = self.config.collaborator_timeout();
        let asset = self.store.atomic(|txn| txn.get_asset(auction.asset_id()))?;
        match bounded(
            timeout,
            cancel,
            self.token_transfer.transfer(
                transaction.id(),
                asset.mint_address().unwrap_or_default(),
                "platform-treasury",
                winning_bid.bidder(),
                auction.token_amount(),
                cancel,
            ),
        )
        .await
        {
            Ok(signature) => {
                let _ = self.store.atomic(|txn| {
                    let mut bid = txn.get_bid(winning_bid.id())?;
                    bid.set_signature(signature);
                    txn.update_bid(bid)
                });
            }
            Err(err) => {
                tracing::error!(auction_id = %auction_id, error = %err, "failed to transfer tokens to auction winner");
            }
        }
        if let Err(err) = bounded(
            timeout,
            cancel,
            self.payment
                .transfer_out(transaction.id(), "auction-escrow", &asset.bank_id().to_string(), winning_bid.amount(), cancel),
        )
        .await
        {
            tracing::error!(auction_id = %auction_id, error = %err, "failed to release auction proceeds to seller");
        }
        self.refund_non_winning_bids(auction_id, winning_bid.id(), cancel).await;

        Ok(auction)
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn cancel(&self, auction_id: Uuid, cancel: &CancellationToken) -> Result<Auction, AuctionEngineError> {
        let auction = self.store.atomic(|txn| {
            let mut auction = txn
                .get_auction(auction_id)
                .map_err(|_| AuctionEngineError::AuctionNotFound(auction_id))?;
            if matches!(auction.status(), AuctionStatus::Settled | AuctionStatus::Cancelled) {
                return Err(AuctionEngineError::AuctionNotActive);
            }
            auction.set_status(AuctionStatus::Cancelled);
            Ok(txn.update_auction(auction)?)
        })?;
        self.refund_all_bids(auction_id, cancel).await;
        self.events.record(DomainEvent::AuctionCancelled { auction_id });
        Ok(auction)
    }

    #[tracing::instrument(skip(self))]
    pub fn extend(&self, auction_id: Uuid, new_end_time: DateTime<Utc>) -> Result<Auction, AuctionEngineError> {
        self.store.atomic(|txn| {
            let mut auction = txn
                .get_auction(auction_id)
                .map_err(|_| AuctionEngineError::AuctionNotFound(auction_id))?;
            if !matches!(auction.status(), AuctionStatus::Scheduled | AuctionStatus::Active) {
                return Err(AuctionEngineError::AuctionNotActive);
            }
            if new_end_time <= auction.end_time() {
                return Err(AuctionEngineError::InvalidEndTime(
                    "new_end_time must be after the current end time".to_string(),
                ));
            }
            auction.set_end_time(new_end_time);
            Ok(txn.update_auction(auction)?)
        })
    }

    pub fn get_by_id(&self, auction_id: Uuid) -> Result<Auction, AuctionEngineError> {
        self.store
            .atomic(|txn| txn.get_auction(auction_id))
            .map_err(|_| AuctionEngineError::AuctionNotFound(auction_id))
    }

    pub fn bid_history(&self, auction_id: Uuid, pagination: Pagination) -> Page<Bid> {
        self.store
            .atomic(|txn| Ok(txn.list_bids_for_auction(auction_id, pagination)))
            .expect("list_bids_for_auction never errors")
    }

    async fn refund_all_bids(&self, auction_id: Uuid, cancel: &CancellationToken) {
        let bids = self
            .store
            .atomic(|txn| Ok(txn.list_bids_for_auction(auction_id, Pagination::new(Some(1), Some(1000), 1000, 1000))))
            .map(|page| page.data)
            .unwrap_or_default();
        let timeout = self.config.collaborator_timeout();
        for bid in bids {
            if let Err(err) = bounded(
                timeout,
                cancel,
                self.payment.transfer_out(bid.id(), "auction-escrow", bid.bidder(), bid.amount(), cancel),
            )
            .await
            {
                tracing::error!(bid_id = %bid.id(), error = %err, "failed to refund bid on auction cancel");
            }
        }
    }

    async fn refund_non_winning_bids(&self, auction_id: Uuid, winning_bid_id: Uuid, cancel: &CancellationToken) {
        let bids = self
            .store
            .atomic(|txn| Ok(txn.list_bids_for_auction(auction_id, Pagination::new(Some(1), Some(1000), 1000, 1000))))
            .map(|page| page.data)
            .unwrap_or_default();
        let timeout = self.config.collaborator_timeout();
        for bid in bids.into_iter().filter(|b| b.id() != winning_bid_id) {
            if let Err(err) = bounded(
                timeout,
                cancel,
                self.payment.transfer_out(bid.id(), "auction-escrow", bid.bidder(), bid.amount(), cancel),
            )
            .await
            {
                tracing::error!(bid_id = %bid.id(), error = %err, "failed to refund non-winning bid at settlement");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockPayment, MockTokenTransfer};
    use crate::models::{KycStatus, Role, User};
    use rust_decimal_macros::dec;

    fn engine() -> (Arc<Store>, AuctionEngine<MockPayment, MockTokenTransfer>) {
        let store = Arc::new(Store::new());
        let engine = AuctionEngine::new(
            store.clone(),
            Arc::new(MockPayment::new()),
            Arc::new(MockTokenTransfer::new()),
            Arc::new(EventLog::new()),
            EngineConfig::default(),
        );
        (store, engine)
    }

    fn tokenized_asset(store: &Store) -> Uuid {
        let bank_id = store
            .atomic(|txn| txn.create_bank(crate::models::Bank::new("B".into(), "B1".into(), None)))
            .unwrap()
            .id();
        store
            .atomic(|txn| {
                let mut asset = crate::models::Asset::new(
                    bank_id,
                    "Prop-1".to_string(),
                    None,
                    crate::models::AssetType::RealEstate,
                    dec!(1_000_000),
                    10_000,
                    None,
                );
                asset.mark_tokenized("o1".to_string(), "m1".to_string(), None);
                txn.create_asset(asset)
            })
            .unwrap()
            .id()
    }

    fn verified_wallet_user(store: &Store, wallet: &str) -> Uuid {
        let mut user = User::new(Role::Investor, None, Some(wallet.to_string()));
        user.set_kyc_status(KycStatus::Verified);
        store.atomic(|txn| txn.create_user(user)).unwrap().id()
    }

    #[tokio::test]
    async fn bidding_race_displaces_previous_winner() {
        let (store, engine) = engine();
        let asset_id = tokenized_asset(&store);
        verified_wallet_user(&store, "0xbidder1");
        verified_wallet_user(&store, "0xbidder2");

        let now = Utc::now();
        // Built directly rather than via `create()` so the auction starts
        // out `Active`: `create()` requires `start_time` in the future,
        // which always yields `Scheduled` (the scheduler tick is what
        // flips it to `Active`, tested separately in `scheduler`).
        let auction = store
            .atomic(|txn| {
                txn.create_auction(Auction::new(
                    asset_id,
                    dec!(50_000),
                    10,
                    now - chrono::Duration::minutes(1),
                    now + chrono::Duration::hours(2),
                    now - chrono::Duration::minutes(2),
                ))
            })
            .unwrap();
        assert_eq!(auction.status(), AuctionStatus::Active);

        let cancel = CancellationToken::new();
        let bid1 = engine
            .place_bid(auction.id(), "0xbidder1".to_string(), dec!(60_000), &cancel)
            .await
            .unwrap();
        assert!(bid1.is_winning());

        let low = engine
            .place_bid(auction.id(), "0xbidder2".to_string(), dec!(62_000), &cancel)
            .await;
        assert!(matches!(low, Err(AuctionEngineError::BidTooLow { .. })));

        let bid2 = engine
            .place_bid(auction.id(), "0xbidder2".to_string(), dec!(63_000), &cancel)
            .await
            .unwrap();
        assert!(bid2.is_winning());

        let refreshed_bid1 = store.atomic(|txn| txn.get_bid(bid1.id())).unwrap();
        assert!(!refreshed_bid1.is_winning());
    }

    #[tokio::test]
    async fn settle_cancels_when_reserve_unmet() {
        let (store, engine) = engine();
        let asset_id = tokenized_asset(&store);
        verified_wallet_user(&store, "0xbidder1");

        let now = Utc::now();
        let auction = store
            .atomic(|txn| {
                let auction = Auction::new(asset_id, dec!(50_000), 10, now - chrono::Duration::hours(2), now - chrono::Duration::hours(1), now - chrono::Duration::hours(3));
                txn.create_auction(auction)
            })
            .unwrap();

        let cancel = CancellationToken::new();
        store
            .atomic(|txn| {
                let mut a = txn.get_auction(auction.id())?;
                a.set_status(AuctionStatus::Active);
                a.record_bid("0xbidder1".to_string(), dec!(40_000));
                txn.update_auction(a)
            })
            .unwrap();

        let settled = engine.settle(auction.id(), &cancel).await.unwrap();
        assert_eq!(settled.status(), AuctionStatus::Cancelled);
    }

    #[tokio::test]
    async fn settle_credits_winner_holding_and_stamps_bid_signature() {
        let (store, engine) = engine();
        let asset_id = tokenized_asset(&store);
        let user_id = verified_wallet_user(&store, "0xwinner");
        let profile_id = store
            .atomic(|txn| {
                txn.create_investor_profile(crate::models::InvestorProfile::new(
                    user_id,
                    "Ada".to_string(),
                    "Lovelace".to_string(),
                    "UK".to_string(),
                    crate::models::InvestorType::Individual,
                ))
            })
            .unwrap()
            .id();

        let now = Utc::now();
        let auction = store
            .atomic(|txn| {
                let auction = Auction::new(asset_id, dec!(50_000), 10, now - chrono::Duration::hours(2), now - chrono::Duration::hours(1), now - chrono::Duration::hours(3));
                txn.create_auction(auction)
            })
            .unwrap();
        let bid_id = store
            .atomic(|txn| {
                let mut a = txn.get_auction(auction.id())?;
                a.set_status(AuctionStatus::Active);
                a.record_bid("0xwinner".to_string(), dec!(55_000));
                txn.update_auction(a)?;
                txn.create_bid(Bid::new(auction.id(), "0xwinner".to_string(), dec!(55_000)))
            })
            .unwrap()
            .id();

        let cancel = CancellationToken::new();
        let settled = engine.settle(auction.id(), &cancel).await.unwrap();
        assert_eq!(settled.status(), AuctionStatus::Settled);
        assert!(settled.settled_at().is_some());

        let holding = store
            .atomic(|txn| Ok(txn.get_holding(profile_id, asset_id)))
            .unwrap()
            .expect("winner should have a credited holding");
        assert_eq!(holding.token_amount(), 10);
        assert_eq!(holding.cost_basis(), dec!(55_000));

        let refreshed_bid = store.atomic(|txn| txn.get_bid(bid_id)).unwrap();
        assert!(refreshed_bid.signature().is_some());
    }

    #[tokio::test]
    async fn settle_rejects_winner_with_no_investor_profile() {
        let (store, engine) = engine();
        let asset_id = tokenized_asset(&store);
        verified_wallet_user(&store, "0xnoprofile");

        let now = Utc::now();
        let auction = store
            .atomic(|txn| {
                let auction = Auction::new(asset_id, dec!(50_000), 10, now - chrono::Duration::hours(2), now - chrono::Duration::hours(1), now - chrono::Duration::hours(3));
                txn.create_auction(auction)
            })
            .unwrap();
        store
            .atomic(|txn| {
                let mut a = txn.get_auction(auction.id())?;
                a.set_status(AuctionStatus::Active);
                a.record_bid("0xnoprofile".to_string(), dec!(55_000));
                txn.update_auction(a)?;
                txn.create_bid(Bid::new(auction.id(), "0xnoprofile".to_string(), dec!(55_000)))
            })
            .unwrap();

        let cancel = CancellationToken::new();
        let err = engine.settle(auction.id(), &cancel).await.unwrap_err();
        assert!(matches!(err, AuctionEngineError::NoProfile));
    }
}
