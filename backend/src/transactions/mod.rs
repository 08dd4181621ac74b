//! TransactionEngine — the purchase state machine
//!
//! ```text
//! PENDING -create-escrow-> ESCROW_CREATED -record-payment-> PAYMENT_RECEIVED
//!                                                                |
//!                                                        transfer-tokens
//!                                                                v
//!                                                     TOKENS_TRANSFERRED -complete-> COMPLETED
//! Any non-terminal -cancel-> CANCELLED   (COMPLETED, CANCELLED, REFUNDED are terminal)
//! ```

use crate::collaborators::{bounded, Escrow, Payment, TokenTransfer};
use crate::config::EngineConfig;
use crate::events::{DomainEvent, EventLog};
use crate::models::{Transaction, TransactionStatus, TransactionType};
use crate::store::{Page, Pagination, Store, StoreError, TransactionFilter};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TransactionEngineError {
    #[error("asset {0} not found")]
    AssetNotFound(Uuid),
    #[error("buyer {0} not found")]
    BuyerNotFound(Uuid),
    #[error("transaction {0} not found")]
    TransactionNotFound(Uuid),
    #[error("asset is not listed")]
    NotListed,
    #[error("asset has no price set")]
    NoPrice,
    #[error("only {available} tokens available, requested {requested}")]
    InsufficientSupply { available: u64, requested: u64 },
    #[error("buyer is not KYC-verified")]
    KycRequired,
    #[error("buyer has no investor profile")]
    NoProfile,
    #[error("invalid status: expected {expected}, found {found}")]
    InvalidStatus { expected: String, found: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("collaborator failure: {0}")]
    CollaboratorFailure(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct UserStats {
    pub total_transactions: u64,
    pub completed_transactions: u64,
    pub total_invested: Decimal,
    pub total_tokens: u64,
}

/// Owns the purchase state machine: reserve supply, escrow, payment,
/// transfer, settle; updates holdings atomically on completion.
pub struct TransactionEngine<E: Escrow, P: Payment, TT: TokenTransfer> {
    store: Arc<Store>,
    escrow: Arc<E>,
    payment: Arc<P>,
    token_transfer: Arc<TT>,
    events: Arc<EventLog>,
    config: EngineConfig,
}

impl<E: Escrow, P: Payment, TT: TokenTransfer> TransactionEngine<E, P, TT> {
    pub fn new(
        store: Arc<Store>,
        escrow: Arc<E>,
        payment: Arc<P>,
        token_transfer: Arc<TT>,
        events: Arc<EventLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            escrow,
            payment,
            token_transfer,
            events,
            config,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn create(
        &self,
        buyer_id: Uuid,
        asset_id: Uuid,
        token_amount: u64,
    ) -> Result<Transaction, TransactionEngineError> {
        if token_amount == 0 {
            return Err(TransactionEngineError::InvalidInput(
                "token_amount must be positive".to_string(),
            ));
        }
        self.store.atomic(|txn| {
            let asset = txn
                .get_asset(asset_id)
                .map_err(|_| TransactionEngineError::AssetNotFound(asset_id))?;
            if asset.listing_status() != crate::models::ListingStatus::Listed {
                return Err(TransactionEngineError::NotListed);
            }
            if asset.price_per_token() <= Decimal::ZERO {
                return Err(TransactionEngineError::NoPrice);
            }
            let available = txn.available_tokens(&asset);
            if token_amount > available {
                return Err(TransactionEngineError::InsufficientSupply {
                    available,
                    requested: token_amount,
                });
            }
            let buyer = txn
                .get_user(buyer_id)
                .map_err(|_| TransactionEngineError::BuyerNotFound(buyer_id))?;
            if !buyer.is_verified() {
                return Err(TransactionEngineError::KycRequired);
            }
            let amount = Decimal::from(token_amount) * asset.price_per_token();
            let tx = Transaction::new(
                asset_id,
                buyer_id,
                None,
                TransactionType::PrimarySale,
                amount,
                token_amount,
            );
            Ok(txn.create_transaction(tx)?)
        })
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn create_escrow(
        &self,
        tx_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransactionEngineError> {
        let tx = self.get_by_id(tx_id)?;
        if tx.status() != TransactionStatus::Pending {
            if tx.status() == TransactionStatus::EscrowCreated {
                return Ok(tx);
            }
            return Err(TransactionEngineError::InvalidStatus {
                expected: "PENDING".to_string(),
                found: format!("{:?}", tx.status()),
            });
        }
        let expires_at = Utc::now() + chrono::Duration::hours(24);
        let escrow_id = bounded(
            self.config.collaborator_timeout(),
            cancel,
            self.escrow.open(tx_id, tx.buyer_id(), tx.seller_id(), tx.amount(), expires_at, cancel),
        )
        .await
        .map_err(|e| TransactionEngineError::CollaboratorFailure(e.to_string()))?;

        self.store.atomic(|txn| {
            let mut tx = txn.get_transaction(tx_id)?;
            tx.set_escrow_address(escrow_id);
            Ok(txn.update_transaction(tx)?)
        })
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn record_payment(
        &self,
        tx_id: Uuid,
        payment_signature: String,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransactionEngineError> {
        let tx = self.get_by_id(tx_id)?;
        if tx.status() != TransactionStatus::EscrowCreated {
            if tx.status() == TransactionStatus::PaymentReceived {
                return Ok(tx);
            }
            return Err(TransactionEngineError::InvalidStatus {
                expected: "ESCROW_CREATED".to_string(),
                found: format!("{:?}", tx.status()),
            });
        }
        let destination = tx.escrow_address().unwrap_or_default().to_string();
        let verified = bounded(
            self.config.collaborator_timeout(),
            cancel,
            self.payment
                .verify_inbound(&payment_signature, tx.amount(), &destination, cancel),
        )
        .await
        .map_err(|e| TransactionEngineError::CollaboratorFailure(e.to_string()))?;
        if !verified {
            return Err(TransactionEngineError::CollaboratorFailure(
                "payment signature did not verify".to_string(),
            ));
        }

        self.store.atomic(|txn| {
            let mut tx = txn.get_transaction(tx_id)?;
            tx.set_status(TransactionStatus::PaymentReceived);
            Ok(txn.update_transaction(tx)?)
        })
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn transfer_tokens(
        &self,
        tx_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransactionEngineError> {
        let tx = self.get_by_id(tx_id)?;
        if tx.status() != TransactionStatus::PaymentReceived {
            if tx.status() == TransactionStatus::TokensTransferred {
                return Ok(tx);
            }
            return Err(TransactionEngineError::InvalidStatus {
                expected: "PAYMENT_RECEIVED".to_string(),
                found: format!("{:?}", tx.status()),
            });
        }
        let asset = self
            .store
            .atomic(|txn| txn.get_asset(tx.asset_id()))
            .map_err(|_| TransactionEngineError::AssetNotFound(tx.asset_id()))?;
        let mint = asset.mint_address().unwrap_or_default().to_string();
        let signature = bounded(
            self.config.collaborator_timeout(),
            cancel,
            self.token_transfer.transfer(
                tx_id,
                &mint,
                "platform-treasury",
                &tx.buyer_id().to_string(),
                tx.token_amount(),
                cancel,
            ),
        )
        .await
        .map_err(|e| TransactionEngineError::CollaboratorFailure(e.to_string()))?;

        self.store.atomic(|txn| {
            let mut tx = txn.get_transaction(tx_id)?;
            tx.set_tx_signature(signature);
            Ok(txn.update_transaction(tx)?)
        })
    }

    /// Re-checks `availableTokens` inside the unit-of-work: another sale
    /// may have consumed supply
    /// between `create` and `complete`. On overbooking the transaction is
    /// marked `FAILED`, not rolled back to `CANCELLED`, and a best-effort
    /// refund is requested.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn complete(
        &self,
        tx_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransactionEngineError> {
        let tx = self.get_by_id(tx_id)?;
        if tx.status() == TransactionStatus::Completed {
            return Ok(tx);
        }
        if tx.status() != TransactionStatus::TokensTransferred {
            return Err(TransactionEngineError::InvalidStatus {
                expected: "TOKENS_TRANSFERRED".to_string(),
                found: format!("{:?}", tx.status()),
            });
        }
        let investor_profile = self
            .store
            .atomic(|txn| Ok(txn.find_investor_profile_by_user(tx.buyer_id())))?
            .ok_or(TransactionEngineError::NoProfile)?;

        let result = self.store.atomic(|txn| {
            let mut tx = txn.get_transaction(tx_id)?;
            let asset = txn.get_asset(tx.asset_id())?;
            let available = txn.available_tokens(&asset);
            if tx.token_amount() > available {
                return Ok(Err(TransactionEngineError::InsufficientSupply {
                    available,
                    requested: tx.token_amount(),
                }));
            }
            tx.mark_completed();
            let tx = txn.update_transaction(tx)?;
            txn.credit_holding(
                investor_profile.id(),
                tx.asset_id(),
                tx.token_amount(),
                tx.amount(),
            );
            let mut asset = asset;
            let sold = txn.holdings_sum_for_asset(tx.asset_id());
            if asset.available_tokens(sold) == 0 {
                asset.set_listing_status(crate::models::ListingStatus::SoldOut);
                txn.update_asset(asset)?;
            }
            Ok(Ok(tx))
        })?;

        match result {
            Ok(tx) => {
                self.events.record(DomainEvent::TransactionStatusChanged {
                    transaction_id: tx_id,
                    asset_id: tx.asset_id(),
                    from: "TOKENS_TRANSFERRED".to_string(),
                    to: "COMPLETED".to_string(),
                });
                Ok(tx)
            }
            Err(err) => {
                self.store.atomic(|txn| {
                    let mut tx = txn.get_transaction(tx_id)?;
                    tx.mark_failed(err.to_string());
                    txn.update_transaction(tx)
                })?;
                if let Some(escrow_id) = tx.escrow_address() {
                    let _ = bounded(
                        self.config.collaborator_timeout(),
                        cancel,
                        self.escrow.refund(tx_id, escrow_id, tx.buyer_id(), cancel),
                    )
                    .await;
                }
                Err(err)
            }
        }
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn cancel(
        &self,
        tx_id: Uuid,
        reason: String,
        cancel: &CancellationToken,
    ) -> Result<Transaction, TransactionEngineError> {
        let tx = self.store.atomic(|txn| {
            let mut tx = txn.get_transaction(tx_id)?;
            if tx.status().is_terminal() {
                return Err(StoreError::Conflict(format!(
                    "transaction {tx_id} is already in a terminal state"
                )));
            }
            tx.mark_cancelled(reason);
            txn.update_transaction(tx)
        })?;
        if let Some(escrow_id) = tx.escrow_address() {
            let _ = bounded(
                self.config.collaborator_timeout(),
                cancel,
                self.escrow.refund(tx_id, escrow_id, tx.buyer_id(), cancel),
            )
            .await;
        }
        Ok(tx)
    }

    pub fn get_by_id(&self, tx_id: Uuid) -> Result<Transaction, TransactionEngineError> {
        self.store
            .atomic(|txn| txn.get_transaction(tx_id))
            .map_err(|_| TransactionEngineError::TransactionNotFound(tx_id))
    }

    pub fn list_by_user(
        &self,
        user_id: Uuid,
        mut filter: TransactionFilter,
        pagination: Pagination,
    ) -> Page<Transaction> {
        filter.buyer_id = Some(user_id);
        self.store
            .atomic(|txn| Ok(txn.list_transactions(&filter, pagination)))
            .expect("list_transactions never errors")
    }

    pub fn list_by_asset(
        &self,
        asset_id: Uuid,
        mut filter: TransactionFilter,
        pagination: Pagination,
    ) -> Page<Transaction> {
        filter.asset_id = Some(asset_id);
        self.store
            .atomic(|txn| Ok(txn.list_transactions(&filter, pagination)))
            .expect("list_transactions never errors")
    }

    pub fn user_stats(&self, user_id: Uuid) -> UserStats {
        let transactions = self
            .store
            .atomic(|txn| Ok(txn.transactions_for_buyer(user_id)))
            .expect("transactions_for_buyer never errors");
        let completed: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| t.status() == TransactionStatus::Completed)
            .collect();
        UserStats {
            total_transactions: transactions.len() as u64,
            completed_transactions: completed.len() as u64,
            total_invested: completed.iter().map(|t| t.amount()).sum(),
            total_tokens: completed.iter().map(|t| t.token_amount()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockEscrow, MockPayment, MockTokenTransfer};
    use crate::lifecycle::{AssetLifecycle, CreateAssetInput, TokenizeInput};
    use crate::models::{AssetType, DocumentType, InvestorProfile, InvestorType, KycStatus, Role, User};
    use rust_decimal_macros::dec;

    struct Harness {
        store: Arc<Store>,
        engine: TransactionEngine<MockEscrow, MockPayment, MockTokenTransfer>,
        asset_id: Uuid,
        buyer_id: Uuid,
    }

    async fn setup(listed: bool, verified: bool) -> Harness {
        let store = Arc::new(Store::new());
        let events = Arc::new(EventLog::new());
        let config = EngineConfig::default();
        let lifecycle = AssetLifecycle::new(
            store.clone(),
            Arc::new(crate::collaborators::MockTokenizationCollaborator::new()),
            events.clone(),
            config.clone(),
        );
        let bank_id = store
            .atomic(|txn| txn.create_bank(crate::models::Bank::new("B".into(), "B1".into(), None)))
            .unwrap()
            .id();
        let asset = lifecycle
            .create(
                bank_id,
                CreateAssetInput {
                    name: "Prop-1".to_string(),
                    description: None,
                    asset_type: AssetType::RealEstate,
                    total_value: dec!(1_000_000),
                    total_supply: 10_000,
                    price_per_token: None,
                },
            )
            .unwrap();
        lifecycle
            .add_document(asset.id(), DocumentType::Appraisal, "a".into(), "k1".into(), "application/pdf".into(), 1, Uuid::new_v4())
            .unwrap();
        lifecycle
            .add_document(asset.id(), DocumentType::LegalOpinion, "b".into(), "k2".into(), "application/pdf".into(), 1, Uuid::new_v4())
            .unwrap();
        lifecycle.submit_for_review(asset.id()).unwrap();
        lifecycle.approve_for_tokenization(asset.id()).unwrap();
        let cancel = CancellationToken::new();
        lifecycle
            .tokenize(
                asset.id(),
                TokenizeInput {
                    symbol: "P1A".to_string(),
                    minimum_investment: dec!(1000),
                    maximum_investment: None,
                    start_date: None,
                    end_date: None,
                },
                &cancel,
            )
            .await
            .unwrap();
        if listed {
            lifecycle.list_on_marketplace(asset.id()).unwrap();
        }

        let mut buyer = User::new(Role::Investor, Some("buyer@example.com".to_string()), None);
        if verified {
            buyer.set_kyc_status(KycStatus::Verified);
        }
        let buyer = store.atomic(|txn| txn.create_user(buyer)).unwrap();
        store
            .atomic(|txn| {
                txn.create_investor_profile(InvestorProfile::new(
                    buyer.id(),
                    "A".to_string(),
                    "B".to_string(),
                    "US".to_string(),
                    InvestorType::Individual,
                ))
            })
            .unwrap();

        let engine = TransactionEngine::new(
            store.clone(),
            Arc::new(MockEscrow::new()),
            Arc::new(MockPayment::new()),
            Arc::new(MockTokenTransfer::new()),
            events,
            config,
        );

        Harness {
            store,
            engine,
            asset_id: asset.id(),
            buyer_id: buyer.id(),
        }
    }

    #[tokio::test]
    async fn happy_path_purchase_credits_holding() {
        let h = setup(true, true).await;
        let cancel = CancellationToken::new();
        let tx = h.engine.create(h.buyer_id, h.asset_id, 100).unwrap();
        assert_eq!(tx.amount(), dec!(10_000));

        let tx = h.engine.create_escrow(tx.id(), &cancel).await.unwrap();
        assert_eq!(tx.status(), TransactionStatus::EscrowCreated);
        let tx = h.engine.record_payment(tx.id(), "sig1".to_string(), &cancel).await.unwrap();
        assert_eq!(tx.status(), TransactionStatus::PaymentReceived);
        let tx = h.engine.transfer_tokens(tx.id(), &cancel).await.unwrap();
        assert_eq!(tx.status(), TransactionStatus::TokensTransferred);
        let tx = h.engine.complete(tx.id(), &cancel).await.unwrap();
        assert_eq!(tx.status(), TransactionStatus::Completed);

        let holding = h
            .store
            .atomic(|txn| {
                let profile = txn.find_investor_profile_by_user(h.buyer_id).unwrap();
                Ok(txn.get_holding(profile.id(), h.asset_id))
            })
            .unwrap()
            .unwrap();
        assert_eq!(holding.token_amount(), 100);
        assert_eq!(holding.cost_basis(), dec!(10_000));
    }

    #[tokio::test]
    async fn complete_is_idempotent() {
        let h = setup(true, true).await;
        let cancel = CancellationToken::new();
        let tx = h.engine.create(h.buyer_id, h.asset_id, 100).unwrap();
        let tx = h.engine.create_escrow(tx.id(), &cancel).await.unwrap();
        let tx = h.engine.record_payment(tx.id(), "sig1".to_string(), &cancel).await.unwrap();
        let tx = h.engine.transfer_tokens(tx.id(), &cancel).await.unwrap();
        h.engine.complete(tx.id(), &cancel).await.unwrap();
        h.engine.complete(tx.id(), &cancel).await.unwrap();

        let holding = h
            .store
            .atomic(|txn| {
                let profile = txn.find_investor_profile_by_user(h.buyer_id).unwrap();
                Ok(txn.get_holding(profile.id(), h.asset_id))
            })
            .unwrap()
            .unwrap();
        assert_eq!(holding.token_amount(), 100);
    }

    #[tokio::test]
    async fn create_rejects_unlisted_asset() {
        let h = setup(false, true).await;
        let err = h.engine.create(h.buyer_id, h.asset_id, 100).unwrap_err();
        assert!(matches!(err, TransactionEngineError::NotListed));
    }

    #[tokio::test]
    async fn create_requires_kyc() {
        let h = setup(true, false).await;
        let err = h.engine.create(h.buyer_id, h.asset_id, 100).unwrap_err();
        assert!(matches!(err, TransactionEngineError::KycRequired));
    }

    #[tokio::test]
    async fn create_rejects_oversupply() {
        let h = setup(true, true).await;
        let err = h.engine.create(h.buyer_id, h.asset_id, 10_001).unwrap_err();
        assert!(matches!(
            err,
            TransactionEngineError::InsufficientSupply { available: 10_000, requested: 10_001 }
        ));
    }
}
