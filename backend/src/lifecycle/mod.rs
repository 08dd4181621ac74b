//! AssetLifecycle — the tokenization state machine
//!
//! ```text
//! DRAFT --submitForReview--> PENDING_REVIEW --approveForTokenization--> PENDING_TOKENIZATION
//!   |                                                                        |
//!   | (direct path, admin-only) ------------------------------------------->|
//!   v                                                                       v
//! DRAFT --(tokenize from DRAFT or FAILED, admin-only)--> TOKENIZED    TOKENIZED / FAILED
//! ```

use crate::collaborators::{bounded, OfferingParams, Tokenization};
use crate::config::EngineConfig;
use crate::events::{DomainEvent, EventLog};
use crate::models::{
    Asset, AssetType, Document, DocumentType, ListingStatus, TokenizationStatus,
};
use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9-]{3,10}$").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("asset {0} not found")]
    AssetNotFound(Uuid),
    #[error("invalid status: expected {expected}, found {found}")]
    InvalidStatus { expected: String, found: String },
    #[error("missing required documents: {0:?}")]
    MissingDocuments(Vec<DocumentType>),
    #[error("asset is already tokenized")]
    AssetTokenized,
    #[error("asset cannot be deleted outside DRAFT")]
    CannotDelete,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("tokenization failed: {0}")]
    TokenizationFailed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct CreateAssetInput {
    pub name: String,
    pub description: Option<String>,
    pub asset_type: AssetType,
    pub total_value: Decimal,
    pub total_supply: u64,
    pub price_per_token: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAssetInput {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub total_value: Option<Decimal>,
    pub total_supply: Option<u64>,
    pub price_per_token: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct TokenizeInput {
    pub symbol: String,
    pub minimum_investment: Decimal,
    pub maximum_investment: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct AssetStats {
    pub total_value: Decimal,
    pub total_supply: u64,
    pub price_per_token: Decimal,
    pub sold_tokens: u64,
    pub available_tokens: u64,
    pub transaction_count: u64,
    pub investor_count: u64,
}

/// Owns the tokenization state machine; coordinates with the `Tokenization`
/// collaborator; enforces required-document and status-transition rules.
pub struct AssetLifecycle<T: Tokenization> {
    store: Arc<Store>,
    tokenization: Arc<T>,
    events: Arc<EventLog>,
    config: EngineConfig,
}

impl<T: Tokenization> AssetLifecycle<T> {
    pub fn new(
        store: Arc<Store>,
        tokenization: Arc<T>,
        events: Arc<EventLog>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            tokenization,
            events,
            config,
        }
    }

    #[tracing::instrument(skip(self, input))]
    pub fn create(&self, bank_id: Uuid, input: CreateAssetInput) -> Result<Asset, LifecycleError> {
        if input.total_value <= Decimal::ZERO {
            return Err(LifecycleError::InvalidInput(
                "total_value must be positive".to_string(),
            ));
        }
        if input.total_supply == 0 {
            return Err(LifecycleError::InvalidInput(
                "total_supply must be positive".to_string(),
            ));
        }
        let asset = Asset::new(
            bank_id,
            input.name,
            input.description,
            input.asset_type,
            input.total_value,
            input.total_supply,
            input.price_per_token,
        );
        let asset = self.store.atomic(|txn| txn.create_asset(asset))?;
        Ok(asset)
    }

    #[tracing::instrument(skip(self, input))]
    pub fn update(&self, id: Uuid, input: UpdateAssetInput) -> Result<Asset, LifecycleError> {
        self.store.atomic(|txn| {
            let mut asset = txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))?;
            match asset.tokenization_status() {
                TokenizationStatus::Draft
                | TokenizationStatus::PendingReview
                | TokenizationStatus::Failed => {}
                TokenizationStatus::Tokenized | TokenizationStatus::PendingTokenization => {
                    return Err(LifecycleError::AssetTokenized);
                }
            }
            asset.set_fields(
                input.name.clone(),
                input.description.clone(),
                input.total_value,
                input.total_supply,
                input.price_per_token,
            );
            Ok(txn.update_asset(asset)?)
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> Result<(), LifecycleError> {
        self.store.atomic(|txn| {
            let asset = txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))?;
            if asset.tokenization_status() != TokenizationStatus::Draft {
                return Err(LifecycleError::CannotDelete);
            }
            Ok(txn.delete_asset(id)?)
        })
    }

    pub fn add_document(
        &self,
        asset_id: Uuid,
        document_type: DocumentType,
        name: String,
        storage_key: String,
        mime_type: String,
        size_bytes: u64,
        uploaded_by: Uuid,
    ) -> Result<Document, LifecycleError> {
        self.store.atomic(|txn| {
            txn.get_asset(asset_id)
                .map_err(|_| LifecycleError::AssetNotFound(asset_id))?;
            let document = Document::new(
                asset_id,
                document_type,
                name,
                storage_key,
                mime_type,
                size_bytes,
                uploaded_by,
            );
            Ok(txn.create_document(document)?)
        })
    }

    /// Requires `DRAFT` and at least one `APPRAISAL` and one `LEGAL_OPINION`
    /// document; lists precisely what is missing otherwise.
    #[tracing::instrument(skip(self))]
    pub fn submit_for_review(&self, id: Uuid) -> Result<Asset, LifecycleError> {
        self.store.atomic(|txn| {
            let mut asset = txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))?;
            if asset.tokenization_status() == TokenizationStatus::PendingReview {
                return Ok(asset);
            }
            if asset.tokenization_status() != TokenizationStatus::Draft {
                return Err(LifecycleError::InvalidStatus {
                    expected: "DRAFT".to_string(),
                    found: format!("{:?}", asset.tokenization_status()),
                });
            }
            let documents = txn.list_documents_for_asset(id);
            let mut missing = Vec::new();
            if !documents.iter().any(|d| d.document_type() == DocumentType::Appraisal) {
                missing.push(DocumentType::Appraisal);
            }
            if !documents.iter().any(|d| d.document_type() == DocumentType::LegalOpinion) {
                missing.push(DocumentType::LegalOpinion);
            }
            if !missing.is_empty() {
                return Err(LifecycleError::MissingDocuments(missing));
            }
            asset.set_tokenization_status(TokenizationStatus::PendingReview);
            let asset = txn.update_asset(asset)?;
            self.events.record(DomainEvent::AssetStatusChanged {
                asset_id: id,
                from: "DRAFT".to_string(),
                to: "PENDING_REVIEW".to_string(),
            });
            Ok(asset)
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn approve_for_tokenization(&self, id: Uuid) -> Result<Asset, LifecycleError> {
        self.store.atomic(|txn| {
            let mut asset = txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))?;
            if asset.tokenization_status() == TokenizationStatus::PendingTokenization {
                return Ok(asset);
            }
            if asset.tokenization_status() != TokenizationStatus::PendingReview {
                return Err(LifecycleError::InvalidStatus {
                    expected: "PENDING_REVIEW".to_string(),
                    found: format!("{:?}", asset.tokenization_status()),
                });
            }
            asset.set_tokenization_status(TokenizationStatus::PendingTokenization);
            let asset = txn.update_asset(asset)?;
            self.events.record(DomainEvent::AssetStatusChanged {
                asset_id: id,
                from: "PENDING_REVIEW".to_string(),
                to: "PENDING_TOKENIZATION".to_string(),
            });
            Ok(asset)
        })
    }

    /// Requires status in `{DRAFT, PENDING_TOKENIZATION, FAILED}`. Invokes
    /// the Tokenization collaborator (create offering, then deploy token);
    /// any collaborator failure transitions the asset to `FAILED` and is
    /// safe to retry.
    #[tracing::instrument(skip(self, input, cancel))]
    pub async fn tokenize(
        &self,
        id: Uuid,
        input: TokenizeInput,
        cancel: &CancellationToken,
    ) -> Result<Asset, LifecycleError> {
        if !SYMBOL_RE.is_match(&input.symbol) {
            return Err(LifecycleError::InvalidInput(format!(
                "symbol {:?} does not match ^[A-Z0-9-]{{3,10}}$",
                input.symbol
            )));
        }

        let asset = self.store.atomic(|txn| {
            txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))
        })?;
        if asset.tokenization_status() == TokenizationStatus::Tokenized {
            return Ok(asset);
        }
        match asset.tokenization_status() {
            TokenizationStatus::Draft
            | TokenizationStatus::PendingTokenization
            | TokenizationStatus::Failed => {}
            other => {
                return Err(LifecycleError::InvalidStatus {
                    expected: "DRAFT, PENDING_TOKENIZATION, or FAILED".to_string(),
                    found: format!("{other:?}"),
                })
            }
        }

        let outcome = if self.config.tokenization_enabled {
            let timeout = self.config.collaborator_timeout();
            let params = OfferingParams {
                asset_id: id,
                symbol: input.symbol.clone(),
                minimum_investment: input.minimum_investment,
                maximum_investment: input.maximum_investment,
                start_date: input.start_date,
                end_date: input.end_date,
            };
            async {
                let offering_id =
                    bounded(timeout, cancel, self.tokenization.create_offering(id, params, cancel)).await?;
                let deployment = bounded(
                    timeout,
                    cancel,
                    self.tokenization.deploy_token(id, &offering_id, "platform", cancel),
                )
                .await?;
                Ok::<_, crate::collaborators::CollaboratorError>((offering_id, deployment))
            }
            .await
        } else {
            // `tokenization.enabled = false`: synthesize a
            // deterministic offering/mint instead of calling the collaborator.
            tracing::debug!(asset_id = %id, "tokenization collaborator disabled, synthesizing offering");
            Ok((
                format!("offering-dev-{id}"),
                crate::collaborators::TokenDeployment {
                    mint_address: format!("mint-dev-{id}"),
                    metadata_uri: None,
                    tx_signature: format!("sig-dev-{id}"),
                },
            ))
        };

        match outcome {
            Ok((offering_id, deployment)) => self.store.atomic(|txn| {
                let mut asset = txn.get_asset(id)?;
                asset.mark_tokenized(offering_id, deployment.mint_address, deployment.metadata_uri);
                let asset = txn.update_asset(asset)?;
                self.events.record(DomainEvent::AssetStatusChanged {
                    asset_id: id,
                    from: "PENDING_TOKENIZATION".to_string(),
                    to: "TOKENIZED".to_string(),
                });
                Ok(asset)
            }).map_err(LifecycleError::Store),
            Err(err) => {
                tracing::error!(asset_id = %id, error = %err, "tokenization collaborator failed");
                self.store.atomic(|txn| {
                    let mut asset = txn.get_asset(id)?;
                    asset.set_tokenization_status(TokenizationStatus::Failed);
                    txn.update_asset(asset)
                })?;
                Err(LifecycleError::TokenizationFailed(err.to_string()))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn list_on_marketplace(&self, id: Uuid) -> Result<Asset, LifecycleError> {
        self.store.atomic(|txn| {
            let mut asset = txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))?;
            if asset.listing_status() == ListingStatus::Listed {
                return Ok(asset);
            }
            if asset.tokenization_status() != TokenizationStatus::Tokenized {
                return Err(LifecycleError::InvalidStatus {
                    expected: "TOKENIZED".to_string(),
                    found: format!("{:?}", asset.tokenization_status()),
                });
            }
            asset.set_listing_status(ListingStatus::Listed);
            Ok(txn.update_asset(asset)?)
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn delist_from_marketplace(&self, id: Uuid) -> Result<Asset, LifecycleError> {
        self.store.atomic(|txn| {
            let mut asset = txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))?;
            asset.set_listing_status(ListingStatus::Delisted);
            Ok(txn.update_asset(asset)?)
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn stats(&self, id: Uuid) -> Result<AssetStats, LifecycleError> {
        self.store.atomic(|txn| {
            let asset = txn.get_asset(id).map_err(|_| LifecycleError::AssetNotFound(id))?;
            let sold_tokens = txn.holdings_sum_for_asset(id);
            let (transaction_count, investor_count) = txn.completed_transaction_stats(id);
            Ok(AssetStats {
                total_value: asset.total_value(),
                total_supply: asset.total_supply(),
                price_per_token: asset.price_per_token(),
                sold_tokens,
                available_tokens: asset.available_tokens(sold_tokens),
                transaction_count,
                investor_count,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockTokenizationCollaborator;
    use rust_decimal_macros::dec;

    fn lifecycle() -> AssetLifecycle<MockTokenizationCollaborator> {
        AssetLifecycle::new(
            Arc::new(Store::new()),
            Arc::new(MockTokenizationCollaborator::new()),
            Arc::new(EventLog::new()),
            EngineConfig::default(),
        )
    }

    fn create_input() -> CreateAssetInput {
        CreateAssetInput {
            name: "Prop-1".to_string(),
            description: None,
            asset_type: AssetType::RealEstate,
            total_value: dec!(1_000_000),
            total_supply: 10_000,
            price_per_token: None,
        }
    }

    #[test]
    fn create_derives_price_per_token() {
        let engine = lifecycle();
        let asset = engine.create(Uuid::new_v4(), create_input()).unwrap();
        assert_eq!(asset.price_per_token(), dec!(100));
        assert_eq!(asset.tokenization_status(), TokenizationStatus::Draft);
    }

    #[test]
    fn submit_for_review_requires_both_documents() {
        let engine = lifecycle();
        let asset = engine.create(Uuid::new_v4(), create_input()).unwrap();
        let err = engine.submit_for_review(asset.id()).unwrap_err();
        match err {
            LifecycleError::MissingDocuments(missing) => {
                assert!(missing.contains(&DocumentType::Appraisal));
                assert!(missing.contains(&DocumentType::LegalOpinion));
            }
            other => panic!("expected MissingDocuments, got {other:?}"),
        }

        engine
            .add_document(
                asset.id(),
                DocumentType::Appraisal,
                "appraisal.pdf".to_string(),
                "key-1".to_string(),
                "application/pdf".to_string(),
                1024,
                Uuid::new_v4(),
            )
            .unwrap();
        let err = engine.submit_for_review(asset.id()).unwrap_err();
        assert!(matches!(err, LifecycleError::MissingDocuments(missing) if missing == vec![DocumentType::LegalOpinion]));
    }

    #[tokio::test]
    async fn full_happy_path_reaches_tokenized_and_listed() {
        let engine = lifecycle();
        let asset = engine.create(Uuid::new_v4(), create_input()).unwrap();
        engine
            .add_document(
                asset.id(),
                DocumentType::Appraisal,
                "a".to_string(),
                "k1".to_string(),
                "application/pdf".to_string(),
                1,
                Uuid::new_v4(),
            )
            .unwrap();
        engine
            .add_document(
                asset.id(),
                DocumentType::LegalOpinion,
                "b".to_string(),
                "k2".to_string(),
                "application/pdf".to_string(),
                1,
                Uuid::new_v4(),
            )
            .unwrap();
        engine.submit_for_review(asset.id()).unwrap();
        engine.approve_for_tokenization(asset.id()).unwrap();

        let cancel = CancellationToken::new();
        let tokenized = engine
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
        assert_eq!(tokenized.tokenization_status(), TokenizationStatus::Tokenized);

        let listed = engine.list_on_marketplace(asset.id()).unwrap();
        assert_eq!(listed.listing_status(), ListingStatus::Listed);
        assert!(listed.listed_at().is_some());
    }

    #[test]
    fn invalid_symbol_is_rejected() {
        let engine = lifecycle();
        let asset = engine.create(Uuid::new_v4(), create_input()).unwrap();
        let cancel = CancellationToken::new();
        let result = futures::executor::block_on(engine.tokenize(
            asset.id(),
            TokenizeInput {
                symbol: "p1".to_string(),
                minimum_investment: dec!(1000),
                maximum_investment: None,
                start_date: None,
                end_date: None,
            },
            &cancel,
        ));
        assert!(matches!(result, Err(LifecycleError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn tokenization_disabled_synthesizes_offering_without_collaborator() {
        let mut config = EngineConfig::default();
        config.tokenization_enabled = false;
        let engine = AssetLifecycle::new(
            Arc::new(Store::new()),
            Arc::new(MockTokenizationCollaborator::new()),
            Arc::new(EventLog::new()),
            config,
        );
        let asset = engine.create(Uuid::new_v4(), create_input()).unwrap();
        let cancel = CancellationToken::new();
        let tokenized = engine
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
        assert_eq!(tokenized.tokenization_status(), TokenizationStatus::Tokenized);
        assert_eq!(tokenized.mint_address(), Some(format!("mint-dev-{}", asset.id())).as_deref());
    }
}
