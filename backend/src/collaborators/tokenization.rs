//! Tokenization collaborator

use super::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OfferingParams {
    pub asset_id: Uuid,
    pub symbol: String,
    pub minimum_investment: rust_decimal::Decimal,
    pub maximum_investment: Option<rust_decimal::Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct TokenDeployment {
    pub mint_address: String,
    pub metadata_uri: Option<String>,
    pub tx_signature: String,
}

/// `createOffering(params) -> offeringId`, `deployToken(offeringId, authority)
/// -> {mintAddress, metadataUri, txSignature}` Both calls
/// must be retry-safe for the same `(assetId, symbol)` tuple.
#[async_trait]
pub trait Tokenization: Send + Sync {
    async fn create_offering(
        &self,
        idempotency_key: Uuid,
        params: OfferingParams,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError>;

    async fn deploy_token(
        &self,
        idempotency_key: Uuid,
        offering_id: &str,
        authority: &str,
        cancel: &CancellationToken,
    ) -> Result<TokenDeployment, CollaboratorError>;
}

/// Development/test implementation: synthesizes deterministic ids from the
/// idempotency key instead of calling a real tokenization provider. When
/// `EngineConfig::tokenization_enabled` is `false`,
/// `AssetLifecycle::tokenize` bypasses this trait entirely and synthesizes
/// its own offering/mint rather than routing through any implementation.
#[derive(Debug, Default)]
pub struct MockTokenizationCollaborator {
    offerings: Mutex<BTreeMap<Uuid, String>>,
    deployments: Mutex<BTreeMap<Uuid, TokenDeployment>>,
}

impl MockTokenizationCollaborator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tokenization for MockTokenizationCollaborator {
    async fn create_offering(
        &self,
        idempotency_key: Uuid,
        params: OfferingParams,
        _cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        let mut offerings = self.offerings.lock().expect("mutex poisoned");
        let offering_id = offerings
            .entry(idempotency_key)
            .or_insert_with(|| format!("offering-{}-{}", params.asset_id, params.symbol))
            .clone();
        Ok(offering_id)
    }

    async fn deploy_token(
        &self,
        idempotency_key: Uuid,
        offering_id: &str,
        _authority: &str,
        _cancel: &CancellationToken,
    ) -> Result<TokenDeployment, CollaboratorError> {
        let mut deployments = self.deployments.lock().expect("mutex poisoned");
        let deployment = deployments
            .entry(idempotency_key)
            .or_insert_with(|| TokenDeployment {
                mint_address: format!("mint-{offering_id}"),
                metadata_uri: Some(format!("https://metadata.mock/{offering_id}.json")),
                tx_signature: format!("sig-{idempotency_key}"),
            })
            .clone();
        Ok(deployment)
    }
}
