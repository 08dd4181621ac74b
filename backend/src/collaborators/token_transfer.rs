//! Token-transfer collaborator

use super::CollaboratorError;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// `transfer(mint, from, to, amount) -> signature`
#[async_trait]
pub trait TokenTransfer: Send + Sync {
    async fn transfer(
        &self,
        idempotency_key: Uuid,
        mint: &str,
        from: &str,
        to: &str,
        amount: u64,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError>;
}

#[derive(Debug, Default)]
pub struct MockTokenTransfer;

impl MockTokenTransfer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenTransfer for MockTokenTransfer {
    async fn transfer(
        &self,
        idempotency_key: Uuid,
        mint: &str,
        _from: &str,
        to: &str,
        amount: u64,
        _cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        Ok(format!("transfer-{idempotency_key}-{mint}-{to}-{amount}"))
    }
}
