//! Payment collaborator

use super::CollaboratorError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// `verifyInbound(signature, expectedAmount, destination) -> bool`;
/// `transferOut(from, to, amount) -> signature`
#[async_trait]
pub trait Payment: Send + Sync {
    async fn verify_inbound(
        &self,
        signature: &str,
        expected_amount: Decimal,
        destination: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, CollaboratorError>;

    async fn transfer_out(
        &self,
        idempotency_key: Uuid,
        from: &str,
        to: &str,
        amount: Decimal,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError>;
}

#[derive(Debug, Default)]
pub struct MockPayment;

impl MockPayment {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Payment for MockPayment {
    async fn verify_inbound(
        &self,
        signature: &str,
        _expected_amount: Decimal,
        _destination: &str,
        _cancel: &CancellationToken,
    ) -> Result<bool, CollaboratorError> {
        Ok(!signature.is_empty())
    }

    async fn transfer_out(
        &self,
        idempotency_key: Uuid,
        from: &str,
        to: &str,
        _amount: Decimal,
        _cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        Ok(format!("payout-{idempotency_key}-{from}-{to}"))
    }
}
