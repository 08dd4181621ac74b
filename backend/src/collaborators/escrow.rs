//! Escrow collaborator

use super::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// `open(buyer, seller, amount, expiresAt) -> escrowId`; `release(escrowId)`;
/// `refund(escrowId, recipient)`
#[async_trait]
pub trait Escrow: Send + Sync {
    async fn open(
        &self,
        idempotency_key: Uuid,
        buyer: Uuid,
        seller: Option<Uuid>,
        amount: Decimal,
        expires_at: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError>;

    async fn release(
        &self,
        idempotency_key: Uuid,
        escrow_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError>;

    async fn refund(
        &self,
        idempotency_key: Uuid,
        escrow_id: &str,
        recipient: Uuid,
        cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Default)]
pub struct MockEscrow {
    opened: Mutex<BTreeSet<Uuid>>,
}

impl MockEscrow {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Escrow for MockEscrow {
    async fn open(
        &self,
        idempotency_key: Uuid,
        buyer: Uuid,
        _seller: Option<Uuid>,
        _amount: Decimal,
        _expires_at: DateTime<Utc>,
        _cancel: &CancellationToken,
    ) -> Result<String, CollaboratorError> {
        self.opened.lock().expect("mutex poisoned").insert(idempotency_key);
        Ok(format!("escrow-{idempotency_key}-{buyer}"))
    }

    async fn release(
        &self,
        _idempotency_key: Uuid,
        _escrow_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }

    async fn refund(
        &self,
        _idempotency_key: Uuid,
        _escrow_id: &str,
        _recipient: Uuid,
        _cancel: &CancellationToken,
    ) -> Result<(), CollaboratorError> {
        Ok(())
    }
}
