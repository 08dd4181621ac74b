//! Transaction model — a purchase moving through the state machine owned by
//! [`crate::transactions::TransactionEngine`].
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    PrimarySale,
    SecondarySale,
    AuctionSettlement,
    Redemption,
}

/// Purchase state machine status. `Completed`, `Cancelled`, and `Refunded`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    EscrowCreated,
    PaymentReceived,
    TokensTransferred,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed
                | TransactionStatus::Cancelled
                | TransactionStatus::Refunded
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    id: Uuid,
    asset_id: Uuid,
    buyer_id: Uuid,
    seller_id: Option<Uuid>,
    transaction_type: TransactionType,
    amount: Decimal,
    token_amount: u64,
    escrow_address: Option<String>,
    tx_signature: Option<String>,
    status: TransactionStatus,
    failure_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        asset_id: Uuid,
        buyer_id: Uuid,
        seller_id: Option<Uuid>,
        transaction_type: TransactionType,
        amount: Decimal,
        token_amount: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            asset_id,
            buyer_id,
            seller_id,
            transaction_type,
            amount,
            token_amount,
            escrow_address: None,
            tx_signature: None,
            status: TransactionStatus::Pending,
            failure_reason: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn asset_id(&self) -> Uuid {
        self.asset_id
    }

    pub fn buyer_id(&self) -> Uuid {
        self.buyer_id
    }

    pub fn seller_id(&self) -> Option<Uuid> {
        self.seller_id
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn token_amount(&self) -> u64 {
        self.token_amount
    }

    pub fn escrow_address(&self) -> Option<&str> {
        self.escrow_address.as_deref()
    }

    pub fn tx_signature(&self) -> Option<&str> {
        self.tx_signature.as_deref()
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(crate) fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub(crate) fn set_escrow_address(&mut self, escrow_address: String) {
        self.escrow_address = Some(escrow_address);
        self.status = TransactionStatus::EscrowCreated;
        self.updated_at = Utc::now();
    }

    pub(crate) fn set_tx_signature(&mut self, tx_signature: String) {
        self.tx_signature = Some(tx_signature);
        self.status = TransactionStatus::TokensTransferred;
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_completed(&mut self) {
        self.status = TransactionStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_failed(&mut self, reason: String) {
        self.status = TransactionStatus::Failed;
        self.failure_reason = Some(reason);
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_cancelled(&mut self, reason: String) {
        self.status = TransactionStatus::Cancelled;
        self.failure_reason = Some(reason);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_transaction_is_pending() {
        let tx = Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            TransactionType::PrimarySale,
            dec!(10_000),
            100,
        );
        assert_eq!(tx.status(), TransactionStatus::Pending);
        assert!(!tx.status().is_terminal());
    }

    #[test]
    fn terminal_statuses() {
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
        assert!(TransactionStatus::Refunded.is_terminal());
        assert!(!TransactionStatus::PaymentReceived.is_terminal());
    }
}
