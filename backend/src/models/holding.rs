//! PortfolioHolding model — per-investor, per-asset aggregate position.
//!
//! Uniquely keyed by `(investor_profile_id, asset_id)`.
//! Monotonically non-decreasing under primary sales in this core — nothing
//! debits a holding.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioHolding {
    id: Uuid,
    investor_profile_id: Uuid,
    asset_id: Uuid,
    token_amount: u64,
    cost_basis: Decimal,
}

impl PortfolioHolding {
    pub fn new(investor_profile_id: Uuid, asset_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            investor_profile_id,
            asset_id,
            token_amount: 0,
            cost_basis: Decimal::ZERO,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn investor_profile_id(&self) -> Uuid {
        self.investor_profile_id
    }

    pub fn asset_id(&self) -> Uuid {
        self.asset_id
    }

    pub fn token_amount(&self) -> u64 {
        self.token_amount
    }

    pub fn cost_basis(&self) -> Decimal {
        self.cost_basis
    }

    /// Adds to this holding's position — the only mutation this core ever
    /// performs on a holding.
    pub(crate) fn credit(&mut self, token_amount: u64, amount: Decimal) {
        self.token_amount += token_amount;
        self.cost_basis += amount;
    }
}
