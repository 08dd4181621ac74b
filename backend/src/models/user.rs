//! User model.
//!
//! Represents any principal the platform knows about: platform admins, bank
//! staff, investors, and auditors. `User` itself carries only the identity
//! and access-control attributes shared by every role; investor-specific
//! attributes live in [`crate::models::investor_profile::InvestorProfile`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A principal's place in the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    PlatformAdmin,
    BankAdmin,
    BankViewer,
    Investor,
    Auditor,
}

/// KYC/identity verification status, gating purchases and bids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KycStatus {
    Pending,
    InProgress,
    Verified,
    Rejected,
    Expired,
}

impl KycStatus {
    pub fn is_verified(self) -> bool {
        matches!(self, KycStatus::Verified)
    }
}

/// A registered platform user.
///
/// # Invariants
///
/// * `email`, when present, is unique across all users.
/// * `wallet_address`, when present, is unique across all users.
///
/// Uniqueness itself is enforced by the [`crate::store::Store`] on
/// `create`/`update`, not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: Uuid,
    email: Option<String>,
    wallet_address: Option<String>,
    role: Role,
    kyc_status: KycStatus,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(role: Role, email: Option<String>, wallet_address: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            wallet_address,
            role,
            kyc_status: KycStatus::Pending,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn wallet_address(&self) -> Option<&str> {
        self.wallet_address.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kyc_status(&self) -> KycStatus {
        self.kyc_status
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_verified(&self) -> bool {
        self.kyc_status.is_verified()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_kyc_status(&mut self, status: KycStatus) {
        self.kyc_status = status;
        self.updated_at = Utc::now();
    }

    pub fn set_wallet_address(&mut self, wallet_address: Option<String>) {
        self.wallet_address = wallet_address;
        self.updated_at = Utc::now();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}
