//! KYC/Identity collaborator
//!
//! This is called by an admission filter, not per request: the
//! engines gate purchases and bids on the `kycStatus` already persisted on
//! `User`, they do not call out to this trait synchronously.
//! A background sync job (not built here — out of scope) would use this
//! trait to refresh `User::kyc_status`; the CLI exposes a manual equivalent
//! for operator testing.

use super::CollaboratorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct VerificationStatus {
    pub verified: bool,
    pub level: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// `isVerified(walletAddress) -> {verified, level, expiresAt?}`
#[async_trait]
pub trait KycProvider: Send + Sync {
    async fn is_verified(
        &self,
        wallet_address: &str,
        cancel: &CancellationToken,
    ) -> Result<VerificationStatus, CollaboratorError>;
}

#[derive(Debug, Default)]
pub struct MockKycProvider {
    /// Development default: every wallet is already verified.
    pub default_verified: bool,
}

impl MockKycProvider {
    pub fn new(default_verified: bool) -> Self {
        Self { default_verified }
    }
}

#[async_trait]
impl KycProvider for MockKycProvider {
    async fn is_verified(
        &self,
        _wallet_address: &str,
        _cancel: &CancellationToken,
    ) -> Result<VerificationStatus, CollaboratorError> {
        Ok(VerificationStatus {
            verified: self.default_verified,
            level: self.default_verified.then(|| "basic".to_string()),
            expires_at: None,
        })
    }
}
