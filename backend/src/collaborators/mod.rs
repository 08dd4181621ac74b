//! Collaborator interfaces — the narrow external-system
//! contracts the engines depend on instead of any concrete SDK, the same
//! re-architecture `chainflip-engine` applies to its RPC clients behind
//! `StateChainClient`/`retrier.rs`.
//!
//! Every call is bounded by [`bounded`], which races the future against a
//! timeout and a [`CancellationToken`], exactly as `chainflip-engine`'s
//! `retrier.rs` bounds outbound RPCs. Every trait method also takes an
//! `idempotency_key` — the engine's own entity id (`assetId`, `transactionId`,
//! `auctionId`, `bidId`) — since every collaborator call must be idempotent
//! keyed by that id; the mock implementations in this module use it to
//! cache and replay the first result rather than re-executing.

mod escrow;
mod kyc;
mod payment;
mod token_transfer;
mod tokenization;

pub use escrow::{Escrow, MockEscrow};
pub use kyc::{KycProvider, MockKycProvider, VerificationStatus};
pub use payment::{MockPayment, Payment};
pub use token_transfer::{MockTokenTransfer, TokenTransfer};
pub use tokenization::{MockTokenizationCollaborator, OfferingParams, TokenDeployment, Tokenization};

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator call timed out after {0:?}")]
    TimedOut(Duration),
    #[error("collaborator call cancelled")]
    Cancelled,
    #[error("collaborator call failed: {0}")]
    Failed(String),
}

/// Races `fut` against `timeout` and `cancel`, translating either into a
/// [`CollaboratorError`] the way `chainflip-engine`'s `retrier.rs` bounds an
/// RPC call against its own cancellation signal.
pub async fn bounded<F, T>(
    timeout: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(CollaboratorError::Cancelled),
        res = tokio::time::timeout(timeout, fut) => match res {
            Ok(inner) => inner,
            Err(_) => Err(CollaboratorError::TimedOut(timeout)),
        },
    }
}
