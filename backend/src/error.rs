//! Top-level error taxonomy.
//!
//! Every engine (`store`, `lifecycle`, `transactions`, `auctions`) defines
//! its own `thiserror` enum with precise, domain-specific variants. Each of
//! those converts into an [`EngineError`], which classifies the failure into
//! the orthogonal [`ErrorKind`] taxonomy and carries the HTTP status hint a
//! transport layer would use — the core never talks HTTP itself, but the
//! mapping is a normative part of its contract.

use crate::collaborators::CollaboratorError;
use crate::lifecycle::LifecycleError;
use crate::store::StoreError;
use crate::transactions::TransactionEngineError;
use crate::auctions::AuctionEngineError;

/// Domain-level error classification, orthogonal to the entity that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidStatus,
    InvalidInput,
    Conflict,
    Forbidden,
    KycRequired,
    CollaboratorFailure,
    Internal,
}

impl ErrorKind {
    /// HTTP status code an (out-of-scope) transport layer would map this to.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidStatus | ErrorKind::InvalidInput => 400,
            ErrorKind::Conflict => 409,
            ErrorKind::Forbidden | ErrorKind::KycRequired => 403,
            ErrorKind::CollaboratorFailure => 502,
            ErrorKind::Internal => 500,
        }
    }
}

/// A single engine-wide error value, carrying enough information for a
/// caller to render a `{success:false, error, code, statusCode}` envelope
/// without the core depending on any serialization of its own choosing.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(ref what) => {
                EngineError::new(ErrorKind::NotFound, "NOT_FOUND", what.clone())
            }
            StoreError::UniqueViolation(ref what) => {
                EngineError::new(ErrorKind::Conflict, "CONFLICT", what.clone())
            }
            StoreError::Conflict(ref what) => {
                EngineError::new(ErrorKind::Conflict, "CONFLICT", what.clone())
            }
        }
    }
}

impl From<CollaboratorError> for EngineError {
    fn from(err: CollaboratorError) -> Self {
        EngineError::new(
            ErrorKind::CollaboratorFailure,
            "COLLABORATOR_FAILURE",
            err.to_string(),
        )
    }
}

impl From<LifecycleError> for EngineError {
    fn from(err: LifecycleError) -> Self {
        use LifecycleError::*;
        let (kind, code): (ErrorKind, &'static str) = match err {
            AssetNotFound(_) => (ErrorKind::NotFound, "ASSET_NOT_FOUND"),
            InvalidStatus { .. } => (ErrorKind::InvalidStatus, "INVALID_STATUS"),
            MissingDocuments(_) => (ErrorKind::InvalidInput, "MISSING_DOCUMENTS"),
            AssetTokenized => (ErrorKind::InvalidStatus, "ASSET_TOKENIZED"),
            CannotDelete => (ErrorKind::InvalidStatus, "CANNOT_DELETE"),
            InvalidInput(_) => (ErrorKind::InvalidInput, "INVALID_INPUT"),
            TokenizationFailed(_) => (ErrorKind::CollaboratorFailure, "TOKENIZATION_FAILED"),
            Store(_) => (ErrorKind::Internal, "INTERNAL"),
        };
        EngineError::new(kind, code, err.to_string())
    }
}

impl From<TransactionEngineError> for EngineError {
    fn from(err: TransactionEngineError) -> Self {
        use TransactionEngineError::*;
        let (kind, code): (ErrorKind, &'static str) = match err {
            AssetNotFound(_) => (ErrorKind::NotFound, "ASSET_NOT_FOUND"),
            BuyerNotFound(_) => (ErrorKind::NotFound, "BUYER_NOT_FOUND"),
            TransactionNotFound(_) => (ErrorKind::NotFound, "NOT_FOUND"),
            NotListed => (ErrorKind::InvalidStatus, "NOT_LISTED"),
            NoPrice => (ErrorKind::InvalidInput, "NO_PRICE"),
            InsufficientSupply { .. } => (ErrorKind::Conflict, "INSUFFICIENT_SUPPLY"),
            KycRequired => (ErrorKind::KycRequired, "KYC_REQUIRED"),
            NoProfile => (ErrorKind::InvalidInput, "NO_PROFILE"),
            InvalidStatus { .. } => (ErrorKind::InvalidStatus, "INVALID_STATUS"),
            InvalidInput(_) => (ErrorKind::InvalidInput, "INVALID_INPUT"),
            CollaboratorFailure(_) => (ErrorKind::CollaboratorFailure, "COLLABORATOR_FAILURE"),
            Store(_) => (ErrorKind::Internal, "INTERNAL"),
        };
        EngineError::new(kind, code, err.to_string())
    }
}

impl From<AuctionEngineError> for EngineError {
    fn from(err: AuctionEngineError) -> Self {
        use AuctionEngineError::*;
        let (kind, code): (ErrorKind, &'static str) = match err {
            AssetNotFound(_) => (ErrorKind::NotFound, "ASSET_NOT_FOUND"),
            AuctionNotFound(_) => (ErrorKind::NotFound, "NOT_FOUND"),
            BidNotFound(_) => (ErrorKind::NotFound, "NOT_FOUND"),
            BidderNotFound(_) => (ErrorKind::NotFound, "NOT_FOUND"),
            NotTokenized => (ErrorKind::InvalidStatus, "NOT_TOKENIZED"),
            InvalidStartTime => (ErrorKind::InvalidInput, "INVALID_START_TIME"),
            InvalidEndTime(_) => (ErrorKind::InvalidInput, "INVALID_END_TIME"),
            OverlappingAuction => (ErrorKind::Conflict, "OVERLAPPING_AUCTION"),
            AuctionNotActive => (ErrorKind::InvalidStatus, "AUCTION_NOT_ACTIVE"),
            BidTooLow { .. } => (ErrorKind::InvalidInput, "BID_TOO_LOW"),
            KycRequired => (ErrorKind::KycRequired, "KYC_REQUIRED"),
            CannotCancelWinning => (ErrorKind::InvalidStatus, "CANNOT_CANCEL_WINNING"),
            NotOwner => (ErrorKind::Forbidden, "FORBIDDEN"),
            AuctionNotEnded => (ErrorKind::InvalidStatus, "AUCTION_NOT_ENDED"),
            CollaboratorFailure(_) => (ErrorKind::CollaboratorFailure, "COLLABORATOR_FAILURE"),
            Store(_) => (ErrorKind::Internal, "INTERNAL"),
        };
        EngineError::new(kind, code, err.to_string())
    }
}
