//! RWA Marketplace Core — backend control plane for a real-world-asset
//! tokenization marketplace.
//!
//! # Architecture
//!
//! - **store**: strongly-typed in-memory persistence with a unit-of-work
//!   primitive every multi-row mutation goes through.
//! - **models**: the relational data model.
//! - **lifecycle**: `AssetLifecycle`, the tokenization state machine.
//! - **transactions**: `TransactionEngine`, the purchase state machine.
//! - **auctions**: `AuctionEngine`, the auction state machine.
//! - **scheduler**: the periodic tick that advances time-driven auction
//!   transitions.
//! - **collaborators**: narrow external-system interfaces the engines
//!   depend on instead of any concrete SDK.
//! - **events**: an in-memory audit trail of domain state transitions.
//! - **error**: the top-level `EngineError`/`ErrorKind` taxonomy every engine
//!   error converts into.
//! - **config**: `EngineConfig`, the engine's enumerated configuration.
//!
//! # Core invariants
//!
//! 1. Supply conservation: `sum(holdings[asset].token_amount) <=
//!    asset.total_supply` at all times.
//! 2. At most one winning bid per auction.
//! 3. No two `{SCHEDULED, ACTIVE}` auctions on the same asset overlap in
//!    time.
//! 4. A purchase or bid requires the acting user to be KYC `VERIFIED`.
//! 5. `listing_status == LISTED` implies `tokenization_status == TOKENIZED`.

pub mod auctions;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod transactions;

pub use auctions::{AuctionEngine, AuctionEngineError};
pub use config::EngineConfig;
pub use error::{EngineError, ErrorKind};
pub use events::{DomainEvent, EventLog};
pub use lifecycle::{AssetLifecycle, LifecycleError};
pub use scheduler::Scheduler;
pub use store::Store;
pub use transactions::{TransactionEngine, TransactionEngineError};
