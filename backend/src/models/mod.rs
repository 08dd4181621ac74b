//! Domain models for the RWA tokenization marketplace.

pub mod asset;
pub mod auction;
pub mod bank;
pub mod bid;
pub mod document;
pub mod holding;
pub mod investor_profile;
pub mod transaction;
pub mod user;

pub use asset::{Asset, AssetType, ListingStatus, TokenizationStatus};
pub use auction::{Auction, AuctionStatus};
pub use bank::Bank;
pub use bid::Bid;
pub use document::{Document, DocumentType};
pub use holding::PortfolioHolding;
pub use investor_profile::{AccreditationStatus, InvestorProfile, InvestorType, RiskTolerance};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use user::{KycStatus, Role, User};
