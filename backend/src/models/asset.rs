//! Asset model — the tokenization lifecycle state machine's subject.
//!
//! `tokenization_status` and `listing_status` are
//! two independent axes: an asset can only leave `Unlisted` once it is
//! `Tokenized` (invariant 5 / listing monotonicity), but the two machines are
//! otherwise driven by separate operations (`AssetLifecycle` vs.
//! `AssetLifecycle::list_on_marketplace`/`delist_from_marketplace`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    RealEstate,
    Commodity,
    PrivateEquity,
    Bond,
    ArtCollectible,
    Other,
}

/// Tokenization lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenizationStatus {
    Draft,
    PendingReview,
    PendingTokenization,
    Tokenized,
    Failed,
}

/// Marketplace listing status. May only leave `Unlisted` once
/// `tokenization_status == Tokenized` (invariant 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Unlisted,
    Pending,
    Listed,
    SoldOut,
    Delisted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    id: Uuid,
    bank_id: Uuid,
    name: String,
    description: Option<String>,
    asset_type: AssetType,
    total_value: Decimal,
    total_supply: u64,
    price_per_token: Decimal,
    mint_address: Option<String>,
    metadata_uri: Option<String>,
    tokenization_offering_id: Option<String>,
    tokenization_status: TokenizationStatus,
    listing_status: ListingStatus,
    tokenized_at: Option<DateTime<Utc>>,
    listed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Asset {
    /// Creates a new asset in `(Draft, Unlisted)`.
    ///
    /// `price_per_token` defaults to `total_value / total_supply` when not
    /// given explicitly.
    ///
    /// # Panics
    ///
    /// Panics if `total_value <= 0` or `total_supply == 0` — callers
    /// (`AssetLifecycle::create`) are expected to validate these as
    /// `INVALID_INPUT` before constructing an `Asset`.
    pub fn new(
        bank_id: Uuid,
        name: String,
        description: Option<String>,
        asset_type: AssetType,
        total_value: Decimal,
        total_supply: u64,
        price_per_token: Option<Decimal>,
    ) -> Self {
        assert!(total_value > Decimal::ZERO, "total_value must be positive");
        assert!(total_supply > 0, "total_supply must be positive");

        let price_per_token =
            price_per_token.unwrap_or_else(|| total_value / Decimal::from(total_supply));

        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            bank_id,
            name,
            description,
            asset_type,
            total_value,
            total_supply,
            price_per_token,
            mint_address: None,
            metadata_uri: None,
            tokenization_offering_id: None,
            tokenization_status: TokenizationStatus::Draft,
            listing_status: ListingStatus::Unlisted,
            tokenized_at: None,
            listed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn bank_id(&self) -> Uuid {
        self.bank_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn total_value(&self) -> Decimal {
        self.total_value
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn price_per_token(&self) -> Decimal {
        self.price_per_token
    }

    pub fn mint_address(&self) -> Option<&str> {
        self.mint_address.as_deref()
    }

    pub fn metadata_uri(&self) -> Option<&str> {
        self.metadata_uri.as_deref()
    }

    pub fn tokenization_offering_id(&self) -> Option<&str> {
        self.tokenization_offering_id.as_deref()
    }

    pub fn tokenization_status(&self) -> TokenizationStatus {
        self.tokenization_status
    }

    pub fn listing_status(&self) -> ListingStatus {
        self.listing_status
    }

    pub fn tokenized_at(&self) -> Option<DateTime<Utc>> {
        self.tokenized_at
    }

    pub fn listed_at(&self) -> Option<DateTime<Utc>> {
        self.listed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True when every holding against this asset could not exceed supply,
    /// given `sold` tokens already held by investors (invariant 1 helper —
    /// the actual sum is computed by the `Store`, this only does the
    /// arithmetic).
    pub fn available_tokens(&self, sold: u64) -> u64 {
        self.total_supply.saturating_sub(sold)
    }

    pub(crate) fn set_fields(
        &mut self,
        name: Option<String>,
        description: Option<Option<String>>,
        total_value: Option<Decimal>,
        total_supply: Option<u64>,
        price_per_token: Option<Decimal>,
    ) {
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(total_value) = total_value {
            self.total_value = total_value;
        }
        if let Some(total_supply) = total_supply {
            self.total_supply = total_supply;
        }
        if let Some(price_per_token) = price_per_token {
            self.price_per_token = price_per_token;
        }
        self.updated_at = Utc::now();
    }

    pub(crate) fn set_tokenization_status(&mut self, status: TokenizationStatus) {
        self.tokenization_status = status;
        self.updated_at = Utc::now();
    }

    pub(crate) fn mark_tokenized(
        &mut self,
        offering_id: String,
        mint_address: String,
        metadata_uri: Option<String>,
    ) {
        self.tokenization_offering_id = Some(offering_id);
        self.mint_address = Some(mint_address);
        self.metadata_uri = metadata_uri;
        self.tokenization_status = TokenizationStatus::Tokenized;
        let now = Utc::now();
        self.tokenized_at = Some(now);
        self.updated_at = now;
    }

    pub(crate) fn set_listing_status(&mut self, status: ListingStatus) {
        self.listing_status = status;
        if status == ListingStatus::Listed && self.listed_at.is_none() {
            self.listed_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
    }
}
