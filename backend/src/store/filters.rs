//! Per-entity filter predicates for `Store::list_*` queries.

use crate::models::{
    Asset, AssetType, Auction, AuctionStatus, ListingStatus, Transaction, TransactionStatus,
    TransactionType, TokenizationStatus,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub bank_id: Option<Uuid>,
    pub asset_type: Option<AssetType>,
    pub tokenization_status: Option<TokenizationStatus>,
    pub listing_status: Option<ListingStatus>,
    pub value_min: Option<Decimal>,
    pub value_max: Option<Decimal>,
    pub text: Option<String>,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        if let Some(bank_id) = self.bank_id {
            if asset.bank_id() != bank_id {
                return false;
            }
        }
        if let Some(t) = self.asset_type {
            if asset.asset_type() != t {
                return false;
            }
        }
        if let Some(s) = self.tokenization_status {
            if asset.tokenization_status() != s {
                return false;
            }
        }
        if let Some(s) = self.listing_status {
            if asset.listing_status() != s {
                return false;
            }
        }
        if let Some(min) = self.value_min {
            if asset.total_value() < min {
                return false;
            }
        }
        if let Some(max) = self.value_max {
            if asset.total_value() > max {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let name_matches = asset.name().to_lowercase().contains(&needle);
            let description_matches = asset
                .description()
                .map_or(false, |d| d.to_lowercase().contains(&needle));
            if !name_matches && !description_matches {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub buyer_id: Option<Uuid>,
    pub asset_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(buyer_id) = self.buyer_id {
            if tx.buyer_id() != buyer_id {
                return false;
            }
        }
        if let Some(asset_id) = self.asset_id {
            if tx.asset_id() != asset_id {
                return false;
            }
        }
        if let Some(t) = self.transaction_type {
            if tx.transaction_type() != t {
                return false;
            }
        }
        if let Some(s) = self.status {
            if tx.status() != s {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuctionFilter {
    pub asset_id: Option<Uuid>,
    pub status: Option<AuctionStatus>,
    pub reserve_min: Option<Decimal>,
    pub reserve_max: Option<Decimal>,
}

impl AuctionFilter {
    pub fn matches(&self, auction: &Auction) -> bool {
        if let Some(asset_id) = self.asset_id {
            if auction.asset_id() != asset_id {
                return false;
            }
        }
        if let Some(s) = self.status {
            if auction.status() != s {
                return false;
            }
        }
        if let Some(min) = self.reserve_min {
            if auction.reserve_price() < min {
                return false;
            }
        }
        if let Some(max) = self.reserve_max {
            if auction.reserve_price() > max {
                return false;
            }
        }
        true
    }
}
