//! Store — the strongly-typed persistence abstraction
//!
//! `Store` is a single in-memory, mutex-guarded collection of typed tables:
//! one `BTreeMap` per entity, indexed by id, with deterministic iteration
//! order. A relational
//! backend is a substitutable future implementation of the same surface —
//! out of scope here (HTTP/persistence transport is an explicit non-goal) —
//! so `Store` is presented as a concrete type rather than a trait; nothing
//! in `lifecycle`/`transactions`/`auctions` depends on it being in-memory.
//!
//! # Unit of work
//!
//! [`Store::atomic`] is the primitive every engine operation that touches
//! more than one row goes through: it takes a closure, hands it a
//! [`StoreTxn`] borrowing the store's single lock for the closure's whole
//! lifetime, and returns whatever the closure returns. If the closure
//! returns `Err`, nothing it did is "uncommitted" in a literal sense (the
//! in-memory tables were mutated directly), but nothing else could have
//! observed the intermediate state, because the lock was held throughout —
//! the same guarantee a transactional SQL backend gives under
//! `SERIALIZABLE` isolation for a single connection.

mod filters;
mod pagination;

pub use filters::{AssetFilter, AuctionFilter, TransactionFilter};
pub use pagination::{Page, Pagination, Sort, SortDirection};

use crate::models::{
    Asset, Auction, Bank, Bid, Document, InvestorProfile, PortfolioHolding, Transaction,
    TransactionStatus, User,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A flat, serializable dump of every table in a [`Store`]. See
/// [`Store::snapshot`]/[`Store::load`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub users: Vec<User>,
    pub investor_profiles: Vec<InvestorProfile>,
    pub banks: Vec<Bank>,
    pub assets: Vec<Asset>,
    pub documents: Vec<Document>,
    pub transactions: Vec<Transaction>,
    pub holdings: Vec<PortfolioHolding>,
    pub auctions: Vec<Auction>,
    pub bids: Vec<Bid>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

#[derive(Default)]
struct StoreInner {
    users: BTreeMap<Uuid, User>,
    investor_profiles: BTreeMap<Uuid, InvestorProfile>,
    banks: BTreeMap<Uuid, Bank>,
    assets: BTreeMap<Uuid, Asset>,
    documents: BTreeMap<Uuid, Document>,
    transactions: BTreeMap<Uuid, Transaction>,
    holdings: BTreeMap<(Uuid, Uuid), PortfolioHolding>,
    auctions: BTreeMap<Uuid, Auction>,
    bids: BTreeMap<Uuid, Bid>,
}

pub struct Store {
    inner: Mutex<StoreInner>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
        }
    }

    /// A flat, JSON-friendly snapshot of every table, for callers (the
    /// bundled CLI) that want to persist store state across process
    /// invocations without a real relational backend. Composite-keyed
    /// tables (holdings) are flattened to their entity list and rebuilt on
    /// [`Store::load`] — each entity already carries the fields that formed
    /// its key.
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.lock().expect("store mutex poisoned");
        StoreSnapshot {
            users: inner.users.values().cloned().collect(),
            investor_profiles: inner.investor_profiles.values().cloned().collect(),
            banks: inner.banks.values().cloned().collect(),
            assets: inner.assets.values().cloned().collect(),
            documents: inner.documents.values().cloned().collect(),
            transactions: inner.transactions.values().cloned().collect(),
            holdings: inner.holdings.values().cloned().collect(),
            auctions: inner.auctions.values().cloned().collect(),
            bids: inner.bids.values().cloned().collect(),
        }
    }

    /// Rebuilds a `Store` from a [`StoreSnapshot`] taken by [`Store::snapshot`].
    pub fn load(snapshot: StoreSnapshot) -> Self {
        let mut inner = StoreInner::default();
        for user in snapshot.users {
            inner.users.insert(user.id(), user);
        }
        for profile in snapshot.investor_profiles {
            inner.investor_profiles.insert(profile.id(), profile);
        }
        for bank in snapshot.banks {
            inner.banks.insert(bank.id(), bank);
        }
        for asset in snapshot.assets {
            inner.assets.insert(asset.id(), asset);
        }
        for document in snapshot.documents {
            inner.documents.insert(document.id(), document);
        }
        for tx in snapshot.transactions {
            inner.transactions.insert(tx.id(), tx);
        }
        for holding in snapshot.holdings {
            inner
                .holdings
                .insert((holding.investor_profile_id(), holding.asset_id()), holding);
        }
        for auction in snapshot.auctions {
            inner.auctions.insert(auction.id(), auction);
        }
        for bid in snapshot.bids {
            inner.bids.insert(bid.id(), bid);
        }
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Runs `f` against a transactional handle holding the store's single
    /// lock for the duration of the call. See module docs for the atomicity
    /// guarantee this provides.
    pub fn atomic<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut StoreTxn) -> Result<T, StoreError>,
    {
        let guard = self.inner.lock().expect("store mutex poisoned");
        let mut txn = StoreTxn { inner: guard };
        f(&mut txn)
    }
}

/// A transactional handle into the store, valid for the lifetime of one
/// [`Store::atomic`] call.
pub struct StoreTxn<'a> {
    inner: std::sync::MutexGuard<'a, StoreInner>,
}

fn not_found(entity: &str, id: Uuid) -> StoreError {
    StoreError::NotFound(format!("{entity} {id} not found"))
}

impl<'a> StoreTxn<'a> {
    // ---- Users -----------------------------------------------------

    pub fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.inner
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("user", id))
    }

    pub fn find_user_by_wallet(&self, wallet_address: &str) -> Option<User> {
        self.inner
            .users
            .values()
            .find(|u| u.wallet_address() == Some(wallet_address))
            .cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .users
            .values()
            .find(|u| u.email() == Some(email))
            .cloned()
    }

    pub fn create_user(&mut self, user: User) -> Result<User, StoreError> {
        if let Some(email) = user.email() {
            if self.find_user_by_email(email).is_some() {
                return Err(StoreError::UniqueViolation(format!(
                    "email {email} already registered"
                )));
            }
        }
        if let Some(wallet) = user.wallet_address() {
            if self.find_user_by_wallet(wallet).is_some() {
                return Err(StoreError::UniqueViolation(format!(
                    "wallet {wallet} already registered"
                )));
            }
        }
        self.inner.users.insert(user.id(), user.clone());
        Ok(user)
    }

    pub fn update_user(&mut self, user: User) -> Result<User, StoreError> {
        if !self.inner.users.contains_key(&user.id()) {
            return Err(not_found("user", user.id()));
        }
        self.inner.users.insert(user.id(), user.clone());
        Ok(user)
    }

    // ---- InvestorProfiles -------------------------------------------

    pub fn get_investor_profile(&self, id: Uuid) -> Result<InvestorProfile, StoreError> {
        self.inner
            .investor_profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("investor_profile", id))
    }

    pub fn find_investor_profile_by_user(&self, user_id: Uuid) -> Option<InvestorProfile> {
        self.inner
            .investor_profiles
            .values()
            .find(|p| p.user_id() == user_id)
            .cloned()
    }

    pub fn create_investor_profile(
        &mut self,
        profile: InvestorProfile,
    ) -> Result<InvestorProfile, StoreError> {
        if self.find_investor_profile_by_user(profile.user_id()).is_some() {
            return Err(StoreError::UniqueViolation(format!(
                "investor profile for user {} already exists",
                profile.user_id()
            )));
        }
        self.inner
            .investor_profiles
            .insert(profile.id(), profile.clone());
        Ok(profile)
    }

    // ---- Banks -------------------------------------------------------

    pub fn get_bank(&self, id: Uuid) -> Result<Bank, StoreError> {
        self.inner
            .banks
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("bank", id))
    }

    pub fn find_bank_by_code(&self, code: &str) -> Option<Bank> {
        self.inner.banks.values().find(|b| b.code() == code).cloned()
    }

    pub fn create_bank(&mut self, bank: Bank) -> Result<Bank, StoreError> {
        if self.find_bank_by_code(bank.code()).is_some() {
            return Err(StoreError::UniqueViolation(format!(
                "bank code {} already registered",
                bank.code()
            )));
        }
        self.inner.banks.insert(bank.id(), bank.clone());
        Ok(bank)
    }

    // ---- Assets --------------------------------------------------------

    pub fn get_asset(&self, id: Uuid) -> Result<Asset, StoreError> {
        self.inner
            .assets
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("asset", id))
    }

    pub fn create_asset(&mut self, asset: Asset) -> Result<Asset, StoreError> {
        self.inner.assets.insert(asset.id(), asset.clone());
        Ok(asset)
    }

    pub fn update_asset(&mut self, asset: Asset) -> Result<Asset, StoreError> {
        if !self.inner.assets.contains_key(&asset.id()) {
            return Err(not_found("asset", asset.id()));
        }
        self.inner.assets.insert(asset.id(), asset.clone());
        Ok(asset)
    }

    pub fn delete_asset(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .assets
            .remove(&id)
            .ok_or_else(|| not_found("asset", id))?;
        self.inner.documents.retain(|_, d| d.asset_id() != id);
        Ok(())
    }

    pub fn list_assets(
        &self,
        filter: &AssetFilter,
        pagination: Pagination,
        sort: Sort,
    ) -> Page<Asset> {
        let mut matching: Vec<Asset> = self
            .inner
            .assets
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        sort.apply(&mut matching, |a| a.created_at(), |a| a.total_value());
        paginate(matching, pagination)
    }

    // ---- Documents -------------------------------------------------------

    pub fn create_document(&mut self, document: Document) -> Result<Document, StoreError> {
        self.inner
            .documents
            .insert(document.id(), document.clone());
        Ok(document)
    }

    pub fn list_documents_for_asset(&self, asset_id: Uuid) -> Vec<Document> {
        self.inner
            .documents
            .values()
            .filter(|d| d.asset_id() == asset_id)
            .cloned()
            .collect()
    }

    // ---- Transactions ------------------------------------------------

    pub fn get_transaction(&self, id: Uuid) -> Result<Transaction, StoreError> {
        self.inner
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("transaction", id))
    }

    pub fn create_transaction(&mut self, tx: Transaction) -> Result<Transaction, StoreError> {
        self.inner.transactions.insert(tx.id(), tx.clone());
        Ok(tx)
    }

    pub fn update_transaction(&mut self, tx: Transaction) -> Result<Transaction, StoreError> {
        if !self.inner.transactions.contains_key(&tx.id()) {
            return Err(not_found("transaction", tx.id()));
        }
        self.inner.transactions.insert(tx.id(), tx.clone());
        Ok(tx)
    }

    pub fn list_transactions(
        &self,
        filter: &TransactionFilter,
        pagination: Pagination,
    ) -> Page<Transaction> {
        let mut matching: Vec<Transaction> = self
            .inner
            .transactions
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        paginate(matching, pagination)
    }

    pub fn transactions_for_buyer(&self, buyer_id: Uuid) -> Vec<Transaction> {
        self.inner
            .transactions
            .values()
            .filter(|t| t.buyer_id() == buyer_id)
            .cloned()
            .collect()
    }

    /// Status -> count breakdown for transactions matching `filter`.
    pub fn transaction_counts_by_status(
        &self,
        filter: &TransactionFilter,
    ) -> std::collections::BTreeMap<TransactionStatus, u64> {
        let mut counts = std::collections::BTreeMap::new();
        for tx in self.inner.transactions.values().filter(|t| filter.matches(t)) {
            *counts.entry(tx.status()).or_insert(0u64) += 1;
        }
        counts
    }

    /// `sum(amount)`/`sum(tokenAmount)` over transactions matching `filter`.
    pub fn transaction_sums(&self, filter: &TransactionFilter) -> (Decimal, u64) {
        self.inner
            .transactions
            .values()
            .filter(|t| filter.matches(t))
            .fold((Decimal::ZERO, 0u64), |(amount, tokens), t| {
                (amount + t.amount(), tokens + t.token_amount())
            })
    }

    /// `(transactionCount, investorCount)` for `AssetLifecycle::stats`:
    /// completed transactions against `asset_id`, and the number of distinct
    /// buyers among them.
    pub fn completed_transaction_stats(&self, asset_id: Uuid) -> (u64, u64) {
        let mut buyers = std::collections::BTreeSet::new();
        let mut count = 0u64;
        for tx in self.inner.transactions.values() {
            if tx.asset_id() == asset_id && tx.status() == TransactionStatus::Completed {
                count += 1;
                buyers.insert(tx.buyer_id());
            }
        }
        (count, buyers.len() as u64)
    }

    /// `sum(PortfolioHolding.tokenAmount where assetId=A)` — the left-hand
    /// side of the supply-conservation invariant.
    pub fn holdings_sum_for_asset(&self, asset_id: Uuid) -> u64 {
        self.inner
            .holdings
            .values()
            .filter(|h| h.asset_id() == asset_id)
            .map(|h| h.token_amount())
            .sum()
    }

    pub fn available_tokens(&self, asset: &Asset) -> u64 {
        asset.available_tokens(self.holdings_sum_for_asset(asset.id()))
    }

    // ---- Holdings ------------------------------------------------------

    pub fn get_holding(
        &self,
        investor_profile_id: Uuid,
        asset_id: Uuid,
    ) -> Option<PortfolioHolding> {
        self.inner
            .holdings
            .get(&(investor_profile_id, asset_id))
            .cloned()
    }

    /// Adds `token_amount`/`amount` to the holding for
    /// `(investor_profile_id, asset_id)`, creating it if absent. This is the
    /// only write path onto a holding in this core.
    pub fn credit_holding(
        &mut self,
        investor_profile_id: Uuid,
        asset_id: Uuid,
        token_amount: u64,
        amount: rust_decimal::Decimal,
    ) -> PortfolioHolding {
        let holding = self
            .inner
            .holdings
            .entry((investor_profile_id, asset_id))
            .or_insert_with(|| PortfolioHolding::new(investor_profile_id, asset_id));
        holding.credit(token_amount, amount);
        holding.clone()
    }

    // ---- Auctions ------------------------------------------------------

    pub fn get_auction(&self, id: Uuid) -> Result<Auction, StoreError> {
        self.inner
            .auctions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("auction", id))
    }

    pub fn create_auction(&mut self, auction: Auction) -> Result<Auction, StoreError> {
        self.inner.auctions.insert(auction.id(), auction.clone());
        Ok(auction)
    }

    pub fn update_auction(&mut self, auction: Auction) -> Result<Auction, StoreError> {
        if !self.inner.auctions.contains_key(&auction.id()) {
            return Err(not_found("auction", auction.id()));
        }
        self.inner.auctions.insert(auction.id(), auction.clone());
        Ok(auction)
    }

    pub fn list_auctions(
        &self,
        filter: &AuctionFilter,
        pagination: Pagination,
    ) -> Page<Auction> {
        let mut matching: Vec<Auction> = self
            .inner
            .auctions
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        paginate(matching, pagination)
    }

    /// Invariant 3: "no two auctions in `{SCHEDULED, ACTIVE}` have
    /// overlapping `[startTime, endTime]`" for a given asset.
    pub fn has_overlapping_auction(
        &self,
        asset_id: Uuid,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
        excluding: Option<Uuid>,
    ) -> bool {
        self.inner.auctions.values().any(|a| {
            a.asset_id() == asset_id && Some(a.id()) != excluding && a.overlaps(start, end)
        })
    }

    // ---- Bids ------------------------------------------------------------

    pub fn get_bid(&self, id: Uuid) -> Result<Bid, StoreError> {
        self.inner
            .bids
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("bid", id))
    }

    pub fn create_bid(&mut self, bid: Bid) -> Result<Bid, StoreError> {
        self.inner.bids.insert(bid.id(), bid.clone());
        Ok(bid)
    }

    pub fn update_bid(&mut self, bid: Bid) -> Result<Bid, StoreError> {
        if !self.inner.bids.contains_key(&bid.id()) {
            return Err(not_found("bid", bid.id()));
        }
        self.inner.bids.insert(bid.id(), bid.clone());
        Ok(bid)
    }

    pub fn delete_bid(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.inner
            .bids
            .remove(&id)
            .ok_or_else(|| not_found("bid", id))?;
        Ok(())
    }

    pub fn winning_bid(&self, auction_id: Uuid) -> Option<Bid> {
        self.inner
            .bids
            .values()
            .find(|b| b.auction_id() == auction_id && b.is_winning())
            .cloned()
    }

    pub fn list_bids_for_auction(&self, auction_id: Uuid, pagination: Pagination) -> Page<Bid> {
        let mut matching: Vec<Bid> = self
            .inner
            .bids
            .values()
            .filter(|b| b.auction_id() == auction_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        paginate(matching, pagination)
    }
}

fn paginate<T: Clone>(items: Vec<T>, pagination: Pagination) -> Page<T> {
    let total = items.len() as u64;
    let total_pages = ((total as f64) / (pagination.limit as f64)).ceil() as u32;
    let total_pages = total_pages.max(1);
    let start = ((pagination.page - 1) as usize) * (pagination.limit as usize);
    let data = items
        .into_iter()
        .skip(start)
        .take(pagination.limit as usize)
        .collect();
    Page {
        data,
        total,
        page: pagination.page,
        limit: pagination.limit,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetType, Role, User};
    use rust_decimal_macros::dec;

    #[test]
    fn atomic_create_and_get_round_trips() {
        let store = Store::new();
        let bank_id = store
            .atomic(|txn| txn.create_bank(Bank::new("First Bank".into(), "FB01".into(), None)))
            .unwrap()
            .id();

        let asset = store
            .atomic(|txn| {
                txn.create_asset(Asset::new(
                    bank_id,
                    "Prop-1".into(),
                    None,
                    AssetType::RealEstate,
                    dec!(1_000_000),
                    10_000,
                    None,
                ))
            })
            .unwrap();

        let fetched = store.atomic(|txn| txn.get_asset(asset.id())).unwrap();
        assert_eq!(fetched.id(), asset.id());
    }

    #[test]
    fn unique_email_violation() {
        let store = Store::new();
        store
            .atomic(|txn| txn.create_user(User::new(Role::Investor, Some("a@b.com".into()), None)))
            .unwrap();
        let second = store
            .atomic(|txn| txn.create_user(User::new(Role::Investor, Some("a@b.com".into()), None)));
        assert!(matches!(second, Err(StoreError::UniqueViolation(_))));
    }

    #[test]
    fn pagination_respects_limit_and_page() {
        let store = Store::new();
        let bank_id = store
            .atomic(|txn| txn.create_bank(Bank::new("B".into(), "B1".into(), None)))
            .unwrap()
            .id();
        for i in 0..5 {
            store
                .atomic(|txn| {
                    txn.create_asset(Asset::new(
                        bank_id,
                        format!("Asset-{i}"),
                        None,
                        AssetType::RealEstate,
                        dec!(1_000_000),
                        10_000,
                        None,
                    ))
                })
                .unwrap();
        }
        let page = store.atomic(|txn| {
            Ok(txn.list_assets(
                &AssetFilter::default(),
                Pagination::new(Some(2), Some(2), 20, 100),
                Sort::default(),
            ))
        });
        let page = page.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
    }
}
