//! Integration tests for `TransactionEngine`.
use rust_decimal_macros::dec;
use rwa_marketplace_core::collaborators::{MockEscrow, MockPayment, MockTokenTransfer, MockTokenizationCollaborator};
use rwa_marketplace_core::config::EngineConfig;
use rwa_marketplace_core::events::EventLog;
use rwa_marketplace_core::lifecycle::{AssetLifecycle, CreateAssetInput, TokenizeInput};
use rwa_marketplace_core::models::{
    AssetType, Bank, DocumentType, InvestorProfile, InvestorType, KycStatus, Role, TransactionStatus, User,
};
use rwa_marketplace_core::store::Store;
use rwa_marketplace_core::transactions::{TransactionEngine, TransactionEngineError};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Scenario {
    store: Arc<Store>,
    engine: TransactionEngine<MockEscrow, MockPayment, MockTokenTransfer>,
    asset_id: Uuid,
}

async fn scenario(listed: bool) -> Scenario {
    let store = Arc::new(Store::new());
    let events = Arc::new(EventLog::new());
    let config = EngineConfig::default();
    let lifecycle = AssetLifecycle::new(
        store.clone(),
        Arc::new(MockTokenizationCollaborator::new()),
        events.clone(),
        config.clone(),
    );
    let bank_id = store
        .atomic(|txn| txn.create_bank(Bank::new("First Bank".to_string(), "FB01".to_string(), None)))
        .unwrap()
        .id();
    let asset = lifecycle
        .create(
            bank_id,
            CreateAssetInput {
                name: "Prop-1".to_string(),
                description: None,
                asset_type: AssetType::RealEstate,
                total_value: dec!(1_000_000),
                total_supply: 10_000,
                price_per_token: None,
            },
        )
        .unwrap();
    lifecycle
        .add_document(asset.id(), DocumentType::Appraisal, "a".into(), "k1".into(), "application/pdf".into(), 1, Uuid::new_v4())
        .unwrap();
    lifecycle
        .add_document(asset.id(), DocumentType::LegalOpinion, "b".into(), "k2".into(), "application/pdf".into(), 1, Uuid::new_v4())
        .unwrap();
    lifecycle.submit_for_review(asset.id()).unwrap();
    lifecycle.approve_for_tokenization(asset.id()).unwrap();
    let cancel = CancellationToken::new();
    lifecycle
        .tokenize(
            asset.id(),
            TokenizeInput {
                symbol: "PR1".to_string(),
                minimum_investment: dec!(1_000),
                maximum_investment: None,
                start_date: None,
                end_date: None,
            },
            &cancel,
        )
        .await
        .unwrap();
    if listed {
        lifecycle.list_on_marketplace(asset.id()).unwrap();
    }

    let engine = TransactionEngine::new(
        store.clone(),
        Arc::new(MockEscrow::new()),
        Arc::new(MockPayment::new()),
        Arc::new(MockTokenTransfer::new()),
        events,
        config,
    );

    Scenario {
        store,
        engine,
        asset_id: asset.id(),
    }
}

fn verified_investor(store: &Store) -> Uuid {
    let mut user = User::new(Role::Investor, Some(format!("{}@example.com", Uuid::new_v4())), None);
    user.set_kyc_status(KycStatus::Verified);
    let user = store.atomic(|txn| txn.create_user(user)).unwrap();
    store
        .atomic(|txn| {
            txn.create_investor_profile(InvestorProfile::new(
                user.id(),
                "Ada".to_string(),
                "Lovelace".to_string(),
                "US".to_string(),
                InvestorType::Individual,
            ))
        })
        .unwrap();
    user.id()
}

#[tokio::test]
async fn happy_path_purchase_reaches_completed() {
    let s = scenario(true).await;
    let buyer = verified_investor(&s.store);
    let cancel = CancellationToken::new();

    let tx = s.engine.create(buyer, s.asset_id, 200).unwrap();
    assert_eq!(tx.amount(), dec!(20_000));
    assert_eq!(tx.status(), TransactionStatus::Pending);

    let tx = s.engine.create_escrow(tx.id(), &cancel).await.unwrap();
    assert_eq!(tx.status(), TransactionStatus::EscrowCreated);
    let tx = s.engine.record_payment(tx.id(), "sig-1".to_string(), &cancel).await.unwrap();
    assert_eq!(tx.status(), TransactionStatus::PaymentReceived);
    let tx = s.engine.transfer_tokens(tx.id(), &cancel).await.unwrap();
    assert_eq!(tx.status(), TransactionStatus::TokensTransferred);
    let tx = s.engine.complete(tx.id(), &cancel).await.unwrap();
    assert_eq!(tx.status(), TransactionStatus::Completed);

    let holding = s
        .store
        .atomic(|txn| {
            let profile = txn.find_investor_profile_by_user(buyer).unwrap();
            Ok(txn.get_holding(profile.id(), s.asset_id))
        })
        .unwrap()
        .unwrap();
    assert_eq!(holding.token_amount(), 200);
}

#[tokio::test]
async fn oversupply_purchase_is_rejected() {
    let s = scenario(true).await;
    let buyer = verified_investor(&s.store);
    let err = s.engine.create(buyer, s.asset_id, 10_001).unwrap_err();
    assert!(matches!(err, TransactionEngineError::InsufficientSupply { available: 10_000, requested: 10_001 }));
}

#[tokio::test]
async fn unverified_buyer_is_rejected() {
    let s = scenario(true).await;
    let user = User::new(Role::Investor, Some("unverified@example.com".to_string()), None);
    let user = s.store.atomic(|txn| txn.create_user(user)).unwrap();
    let err = s.engine.create(user.id(), s.asset_id, 10).unwrap_err();
    assert!(matches!(err, TransactionEngineError::KycRequired));
}

#[tokio::test]
async fn unlisted_asset_cannot_be_purchased() {
    let s = scenario(false).await;
    let buyer = verified_investor(&s.store);
    let err = s.engine.create(buyer, s.asset_id, 10).unwrap_err();
    assert!(matches!(err, TransactionEngineError::NotListed));
}

#[tokio::test]
async fn selling_out_supply_marks_asset_sold_out() {
    let s = scenario(true).await;
    let buyer = verified_investor(&s.store);
    let cancel = CancellationToken::new();

    let tx = s.engine.create(buyer, s.asset_id, 10_000).unwrap();
    let tx = s.engine.create_escrow(tx.id(), &cancel).await.unwrap();
    let tx = s.engine.record_payment(tx.id(), "sig-1".to_string(), &cancel).await.unwrap();
    let tx = s.engine.transfer_tokens(tx.id(), &cancel).await.unwrap();
    s.engine.complete(tx.id(), &cancel).await.unwrap();

    let asset = s.store.atomic(|txn| txn.get_asset(s.asset_id)).unwrap();
    assert_eq!(asset.listing_status(), rwa_marketplace_core::models::ListingStatus::SoldOut);
}

#[tokio::test]
async fn cancel_is_rejected_once_terminal() {
    let s = scenario(true).await;
    let buyer = verified_investor(&s.store);
    let cancel = CancellationToken::new();
    let tx = s.engine.create(buyer, s.asset_id, 10).unwrap();
    s.engine.cancel(tx.id(), "buyer changed mind".to_string(), &cancel).await.unwrap();
    let err = s.engine.cancel(tx.id(), "again".to_string(), &cancel).await;
    assert!(err.is_err());
}
