//! Integration tests for `Scheduler`.
use chrono::Utc;
use rust_decimal_macros::dec;
use rwa_marketplace_core::models::{Auction, AuctionStatus};
use rwa_marketplace_core::scheduler::Scheduler;
use rwa_marketplace_core::store::Store;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[test]
fn tick_activates_and_then_ends_a_single_auction_over_two_ticks() {
    let store = Arc::new(Store::new());
    let now = Utc::now();
    let asset_id = Uuid::new_v4();
    let auction = store
        .atomic(|txn| {
            txn.create_auction(Auction::new(
                asset_id,
                dec!(100),
                10,
                now - chrono::Duration::seconds(1),
                now - chrono::Duration::milliseconds(500),
                now - chrono::Duration::minutes(10),
            ))
        })
        .unwrap();
    assert_eq!(auction.status(), AuctionStatus::Scheduled);

    let scheduler = Scheduler::new(store.clone(), Duration::from_secs(30));

    let first = scheduler.tick_once();
    assert_eq!(first.activated, vec![auction.id()]);
    let refreshed = store.atomic(|txn| txn.get_auction(auction.id())).unwrap();
    assert_eq!(refreshed.status(), AuctionStatus::Active);

    let second = scheduler.tick_once();
    assert_eq!(second.ended, vec![auction.id()]);
    let refreshed = store.atomic(|txn| txn.get_auction(auction.id())).unwrap();
    assert_eq!(refreshed.status(), AuctionStatus::Ended);
}

#[test]
fn tick_leaves_unrelated_auctions_alone() {
    let store = Arc::new(Store::new());
    let now = Utc::now();
    let asset_id = Uuid::new_v4();
    let not_yet_due = store
        .atomic(|txn| {
            txn.create_auction(Auction::new(
                asset_id,
                dec!(100),
                10,
                now + chrono::Duration::hours(1),
                now + chrono::Duration::hours(3),
                now,
            ))
        })
        .unwrap();

    let scheduler = Scheduler::new(store.clone(), Duration::from_secs(30));
    let report = scheduler.tick_once();
    assert!(report.activated.is_empty());
    assert!(report.ended.is_empty());

    let refreshed = store.atomic(|txn| txn.get_auction(not_yet_due.id())).unwrap();
    assert_eq!(refreshed.status(), AuctionStatus::Scheduled);
}

#[test]
fn repeated_ticks_do_not_double_report_the_same_transition() {
    let store = Arc::new(Store::new());
    let now = Utc::now();
    let asset_id = Uuid::new_v4();
    store
        .atomic(|txn| {
            txn.create_auction(Auction::new(
                asset_id,
                dec!(100),
                10,
                now - chrono::Duration::hours(2),
                now - chrono::Duration::seconds(1),
                now - chrono::Duration::hours(3),
            ))
        })
        .unwrap();

    let scheduler = Scheduler::new(store.clone(), Duration::from_secs(30));
    let first = scheduler.tick_once();
    let second = scheduler.tick_once();
    assert_eq!(first.ended.len(), 1);
    assert_eq!(second.ended.len(), 0);
}
