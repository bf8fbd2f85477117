#![allow(non_snake_case)]

use std::time::Duration;
use tokenmaster_client::{
    client::AppController,
    connector::NetworkIdentity,
    inventory::ScanConfig,
    test_helpers::{FakeOccasionSource, SettlementScript, sample_occasions},
};

fn controller(source: FakeOccasionSource) -> AppController<FakeOccasionSource> {
    AppController::with_source(
        source,
        NetworkIdentity {
            chain_id: 31337,
            name: String::from("Hardhat"),
        },
        Some(String::from("0x1000000000000000000000000000000000000001")),
        ScanConfig {
            read_timeout: Duration::from_millis(200),
            concurrency: 1,
        },
    )
}

#[tokio::test]
async fn refresh__reports_loaded_count_in_status() {
    // given
    let mut app = controller(FakeOccasionSource::new(sample_occasions(4)));

    // when
    app.refresh().await.unwrap();

    // then
    assert_eq!(app.status, "Loaded 4 occasion(s)");
    assert_eq!(app.snapshot().total, 4);
}

#[tokio::test]
async fn refresh__empty_inventory_and_failed_scan_read_differently() {
    // given
    let mut empty = controller(FakeOccasionSource::new(Vec::new()));
    let failing_source = FakeOccasionSource::new(sample_occasions(2));
    failing_source.fail_read_of(1);
    let mut failing = controller(failing_source);

    // when
    empty.refresh().await.unwrap();
    failing.refresh().await.unwrap_err();

    // then
    assert_eq!(empty.status, "No occasions listed");
    assert!(failing.status.starts_with("Failed to load occasions:"));
    assert!(failing.snapshot().loading);
    assert_eq!(failing.recent_errors().len(), 1);
}

#[tokio::test]
async fn buy__success_and_each_failure_mode_read_differently() {
    // given
    let mut app = controller(FakeOccasionSource::new(sample_occasions(2)));
    app.refresh().await.unwrap();

    // when: a clean purchase
    app.buy(1).await.unwrap();
    let success_status = app.status.clone();

    // and: a user rejection
    // (the fake keeps serving reads, so the snapshot stays loaded)
    let rejected_source = FakeOccasionSource::new(sample_occasions(2));
    rejected_source.script_settlement(SettlementScript::RejectSigning(String::from(
        "denied",
    )));
    let mut rejected = controller(rejected_source);
    rejected.refresh().await.unwrap();
    rejected.buy(1).await.unwrap_err();

    // and: a read-only session
    let mut read_only = controller(FakeOccasionSource::read_only(sample_occasions(2)));
    read_only.refresh().await.unwrap();
    read_only.buy(1).await.unwrap_err();

    // then: three distinguishable messages
    assert!(success_status.starts_with("Purchased ticket for occasion 1"));
    assert!(rejected.status.starts_with("Purchase rejected by user:"));
    assert!(read_only.status.contains("read-only"));
}

#[tokio::test]
async fn buy__unknown_occasion_is_rejected_before_submission() {
    // given
    let mut app = controller(FakeOccasionSource::new(sample_occasions(2)));
    app.refresh().await.unwrap();

    // when
    let err = app.buy(9).await.unwrap_err();

    // then
    assert!(err.to_string().contains("not in the loaded inventory"));
}
