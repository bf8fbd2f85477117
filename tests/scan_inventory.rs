#![allow(non_snake_case)]

use proptest::prelude::*;
use std::time::Duration;
use tokenmaster_client::{
    SyncError,
    inventory::{ScanConfig, SnapshotStore, scan_all},
    test_helpers::{FakeOccasionSource, sample_occasions},
};

fn quick_config() -> ScanConfig {
    ScanConfig {
        read_timeout: Duration::from_millis(200),
        concurrency: 1,
    }
}

#[tokio::test]
async fn scan_all__materializes_every_occasion_in_id_order() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(5));
    let store = SnapshotStore::new();

    // when
    let snapshot = scan_all(&source, &store, &quick_config()).await.unwrap();

    // then
    assert_eq!(snapshot.total, 5);
    assert_eq!(snapshot.occasions.len(), 5);
    for (i, occasion) in snapshot.occasions.iter().enumerate() {
        assert_eq!(occasion.id, i as u64 + 1);
    }
    assert!(!snapshot.loading);
    assert_eq!(store.current(), snapshot);
}

#[tokio::test]
async fn scan_all__zero_occasions_is_a_clean_empty_inventory() {
    // given
    let source = FakeOccasionSource::new(Vec::new());
    let store = SnapshotStore::new();

    // when
    let snapshot = scan_all(&source, &store, &quick_config()).await.unwrap();

    // then: "loaded, zero results" is not "failed to load"
    assert_eq!(snapshot.total, 0);
    assert!(snapshot.occasions.is_empty());
    assert!(!snapshot.loading);
    assert!(store.current().is_empty_inventory());
}

#[tokio::test]
async fn scan_all__count_read_failure_surfaces_without_a_scan() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(3));
    source.fail_count_read();
    let store = SnapshotStore::new();

    // when
    let err = scan_all(&source, &store, &quick_config()).await.unwrap_err();

    // then
    assert!(matches!(err, SyncError::ReadFailed { id: None, .. }));
    assert_eq!(source.occasion_reads(), 0);
    assert!(store.current().loading);
}

#[tokio::test]
async fn scan_all__mid_scan_failure_publishes_no_partial_list() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(3));
    source.fail_read_of(2);
    let store = SnapshotStore::new();

    // when
    let err = scan_all(&source, &store, &quick_config()).await.unwrap_err();

    // then: the failing id is named, partial results are discarded
    match err {
        SyncError::ReadFailed { id, .. } => assert_eq!(id, Some(2)),
        other => panic!("unexpected error: {other:?}"),
    }
    let current = store.current();
    assert!(current.occasions.is_empty());
    assert!(current.loading);
}

#[tokio::test]
async fn scan_all__mismatched_record_id_aborts_the_scan() {
    // given: the record served for id 2 claims a different id
    let source = FakeOccasionSource::new(sample_occasions(3));
    source.misreport_read_of(2);
    let store = SnapshotStore::new();

    // when
    let err = scan_all(&source, &store, &quick_config()).await.unwrap_err();

    // then
    match err {
        SyncError::PartialScanAborted { id, total, .. } => {
            assert_eq!(id, 2);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.current().loading);
}

#[tokio::test]
async fn scan_all__failed_rescan_preserves_the_previous_snapshot() {
    // given: one clean scan published
    let source = FakeOccasionSource::new(sample_occasions(3));
    let store = SnapshotStore::new();
    let first = scan_all(&source, &store, &quick_config()).await.unwrap();

    // when: occasion 2 starts failing and the inventory is rescanned
    source.fail_read_of(2);
    let err = scan_all(&source, &store, &quick_config()).await.unwrap_err();

    // then: caller is told, previous occasions stay visible, loading is set
    assert!(matches!(err, SyncError::ReadFailed { id: Some(2), .. }));
    let current = store.current();
    assert_eq!(current.occasions, first.occasions);
    assert!(current.loading);
}

#[tokio::test]
async fn scan_all__is_retryable_after_a_failed_read() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(4));
    let store = SnapshotStore::new();
    source.fail_read_of(3);
    scan_all(&source, &store, &quick_config()).await.unwrap_err();

    // when
    source.clear_read_failures();
    let snapshot = scan_all(&source, &store, &quick_config()).await.unwrap();

    // then
    assert_eq!(snapshot.occasions.len(), 4);
    assert!(!store.current().loading);
}

#[tokio::test]
async fn scan_all__hung_read_times_out_instead_of_wedging_loading() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(2));
    source.hang_read_of(2);
    let store = SnapshotStore::new();
    let config = ScanConfig {
        read_timeout: Duration::from_millis(50),
        concurrency: 1,
    };

    // when
    let err = scan_all(&source, &store, &config).await.unwrap_err();

    // then
    assert!(matches!(err, SyncError::Timeout { id: 2, .. }));
    assert!(store.current().loading);
}

#[tokio::test]
async fn scan_all__reads_the_count_exactly_once_per_scan() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(6));
    let store = SnapshotStore::new();

    // when
    scan_all(&source, &store, &quick_config()).await.unwrap();
    scan_all(&source, &store, &quick_config()).await.unwrap();

    // then
    assert_eq!(source.count_reads(), 2);
    assert_eq!(source.occasion_reads(), 12);
}

#[tokio::test]
async fn scan_all__twice_with_no_chain_mutation_is_idempotent() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(7));
    let store = SnapshotStore::new();

    // when
    let first = scan_all(&source, &store, &quick_config()).await.unwrap();
    let second = scan_all(&source, &store, &quick_config()).await.unwrap();

    // then: every field of every entry matches
    assert_eq!(first, second);
}

#[tokio::test]
async fn scan_all__concurrent_reads_still_emit_in_id_order() {
    // given
    let source = FakeOccasionSource::new(sample_occasions(12));
    let store = SnapshotStore::new();
    let config = ScanConfig {
        read_timeout: Duration::from_millis(200),
        concurrency: 4,
    };

    // when
    let snapshot = scan_all(&source, &store, &config).await.unwrap();

    // then
    let ids: Vec<u64> = snapshot.occasions.iter().map(|o| o.id).collect();
    assert_eq!(ids, (1..=12).collect::<Vec<u64>>());
}

proptest! {
    #[test]
    fn scan_shape_holds_for_any_inventory_size(n in 0u64..40) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let source = FakeOccasionSource::new(sample_occasions(n));
            let store = SnapshotStore::new();
            let snapshot = scan_all(&source, &store, &quick_config()).await.unwrap();
            prop_assert_eq!(snapshot.occasions.len() as u64, n);
            prop_assert_eq!(snapshot.total, n);
            for (i, occasion) in snapshot.occasions.iter().enumerate() {
                prop_assert_eq!(occasion.id, i as u64 + 1);
            }
            Ok(())
        })?;
    }
}
