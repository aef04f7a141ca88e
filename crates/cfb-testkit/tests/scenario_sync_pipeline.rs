//! Scenario: fetch → build → merge → reconcile for one category.
//!
//! # Invariants under test
//! - One failing provider does not stop the others; its failure is reported.
//! - When every provider comes back empty, the pass is skipped and stored
//!   state survives untouched.
//! - Invalid raw records are dropped at the boundary and counted.
//! - Snapshot files on disk flow through to stored, merged records.

use std::fs;

use cfb_md::{Provider, SnapshotProvider};
use cfb_reconcile::{sync_category, MergePolicy, SyncOutcome};
use cfb_schemas::{Category, Direction, RecordDetails};
use cfb_testkit::{
    id_of, raw_portal, raw_recruit, recruit, InMemoryStore, RecordingSink, StaticProvider,
};

#[tokio::test]
async fn failing_provider_is_isolated() {
    let providers = vec![
        StaticProvider::failing("on3", "connection reset").boxed(),
        StaticProvider::new("247", vec![raw_recruit("John Smith", Some(4), Some("committed"))])
            .boxed(),
    ];
    let store = InMemoryStore::new();
    let sink = RecordingSink::new();

    let report = sync_category(
        Category::Recruits,
        &providers,
        &MergePolicy::default(),
        &store,
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.merged, 1);
    assert_eq!(report.provider_failures.len(), 1);
    assert_eq!(report.provider_failures[0].tag, "on3");
    assert!(report.provider_failures[0]
        .error
        .to_string()
        .contains("connection reset"));
    match report.outcome {
        SyncOutcome::Reconciled(res) => assert_eq!(res.upserted, 1),
        SyncOutcome::Skipped => panic!("expected a reconcile pass"),
    }
    assert!(store.get(Category::Recruits, &id_of("John Smith")).is_some());
}

#[tokio::test]
async fn total_outage_skips_and_preserves_state() {
    let store = InMemoryStore::new();
    store.seed(
        Category::Recruits,
        vec![recruit("Stored Guy", Some("committed"), "247")],
    );
    let sink = RecordingSink::new();
    let providers = vec![
        StaticProvider::failing("247", "timeout").boxed(),
        StaticProvider::new("on3", vec![]).boxed(),
    ];

    let report = sync_category(
        Category::Recruits,
        &providers,
        &MergePolicy::default(),
        &store,
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(report.outcome, SyncOutcome::Skipped);
    assert_eq!(report.merged, 0);
    assert!(store.calls().is_empty(), "store must not be touched");
    assert!(sink.attempts().is_empty());
    assert_eq!(store.snapshot(Category::Recruits).len(), 1);
}

#[tokio::test]
async fn invalid_raw_records_are_rejected_and_counted() {
    let providers = vec![StaticProvider::new(
        "247",
        vec![
            raw_recruit("Too Many", Some(6), None),
            raw_recruit("Just Right", Some(5), None),
        ],
    )
    .boxed()];
    let store = InMemoryStore::new();

    let report = sync_category(
        Category::Recruits,
        &providers,
        &MergePolicy::default(),
        &store,
        &RecordingSink::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.rejected, 1);
    assert_eq!(report.fetched, 1);
    assert!(store.get(Category::Recruits, &id_of("Just Right")).is_some());
    assert!(store.get(Category::Recruits, &id_of("Too Many")).is_none());
}

#[tokio::test]
async fn provider_only_serves_requested_category() {
    let providers = vec![StaticProvider::new(
        "on3",
        vec![
            raw_recruit("Recruit Only", None, None),
            raw_portal("Portal Only", Direction::Incoming, Some("entered")),
        ],
    )
    .boxed()];
    let store = InMemoryStore::new();

    let report = sync_category(
        Category::Portal,
        &providers,
        &MergePolicy::default(),
        &store,
        &RecordingSink::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.merged, 1);
    assert!(store.snapshot(Category::Recruits).is_empty());
    assert_eq!(
        store.snapshot(Category::Portal)[0].id,
        id_of("Portal Only")
    );
}

#[tokio::test]
async fn snapshot_files_merge_under_authority() {
    let dir_247 = tempfile::tempdir().unwrap();
    let dir_on3 = tempfile::tempdir().unwrap();

    fs::write(
        dir_247.path().join("recruits.json"),
        r#"[{"name": "John Smith", "position": "Quarterback", "stars": null, "status": "committed"}]"#,
    )
    .unwrap();
    fs::write(
        dir_on3.path().join("recruits.json"),
        r#"[
            {"name": "JOHN SMITH JR.", "position": "ATH", "stars": 4, "hometown": "Tampa, FL", "status": "uncommitted"},
            {"name": "Other Person", "position": "s"}
        ]"#,
    )
    .unwrap();

    let providers: Vec<Box<dyn Provider>> = vec![
        Box::new(SnapshotProvider::new("on3", dir_on3.path())),
        Box::new(SnapshotProvider::new("247", dir_247.path())),
    ];
    let store = InMemoryStore::new();
    let sink = RecordingSink::new();

    let report = sync_category(
        Category::Recruits,
        &providers,
        &MergePolicy::default(),
        &store,
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.merged, 2);
    assert!(report.provider_failures.is_empty());

    let smith = store.get(Category::Recruits, &id_of("John Smith")).unwrap();
    assert_eq!(smith.name, "JOHN SMITH JR.", "first-seen display name kept");
    assert_eq!(smith.status.as_deref(), Some("committed"));
    assert_eq!(smith.position, "qb");
    assert_eq!(smith.source, "247,on3");
    assert_eq!(
        smith.details,
        RecordDetails::Recruit {
            hometown: Some("Tampa, FL".to_string()),
            stars: Some(4),
            rating: None,
        }
    );

    let other = store.get(Category::Recruits, &id_of("Other Person")).unwrap();
    assert_eq!(other.position, "s");
    assert_eq!(sink.accepted_types(), vec!["new_player", "new_player"]);
}

#[tokio::test]
async fn missing_snapshot_file_is_a_provider_failure() {
    let empty_dir = tempfile::tempdir().unwrap();
    let providers: Vec<Box<dyn Provider>> =
        vec![Box::new(SnapshotProvider::new("247", empty_dir.path()))];
    let store = InMemoryStore::new();

    let report = sync_category(
        Category::Portal,
        &providers,
        &MergePolicy::default(),
        &store,
        &RecordingSink::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.outcome, SyncOutcome::Skipped);
    assert_eq!(report.provider_failures.len(), 1);
    assert_eq!(report.provider_failures[0].tag, "247");
}
