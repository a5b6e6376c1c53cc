//! Integration tests for the sync engine against a real SQLite store.
//!
//! Key scenarios covered:
//! - first sync creates everything; re-applying the same snapshot is a no-op
//! - mixed create/update/remove classification and count conservation
//! - dry runs never mutate catalog rows, vendor state, or run history
//! - a failure mid-apply rolls back completely and records a Failed run
//! - overlapping syncs for one vendor fail fast
//! - run history pages most-recent-first with cursor continuation

#![cfg(all(feature = "sqlite", feature = "migrate"))]

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::Set;
use serde_json::{Value, json};
use tokio::sync::Notify;
use uuid::Uuid;

use stockist::entity::catalog_item::ActiveModel as CatalogItemActiveModel;
use stockist::entity::catalog_item::Model as CatalogItemModel;
use stockist::entity::vendor::Model as VendorModel;
use stockist::entity::vendor_state::Model as VendorStateModel;
use stockist::repository::{self, Result as StoreResult, RunDraft, RunOutcome, RunPage, RunQuery};
use stockist::sync::loader::RawCatalogItem;
use stockist::{
    ApplyMeta, CatalogStore, IntegrationKind, RunStatus, SqlCatalogStore, StoreError, SyncEngine,
    SyncError, SyncOptions, connect_and_migrate,
};

/// Maximum time any sync operation should take in tests.
/// If exceeded, there's likely a hang/deadlock.
const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Create an in-memory SQLite store with migrations applied and the test
/// vendor registered with the snapshot strategy.
async fn setup_store(vendor: &str) -> SqlCatalogStore {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("test database should migrate");

    repository::insert_vendor(&db, vendor, "Test Vendor", Some(IntegrationKind::Snapshot))
        .await
        .expect("test vendor should register");

    SqlCatalogStore::new(db)
}

fn write_snapshot(dir: &tempfile::TempDir, items: &Value) -> PathBuf {
    let path = dir.path().join("snapshot.json");
    let mut file = std::fs::File::create(&path).expect("snapshot file should create");
    file.write_all(items.to_string().as_bytes())
        .expect("snapshot file should write");
    path
}

fn apply_options(path: PathBuf) -> SyncOptions {
    SyncOptions {
        dry_run: false,
        source: Some(path),
        actor: "integration-test".to_string(),
        ..SyncOptions::default()
    }
}

fn abc_snapshot() -> Value {
    json!([
        {"external_id": "A", "payload": {"name": "Anvil", "price": 100}},
        {"external_id": "B", "payload": {"name": "Bolt", "price": 5}},
        {"external_id": "C", "payload": {"name": "Crate", "price": 30}},
    ])
}

/// A, B with a changed payload, D new; C omitted.
fn abd_snapshot() -> Value {
    json!([
        {"external_id": "A", "payload": {"name": "Anvil", "price": 100}},
        {"external_id": "B", "payload": {"name": "Bolt", "price": 6}},
        {"external_id": "D", "payload": {"name": "Drill", "price": 80}},
    ])
}

async fn items_of(store: &SqlCatalogStore, vendor: &str) -> Vec<CatalogItemModel> {
    store
        .find_by_vendor(vendor)
        .await
        .expect("catalog read should succeed")
}

// ─── Apply Scenarios ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_sync_creates_everything() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");

    let summary = engine
        .sync("v1", apply_options(write_snapshot(&dir, &abc_snapshot())))
        .await
        .expect("first sync should succeed");

    assert_eq!(summary.total, 3);
    assert_eq!(summary.created, 3);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.unchanged, 0);
    assert_eq!(summary.removed, 0);
    assert_eq!(summary.status, RunStatus::Success);
    assert!(summary.counts_conserved());
    assert!(summary.run_id.is_some());

    let items = items_of(&store, "v1").await;
    let ids: Vec<&str> = items.iter().map(|i| i.external_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C"]);

    // Every stored hash matches its stored payload.
    for item in &items {
        assert_eq!(item.hash, stockist::hash::hash_item(&item.payload));
    }
}

#[tokio::test]
async fn test_reapplying_identical_snapshot_is_idempotent() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_snapshot(&dir, &abc_snapshot());

    let first = engine
        .sync("v1", apply_options(path.clone()))
        .await
        .expect("first sync should succeed");
    let second = engine
        .sync("v1", apply_options(path))
        .await
        .expect("second sync should succeed");

    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.removed, 0);
    assert_eq!(second.unchanged, 3);
    assert_eq!(second.total, 3);

    // The aggregate hash is stable across identical snapshots.
    assert_eq!(first.hash, second.hash);

    let state = store
        .get_state("v1")
        .await
        .expect("state read")
        .expect("state row should exist");
    assert_eq!(state.last_hash, second.hash);
    assert_eq!(state.total_items, 3);
}

#[tokio::test]
async fn test_mixed_snapshot_creates_updates_and_removes() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");

    engine
        .sync("v1", apply_options(write_snapshot(&dir, &abc_snapshot())))
        .await
        .expect("seed sync should succeed");

    let summary = engine
        .sync("v1", apply_options(write_snapshot(&dir, &abd_snapshot())))
        .await
        .expect("second sync should succeed");

    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.total, 3);

    let items = items_of(&store, "v1").await;
    let ids: Vec<&str> = items.iter().map(|i| i.external_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "D"]);

    let b = items.iter().find(|i| i.external_id == "B").expect("B");
    assert_eq!(b.payload["price"], json!(6));
    assert_eq!(b.hash, stockist::hash::hash_item(&b.payload));
}

#[tokio::test]
async fn test_key_order_differences_classify_as_unchanged() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");

    engine
        .sync("v1", apply_options(write_snapshot(&dir, &abc_snapshot())))
        .await
        .expect("seed sync should succeed");

    // Same items, keys written in reverse order.
    let reordered = json!([
        {"external_id": "A", "payload": {"price": 100, "name": "Anvil"}},
        {"external_id": "B", "payload": {"price": 5, "name": "Bolt"}},
        {"external_id": "C", "payload": {"price": 30, "name": "Crate"}},
    ]);
    let summary = engine
        .sync("v1", apply_options(write_snapshot(&dir, &reordered)))
        .await
        .expect("reordered sync should succeed");

    assert_eq!(summary.unchanged, 3);
    assert_eq!(summary.updated, 0);
}

// ─── Dry-Run Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_dry_run_reports_counts_without_mutating_anything() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");

    engine
        .sync("v1", apply_options(write_snapshot(&dir, &abc_snapshot())))
        .await
        .expect("seed sync should succeed");

    let items_before = items_of(&store, "v1").await;
    let state_before: Option<VendorStateModel> =
        store.get_state("v1").await.expect("state read");
    let runs_before = store
        .list_runs(RunQuery::default())
        .await
        .expect("runs read")
        .runs;

    let options = SyncOptions {
        dry_run: true,
        source: Some(write_snapshot(&dir, &abd_snapshot())),
        ..SyncOptions::default()
    };
    let summary = engine.sync("v1", options).await.expect("dry run should succeed");

    // Same counts a real apply would produce.
    assert!(summary.dry_run);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.duration_ms, 0);
    assert!(summary.run_id.is_none());

    // Catalog rows, vendor state, and run history are untouched.
    assert_eq!(items_of(&store, "v1").await, items_before);
    assert_eq!(store.get_state("v1").await.expect("state read"), state_before);
    assert_eq!(
        store
            .list_runs(RunQuery::default())
            .await
            .expect("runs read")
            .runs,
        runs_before
    );
}

#[tokio::test]
async fn test_dry_run_without_any_source_is_a_zero_item_noop() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));

    // No explicit source, no fixtures for this slug: the loader is never
    // invoked and nothing is recorded.
    let summary = engine
        .sync("v1", SyncOptions::default())
        .await
        .expect("no-source dry run should succeed");

    assert!(summary.dry_run);
    assert_eq!(summary.total, 0);
    assert!(summary.source.is_none());
    assert!(summary.run_id.is_none());

    let runs = store
        .list_runs(RunQuery::default())
        .await
        .expect("runs read")
        .runs;
    assert!(runs.is_empty());
}

#[tokio::test]
async fn test_apply_without_any_source_is_a_load_error() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));

    let err = engine
        .sync("v1", SyncOptions::apply_as("integration-test"))
        .await
        .expect_err("apply with no source should fail");
    assert!(matches!(err, SyncError::Load(_)));

    // Load failures happen before any run is opened: no audit pollution.
    let runs = store
        .list_runs(RunQuery::default())
        .await
        .expect("runs read")
        .runs;
    assert!(runs.is_empty());
}

#[tokio::test]
async fn test_demo_vendor_dry_run_uses_bundled_catalog() {
    let store = setup_store("demo").await;
    let engine = SyncEngine::new(Arc::new(store));

    let summary = engine
        .sync("demo", SyncOptions::default())
        .await
        .expect("demo dry run should succeed");

    assert!(summary.dry_run);
    assert!(summary.total > 0);
    assert_eq!(summary.source.as_deref(), Some("bundled:demo-catalog"));
}

// ─── Failure Scenarios ───────────────────────────────────────────────────────

/// Store decorator that runs the creates and updates of an apply inside a
/// real transaction, then fails before the delete sub-step. The rollback
/// must leave no trace of the attempt.
struct DeleteFailsStore {
    inner: SqlCatalogStore,
}

#[async_trait]
impl CatalogStore for DeleteFailsStore {
    async fn find_vendor(&self, slug: &str) -> StoreResult<Option<VendorModel>> {
        self.inner.find_vendor(slug).await
    }

    async fn find_by_vendor(&self, vendor: &str) -> StoreResult<Vec<CatalogItemModel>> {
        self.inner.find_by_vendor(vendor).await
    }

    async fn apply_diff(&self, meta: &ApplyMeta, diff: &stockist::diff::CatalogDiff) -> StoreResult<()> {
        use sea_orm::{TransactionError, TransactionTrait};

        let now = meta.run_at.fixed_offset();
        let creates: Vec<CatalogItemActiveModel> = diff
            .creates
            .iter()
            .map(|item| CatalogItemActiveModel {
                id: Set(Uuid::new_v4()),
                vendor: Set(meta.vendor.clone()),
                external_id: Set(item.external_id.clone()),
                payload: Set(item.payload.clone()),
                hash: Set(item.hash.clone()),
                first_seen_at: Set(now),
                synced_at: Set(now),
            })
            .collect();
        let updates = diff.updates.clone();

        self.inner
            .connection()
            .transaction::<_, (), StoreError>(move |txn| {
                Box::pin(async move {
                    repository::insert_chunked(txn, creates).await?;
                    for update in updates {
                        repository::update_content(txn, update.id, update.payload, update.hash, now)
                            .await?;
                    }
                    // The delete sub-step blows up; everything above must
                    // roll back with it.
                    Err(StoreError::Database(sea_orm::DbErr::Custom(
                        "forced delete failure".to_string(),
                    )))
                })
            })
            .await
            .map_err(|err| match err {
                TransactionError::Connection(db_err) => StoreError::Database(db_err),
                TransactionError::Transaction(store_err) => store_err,
            })
    }

    async fn record_duration(&self, vendor: &str, duration_ms: i64) -> StoreResult<()> {
        self.inner.record_duration(vendor, duration_ms).await
    }

    async fn record_failure(&self, vendor: &str, error: &str) -> StoreResult<()> {
        self.inner.record_failure(vendor, error).await
    }

    async fn create_run(&self, draft: RunDraft) -> StoreResult<Uuid> {
        self.inner.create_run(draft).await
    }

    async fn finalize_run(&self, run_id: Uuid, outcome: RunOutcome) -> StoreResult<()> {
        self.inner.finalize_run(run_id, outcome).await
    }

    async fn get_state(&self, vendor: &str) -> StoreResult<Option<VendorStateModel>> {
        self.inner.get_state(vendor).await
    }

    async fn list_runs(&self, query: RunQuery) -> StoreResult<RunPage> {
        self.inner.list_runs(query).await
    }
}

#[tokio::test]
async fn test_failed_apply_rolls_back_and_records_failed_run() {
    let sql_store = setup_store("v1").await;
    let dir = tempfile::tempdir().expect("tempdir");

    // Seed A,B,C through the real store.
    SyncEngine::new(Arc::new(sql_store.clone()))
        .sync("v1", apply_options(write_snapshot(&dir, &abc_snapshot())))
        .await
        .expect("seed sync should succeed");
    let items_before = items_of(&sql_store, "v1").await;

    // Re-sync with the mixed snapshot through a store whose delete step fails.
    let failing = SyncEngine::new(Arc::new(DeleteFailsStore {
        inner: sql_store.clone(),
    }));
    let err = failing
        .sync("v1", apply_options(write_snapshot(&dir, &abd_snapshot())))
        .await
        .expect_err("forced failure should propagate");
    assert!(matches!(err, SyncError::Store(_)));

    // No partial progress: the store still holds exactly A,B,C.
    assert_eq!(items_of(&sql_store, "v1").await, items_before);

    // One Failed run exists with a non-empty error.
    let runs = sql_store
        .list_runs(RunQuery {
            status: Some(RunStatus::Failed),
            ..RunQuery::default()
        })
        .await
        .expect("runs read")
        .runs;
    assert_eq!(runs.len(), 1);
    let failed = &runs[0];
    assert_eq!(failed.status, RunStatus::Failed);
    assert!(
        failed
            .error
            .as_deref()
            .is_some_and(|message| message.contains("forced delete failure"))
    );
    assert!(failed.finished_at.is_some());

    // The failure is visible on the state row, but the committed state
    // itself still reflects the seed apply.
    let state = sql_store
        .get_state("v1")
        .await
        .expect("state read")
        .expect("state row");
    assert_eq!(state.total_items, 3);
    assert!(state.last_error.is_some());
}

/// Store decorator that parks inside apply until released, to hold a
/// vendor's lease across a second invocation.
struct BlockingStore {
    inner: SqlCatalogStore,
    release: Arc<Notify>,
    entered: Arc<Notify>,
}

#[async_trait]
impl CatalogStore for BlockingStore {
    async fn find_vendor(&self, slug: &str) -> StoreResult<Option<VendorModel>> {
        self.inner.find_vendor(slug).await
    }

    async fn find_by_vendor(&self, vendor: &str) -> StoreResult<Vec<CatalogItemModel>> {
        self.inner.find_by_vendor(vendor).await
    }

    async fn apply_diff(&self, meta: &ApplyMeta, diff: &stockist::diff::CatalogDiff) -> StoreResult<()> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.apply_diff(meta, diff).await
    }

    async fn record_duration(&self, vendor: &str, duration_ms: i64) -> StoreResult<()> {
        self.inner.record_duration(vendor, duration_ms).await
    }

    async fn record_failure(&self, vendor: &str, error: &str) -> StoreResult<()> {
        self.inner.record_failure(vendor, error).await
    }

    async fn create_run(&self, draft: RunDraft) -> StoreResult<Uuid> {
        self.inner.create_run(draft).await
    }

    async fn finalize_run(&self, run_id: Uuid, outcome: RunOutcome) -> StoreResult<()> {
        self.inner.finalize_run(run_id, outcome).await
    }

    async fn get_state(&self, vendor: &str) -> StoreResult<Option<VendorStateModel>> {
        self.inner.get_state(vendor).await
    }

    async fn list_runs(&self, query: RunQuery) -> StoreResult<RunPage> {
        self.inner.list_runs(query).await
    }
}

#[tokio::test]
async fn test_overlapping_sync_for_same_vendor_fails_fast() {
    let sql_store = setup_store("v1").await;
    let release = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());
    let engine = SyncEngine::new(Arc::new(BlockingStore {
        inner: sql_store,
        release: Arc::clone(&release),
        entered: Arc::clone(&entered),
    }));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_snapshot(&dir, &abc_snapshot());

    let first_engine = engine.clone();
    let first_path = path.clone();
    let first = tokio::spawn(async move {
        first_engine
            .sync("v1", apply_options(first_path))
            .await
            .expect("first sync should eventually succeed")
    });

    // Wait until the first sync holds the lease inside apply.
    tokio::time::timeout(SYNC_TIMEOUT, entered.notified())
        .await
        .expect("first sync should reach apply");

    let err = engine
        .sync("v1", apply_options(path))
        .await
        .expect_err("second sync must fail fast");
    assert!(matches!(err, SyncError::SyncInFlight { .. }));

    release.notify_one();
    let summary = tokio::time::timeout(SYNC_TIMEOUT, first)
        .await
        .expect("first sync should finish")
        .expect("first sync task should not panic");
    assert_eq!(summary.created, 3);
}

#[tokio::test]
async fn test_apply_timeout_finalizes_run_as_failed() {
    let sql_store = setup_store("v1").await;
    let release = Arc::new(Notify::new());
    let entered = Arc::new(Notify::new());
    let engine = SyncEngine::new(Arc::new(BlockingStore {
        inner: sql_store.clone(),
        release,
        entered,
    }));

    let dir = tempfile::tempdir().expect("tempdir");
    let mut options = apply_options(write_snapshot(&dir, &abc_snapshot()));
    options.apply_timeout = Duration::from_millis(50);

    let err = tokio::time::timeout(SYNC_TIMEOUT, engine.sync("v1", options))
        .await
        .expect("timed-out sync must not hang")
        .expect_err("stuck apply should time out");
    assert!(matches!(err, SyncError::ApplyTimeout { .. }));

    // No dangling Pending run: the open run was finalized as Failed.
    let runs = sql_store
        .list_runs(RunQuery::default())
        .await
        .expect("runs read")
        .runs;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert!(runs[0].error.is_some());

    // The transaction never committed: the catalog is still empty.
    assert!(items_of(&sql_store, "v1").await.is_empty());
}

// ─── Run History ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_run_history_pages_most_recent_first() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");

    for round in 0..5 {
        let snapshot = json!([
            {"external_id": "A", "payload": {"round": round}},
        ]);
        engine
            .sync("v1", apply_options(write_snapshot(&dir, &snapshot)))
            .await
            .expect("sync should succeed");
    }

    let first_page = store
        .list_runs(RunQuery {
            vendor: Some("v1".to_string()),
            limit: 2,
            ..RunQuery::default()
        })
        .await
        .expect("first page should load");
    assert_eq!(first_page.runs.len(), 2);
    let next_cursor = first_page.next_cursor.expect("more pages should exist");

    let second_page = store
        .list_runs(RunQuery {
            vendor: Some("v1".to_string()),
            limit: 2,
            cursor: Some(next_cursor),
            ..RunQuery::default()
        })
        .await
        .expect("second page should load");
    assert_eq!(second_page.runs.len(), 2);

    // Pages are disjoint and ordered most-recent-first.
    let mut seen: Vec<Uuid> = Vec::new();
    for run in first_page.runs.iter().chain(second_page.runs.iter()) {
        assert!(!seen.contains(&run.id));
        seen.push(run.id);
    }
    for pair in first_page
        .runs
        .iter()
        .chain(second_page.runs.iter())
        .collect::<Vec<_>>()
        .windows(2)
    {
        assert!(pair[0].started_at >= pair[1].started_at);
    }

    // Every recorded run conserves its counts.
    let all = store
        .list_runs(RunQuery::default())
        .await
        .expect("full listing should load");
    assert_eq!(all.runs.len(), 5);
    for run in &all.runs {
        assert!(run.counts_conserved());
        assert_eq!(run.actor, "integration-test");
        assert_eq!(run.status, RunStatus::Success);
    }
}

#[tokio::test]
async fn test_run_records_capture_provenance() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_snapshot(&dir, &abc_snapshot());

    let summary = engine
        .sync("v1", apply_options(path.clone()))
        .await
        .expect("sync should succeed");

    let run_id = summary.run_id.expect("run should be recorded");
    let run = repository::find_run_by_id(store.connection(), run_id)
        .await
        .expect("run read")
        .expect("run row should exist");

    assert_eq!(run.vendor, "v1");
    assert_eq!(run.source, format!("file:{}", path.display()));
    assert_eq!(run.aggregate_hash, summary.hash);
    assert_eq!(run.total_items, 3);
    assert!(!run.dry_run);
    assert!(run.duration_ms.is_some());
}

// ─── Injection ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_injected_preview_diffs_against_real_state() {
    let store = setup_store("v1").await;
    let engine = SyncEngine::new(Arc::new(store.clone()));
    let dir = tempfile::tempdir().expect("tempdir");

    engine
        .sync("v1", apply_options(write_snapshot(&dir, &abc_snapshot())))
        .await
        .expect("seed sync should succeed");

    let options = SyncOptions {
        inject: Some(vec![
            RawCatalogItem {
                external_id: "A".to_string(),
                payload: json!({"name": "Anvil", "price": 100}),
            },
            RawCatalogItem {
                external_id: "Z".to_string(),
                payload: json!({"name": "Zipline", "price": 400}),
            },
        ]),
        ..SyncOptions::default()
    };
    let summary = engine
        .sync("v1", options)
        .await
        .expect("injected preview should succeed");

    assert!(summary.dry_run);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.removed, 2);

    // The preview changed nothing.
    assert_eq!(items_of(&store, "v1").await.len(), 3);
}
