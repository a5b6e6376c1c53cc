//! The persistence port for the sync engine.
//!
//! [`CatalogStore`] is the explicit contract between the engine and the
//! persisted store. Production code uses [`SqlCatalogStore`]; tests can
//! substitute any implementation (the integration suite wraps the SQL store
//! in failure-injecting decorators). The engine receives a store instance
//! by injection and never reaches for a shared global handle.
//!
//! The write surface is the single atomic [`CatalogStore::apply_diff`]:
//! creates, updates, deletes, and the vendor-state upsert commit or roll
//! back together. Finer-grained operations live in [`crate::repository`]
//! and are composed inside the transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionError, TransactionTrait};
use uuid::Uuid;

use crate::diff::CatalogDiff;
use crate::entity::catalog_item::{
    ActiveModel as CatalogItemActiveModel, Model as CatalogItemModel,
};
use crate::entity::vendor::Model as VendorModel;
use crate::entity::vendor_state::Model as VendorStateModel;
use crate::repository::{
    self, Result, RunDraft, RunOutcome, RunPage, RunQuery, StoreError,
};

/// Snapshot provenance recorded alongside an apply.
#[derive(Debug, Clone)]
pub struct ApplyMeta {
    /// Vendor slug being reconciled.
    pub vendor: String,
    /// Aggregate digest of the incoming snapshot.
    pub aggregate_hash: String,
    /// Source descriptor of the snapshot.
    pub source: String,
    /// Audit attribution.
    pub actor: String,
    /// Number of items in the incoming snapshot.
    pub total_items: i32,
    /// When the sync started.
    pub run_at: DateTime<Utc>,
}

/// Persistence contract consumed by the sync engine.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Resolve a vendor from the registry by slug.
    async fn find_vendor(&self, slug: &str) -> Result<Option<VendorModel>>;

    /// Read all persisted catalog items for a vendor.
    async fn find_by_vendor(&self, vendor: &str) -> Result<Vec<CatalogItemModel>>;

    /// Apply a diff atomically: creates, updates, deletes, and the
    /// vendor-state upsert all commit or roll back together. On error the
    /// store is exactly as it was before the call.
    async fn apply_diff(&self, meta: &ApplyMeta, diff: &CatalogDiff) -> Result<()>;

    /// Record the apply's wall-clock cost on the vendor state row
    /// (follow-up update after commit).
    async fn record_duration(&self, vendor: &str, duration_ms: i64) -> Result<()>;

    /// Record a failed apply's error on the vendor state row, if one exists.
    async fn record_failure(&self, vendor: &str, error: &str) -> Result<()>;

    /// Open a Pending audit run.
    async fn create_run(&self, draft: RunDraft) -> Result<Uuid>;

    /// Finalize a Pending run exactly once.
    async fn finalize_run(&self, run_id: Uuid, outcome: RunOutcome) -> Result<()>;

    /// Read the latest committed sync state for a vendor.
    async fn get_state(&self, vendor: &str) -> Result<Option<VendorStateModel>>;

    /// List run history, most recent first, with cursor continuation.
    async fn list_runs(&self, query: RunQuery) -> Result<RunPage>;
}

/// Production [`CatalogStore`] backed by a sea-orm connection.
#[derive(Clone)]
pub struct SqlCatalogStore {
    db: Arc<DatabaseConnection>,
}

impl SqlCatalogStore {
    /// Wrap a database connection.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Wrap an already-shared database connection.
    pub fn from_shared(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Borrow the underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn find_vendor(&self, slug: &str) -> Result<Option<VendorModel>> {
        repository::find_by_slug(self.connection(), slug).await
    }

    async fn find_by_vendor(&self, vendor: &str) -> Result<Vec<CatalogItemModel>> {
        repository::find_by_vendor(self.connection(), vendor).await
    }

    async fn apply_diff(&self, meta: &ApplyMeta, diff: &CatalogDiff) -> Result<()> {
        use sea_orm::Set;

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
        let removed_ids: Vec<String> = diff
            .removes
            .iter()
            .map(|entry| entry.external_id.clone())
            .collect();
        let meta = meta.clone();

        self.db
            .transaction::<_, (), StoreError>(move |txn| {
                Box::pin(async move {
                    repository::insert_chunked(txn, creates).await?;
                    for update in updates {
                        repository::update_content(
                            txn,
                            update.id,
                            update.payload,
                            update.hash,
                            now,
                        )
                        .await?;
                    }
                    repository::delete_by_external_ids(txn, &meta.vendor, &removed_ids).await?;
                    repository::upsert_state(
                        txn,
                        &meta.vendor,
                        meta.run_at,
                        &meta.aggregate_hash,
                        &meta.source,
                        &meta.actor,
                        meta.total_items,
                    )
                    .await?;
                    Ok(())
                })
            })
            .await
            .map_err(|err| match err {
                TransactionError::Connection(db_err) => StoreError::Database(db_err),
                TransactionError::Transaction(store_err) => store_err,
            })
    }

    async fn record_duration(&self, vendor: &str, duration_ms: i64) -> Result<()> {
        repository::record_duration(self.connection(), vendor, duration_ms).await
    }

    async fn record_failure(&self, vendor: &str, error: &str) -> Result<()> {
        repository::record_failure(self.connection(), vendor, error).await
    }

    async fn create_run(&self, draft: RunDraft) -> Result<Uuid> {
        repository::insert_run(self.connection(), draft).await
    }

    async fn finalize_run(&self, run_id: Uuid, outcome: RunOutcome) -> Result<()> {
        repository::finalize_run(self.connection(), run_id, outcome).await
    }

    async fn get_state(&self, vendor: &str) -> Result<Option<VendorStateModel>> {
        repository::get_state(self.connection(), vendor).await
    }

    async fn list_runs(&self, query: RunQuery) -> Result<RunPage> {
        repository::list_runs(self.connection(), query).await
    }
}
