//! The sync dispatcher.
//!
//! [`SyncEngine`] orchestrates one sync invocation end to end: resolve the
//! vendor's strategy, take the per-vendor lease, load and hash the incoming
//! snapshot, diff it against the persisted records, open an audit run,
//! apply the diff atomically, finalize the run, and return a summary.
//!
//! Dry runs compute the full diff and summary but never write: no catalog
//! mutation, no state upsert, and no audit run - one rule on every dry-run
//! path, including injection and the no-source early exit.

mod apply;
mod record;

use std::sync::Arc;

use chrono::Utc;

use crate::diff::{self, HashedItem};
use crate::entity::integration_kind::IntegrationKind;
use crate::entity::run_status::RunStatus;
use crate::hash;
use crate::repository::{RunDraft, RunOutcome};
use crate::store::{ApplyMeta, CatalogStore};
use crate::sync::error::SyncError;
use crate::sync::guard::VendorGuard;
use crate::sync::loader::{self, RawCatalogItem};
use crate::sync::types::{SyncOptions, SyncSummary};

/// Sync dispatcher holding the injected store and the per-vendor guard.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn CatalogStore>,
    guard: VendorGuard,
}

impl SyncEngine {
    /// Create an engine over the given store.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            guard: VendorGuard::new(),
        }
    }

    /// Borrow the injected store (for read-only consumers sharing it).
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Synchronize one vendor's catalog.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotConfigured`] / [`SyncError::UnsupportedIntegration`]
    ///   for registry resolution failures; nothing was read or written.
    /// - [`SyncError::Load`] when no snapshot source succeeds; no run was
    ///   opened, safe to retry immediately.
    /// - [`SyncError::SyncInFlight`] when another sync holds the vendor's
    ///   lease.
    /// - [`SyncError::Store`] / [`SyncError::ApplyTimeout`] when the apply
    ///   failed; the transaction rolled back, the run (if opened) was
    ///   finalized as Failed, and the store is exactly as before the call.
    pub async fn sync(
        &self,
        vendor_slug: &str,
        options: SyncOptions,
    ) -> Result<SyncSummary, SyncError> {
        let vendor = self
            .store
            .find_vendor(vendor_slug)
            .await?
            .ok_or_else(|| SyncError::not_configured(vendor_slug))?;
        let Some(integration) = vendor.integration else {
            return Err(SyncError::not_configured(vendor_slug));
        };
        if integration != IntegrationKind::Snapshot {
            return Err(SyncError::unsupported(vendor_slug, integration));
        }

        if options.inject.is_some() && !options.dry_run {
            return Err(SyncError::invalid_options(
                "injected rows are only valid with dry_run",
            ));
        }

        let _lease = self
            .guard
            .acquire(vendor_slug)
            .ok_or_else(|| SyncError::in_flight(vendor_slug))?;

        let started_at = Utc::now();

        let (raw_items, source) = match &options.inject {
            Some(rows) => {
                loader::validate_injected(rows)?;
                (rows.clone(), loader::INJECTED_SOURCE.to_string())
            }
            None => {
                let candidates =
                    loader::resolve_candidates(vendor_slug, options.source.as_deref());
                if options.dry_run && !loader::any_readable(&candidates) {
                    // Explicit empty-preview convenience: nothing to load,
                    // nothing to report against.
                    tracing::debug!(vendor = vendor_slug, "dry run with no readable source");
                    return Ok(SyncSummary::empty(vendor_slug, started_at));
                }
                loader::load(vendor_slug, &candidates)?
            }
        };

        let items = hash_items(raw_items);
        let aggregate = hash::aggregate_hash(
            items
                .iter()
                .map(|item| (item.external_id.as_str(), item.hash.as_str())),
        );

        let existing = self.store.find_by_vendor(vendor_slug).await?;
        let catalog_diff = diff::diff(&items, &existing);

        tracing::debug!(
            vendor = vendor_slug,
            total = catalog_diff.total(),
            created = catalog_diff.created(),
            updated = catalog_diff.updated(),
            removed = catalog_diff.removed(),
            unchanged = catalog_diff.unchanged,
            dry_run = options.dry_run,
            "computed catalog diff"
        );

        if options.dry_run {
            return Ok(SyncSummary {
                vendor: vendor_slug.to_string(),
                source: Some(source),
                total: catalog_diff.total(),
                created: catalog_diff.created(),
                updated: catalog_diff.updated(),
                unchanged: catalog_diff.unchanged,
                removed: catalog_diff.removed(),
                hash: aggregate,
                dry_run: true,
                duration_ms: 0,
                timestamp: started_at,
                run_id: None,
                status: RunStatus::Success,
            });
        }

        let meta = ApplyMeta {
            vendor: vendor_slug.to_string(),
            aggregate_hash: aggregate.clone(),
            source: source.clone(),
            actor: options.actor.clone(),
            total_items: catalog_diff.total() as i32,
            run_at: started_at,
        };

        let run_id = record::open_run(
            &*self.store,
            RunDraft {
                vendor: vendor_slug.to_string(),
                actor: options.actor.clone(),
                source: source.clone(),
                aggregate_hash: aggregate.clone(),
                total_items: catalog_diff.total() as i32,
                started_at,
            },
        )
        .await;

        match apply::execute(&*self.store, &meta, &catalog_diff, options.apply_timeout).await {
            Ok(duration_ms) => {
                record::finalize(
                    &*self.store,
                    run_id,
                    RunOutcome {
                        status: RunStatus::Success,
                        created: catalog_diff.created() as i32,
                        updated: catalog_diff.updated() as i32,
                        removed: catalog_diff.removed() as i32,
                        unchanged: catalog_diff.unchanged as i32,
                        error: None,
                        duration_ms,
                        finished_at: Utc::now(),
                    },
                )
                .await;

                tracing::info!(
                    vendor = vendor_slug,
                    source = %source,
                    total = catalog_diff.total(),
                    created = catalog_diff.created(),
                    updated = catalog_diff.updated(),
                    removed = catalog_diff.removed(),
                    duration_ms,
                    "sync applied"
                );

                Ok(SyncSummary {
                    vendor: vendor_slug.to_string(),
                    source: Some(source),
                    total: catalog_diff.total(),
                    created: catalog_diff.created(),
                    updated: catalog_diff.updated(),
                    unchanged: catalog_diff.unchanged,
                    removed: catalog_diff.removed(),
                    hash: aggregate,
                    dry_run: false,
                    duration_ms,
                    timestamp: started_at,
                    run_id,
                    status: RunStatus::Success,
                })
            }
            Err(err) => {
                let message = err.to_string();
                if let Err(follow_up) = self.store.record_failure(vendor_slug, &message).await {
                    tracing::warn!(
                        vendor = vendor_slug,
                        error = %follow_up,
                        "failed to record sync failure on vendor state"
                    );
                }
                // Proposed counts, not applied ones; the Failed status marks
                // them as such and the conservation law stays intact.
                record::finalize(
                    &*self.store,
                    run_id,
                    RunOutcome {
                        status: RunStatus::Failed,
                        created: catalog_diff.created() as i32,
                        updated: catalog_diff.updated() as i32,
                        removed: catalog_diff.removed() as i32,
                        unchanged: catalog_diff.unchanged as i32,
                        error: Some(message),
                        duration_ms: (Utc::now() - started_at).num_milliseconds(),
                        finished_at: Utc::now(),
                    },
                )
                .await;

                tracing::warn!(vendor = vendor_slug, error = %err, "sync failed");
                Err(err)
            }
        }
    }
}

fn hash_items(raw_items: Vec<RawCatalogItem>) -> Vec<HashedItem> {
    raw_items
        .into_iter()
        .map(|raw| {
            let hash = hash::hash_item(&raw.payload);
            HashedItem {
                external_id: raw.external_id,
                payload: raw.payload,
                hash,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use sea_orm::prelude::Uuid;
    use serde_json::json;

    use crate::entity::catalog_item::Model as CatalogItemModel;
    use crate::entity::vendor::Model as VendorModel;
    use crate::entity::vendor_state::Model as VendorStateModel;
    use crate::repository::{Result as StoreResult, RunPage, RunQuery};

    use super::*;

    /// Store stub for resolution and dry-run paths; everything a dry run
    /// must never touch panics.
    #[derive(Clone, Default)]
    struct StubStore {
        vendor: Option<VendorModel>,
        existing: Vec<CatalogItemModel>,
    }

    impl StubStore {
        fn with_vendor(integration: Option<IntegrationKind>) -> Self {
            Self {
                vendor: Some(VendorModel {
                    id: Uuid::new_v4(),
                    slug: "acme".to_string(),
                    name: "Acme Corp".to_string(),
                    integration,
                    created_at: Utc::now().fixed_offset(),
                }),
                existing: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl CatalogStore for StubStore {
        async fn find_vendor(&self, _slug: &str) -> StoreResult<Option<VendorModel>> {
            Ok(self.vendor.clone())
        }

        async fn find_by_vendor(&self, _vendor: &str) -> StoreResult<Vec<CatalogItemModel>> {
            Ok(self.existing.clone())
        }

        async fn apply_diff(
            &self,
            _meta: &ApplyMeta,
            _diff: &crate::diff::CatalogDiff,
        ) -> StoreResult<()> {
            panic!("dry runs must not apply")
        }

        async fn record_duration(&self, _vendor: &str, _duration_ms: i64) -> StoreResult<()> {
            panic!("dry runs must not record durations")
        }

        async fn record_failure(&self, _vendor: &str, _error: &str) -> StoreResult<()> {
            panic!("dry runs must not record failures")
        }

        async fn create_run(&self, _draft: RunDraft) -> StoreResult<Uuid> {
            panic!("dry runs must not open audit runs")
        }

        async fn finalize_run(&self, _run_id: Uuid, _outcome: RunOutcome) -> StoreResult<()> {
            panic!("dry runs must not finalize audit runs")
        }

        async fn get_state(&self, _vendor: &str) -> StoreResult<Option<VendorStateModel>> {
            Ok(None)
        }

        async fn list_runs(&self, _query: RunQuery) -> StoreResult<RunPage> {
            panic!("unused in tests")
        }
    }

    fn engine(store: StubStore) -> SyncEngine {
        SyncEngine::new(Arc::new(store))
    }

    fn inject_rows() -> Vec<RawCatalogItem> {
        vec![
            RawCatalogItem {
                external_id: "A".to_string(),
                payload: json!({"name": "Widget"}),
            },
            RawCatalogItem {
                external_id: "B".to_string(),
                payload: json!({"name": "Gadget"}),
            },
        ]
    }

    #[tokio::test]
    async fn test_unknown_vendor_is_not_configured() {
        let engine = engine(StubStore::default());
        let err = engine
            .sync("ghost", SyncOptions::default())
            .await
            .expect_err("unknown vendor should fail");
        assert!(matches!(err, SyncError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_vendor_without_integration_is_not_configured() {
        let engine = engine(StubStore::with_vendor(None));
        let err = engine
            .sync("acme", SyncOptions::default())
            .await
            .expect_err("unconfigured vendor should fail");
        assert!(matches!(err, SyncError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_remote_api_integration_is_unsupported() {
        let engine = engine(StubStore::with_vendor(Some(IntegrationKind::RemoteApi)));
        let err = engine
            .sync("acme", SyncOptions::default())
            .await
            .expect_err("remote api should be unsupported");
        assert!(matches!(err, SyncError::UnsupportedIntegration { .. }));
    }

    #[tokio::test]
    async fn test_inject_without_dry_run_is_rejected() {
        let engine = engine(StubStore::with_vendor(Some(IntegrationKind::Snapshot)));
        let options = SyncOptions {
            dry_run: false,
            inject: Some(inject_rows()),
            ..SyncOptions::default()
        };
        let err = engine
            .sync("acme", options)
            .await
            .expect_err("inject with apply should be rejected");
        assert!(matches!(err, SyncError::InvalidOptions { .. }));
    }

    #[tokio::test]
    async fn test_injected_dry_run_reports_full_counts_without_writing() {
        let engine = engine(StubStore::with_vendor(Some(IntegrationKind::Snapshot)));
        let options = SyncOptions {
            inject: Some(inject_rows()),
            ..SyncOptions::default()
        };

        let summary = engine
            .sync("acme", options)
            .await
            .expect("injected dry run should succeed");

        assert!(summary.dry_run);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.unchanged, 0);
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.source.as_deref(), Some(loader::INJECTED_SOURCE));
        assert!(summary.run_id.is_none());
        assert!(summary.counts_conserved());
    }

    #[tokio::test]
    async fn test_injected_dry_run_rejects_duplicate_rows() {
        let engine = engine(StubStore::with_vendor(Some(IntegrationKind::Snapshot)));
        let mut rows = inject_rows();
        rows.push(rows[0].clone());
        let options = SyncOptions {
            inject: Some(rows),
            ..SyncOptions::default()
        };

        let err = engine
            .sync("acme", options)
            .await
            .expect_err("duplicate injected rows should fail validation");
        assert!(matches!(err, SyncError::Load(_)));
    }

    #[tokio::test]
    async fn test_dry_run_aggregate_hash_is_order_independent() {
        let engine = engine(StubStore::with_vendor(Some(IntegrationKind::Snapshot)));

        let forward = engine
            .sync(
                "acme",
                SyncOptions {
                    inject: Some(inject_rows()),
                    ..SyncOptions::default()
                },
            )
            .await
            .expect("dry run should succeed");

        let mut reversed_rows = inject_rows();
        reversed_rows.reverse();
        let reversed = engine
            .sync(
                "acme",
                SyncOptions {
                    inject: Some(reversed_rows),
                    ..SyncOptions::default()
                },
            )
            .await
            .expect("dry run should succeed");

        assert_eq!(forward.hash, reversed.hash);
    }
}
