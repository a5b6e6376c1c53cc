//! Shared sync types and constants.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::run_status::RunStatus;
use crate::hash;
use crate::sync::loader::RawCatalogItem;

/// Default bound on the apply transaction's wall-clock time.
/// The apply must fail, not hang, if the underlying store is unresponsive.
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default actor recorded when the caller supplies none.
pub const DEFAULT_ACTOR: &str = "system";

/// Options for syncing a vendor's catalog.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Dry run mode - compute the full diff and summary, write nothing.
    /// This is the default when the caller is ambiguous.
    pub dry_run: bool,
    /// Explicit snapshot path, overriding source resolution.
    pub source: Option<PathBuf>,
    /// Identity the sync is performed as, for audit attribution.
    pub actor: String,
    /// In-memory snapshot rows for tests/previews; bypasses the filesystem
    /// and implies `dry_run`.
    pub inject: Option<Vec<RawCatalogItem>>,
    /// Bound on the apply transaction's wall-clock time.
    pub apply_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            source: None,
            actor: DEFAULT_ACTOR.to_string(),
            inject: None,
            apply_timeout: DEFAULT_APPLY_TIMEOUT,
        }
    }
}

impl SyncOptions {
    /// Options for a real apply with the given actor.
    pub fn apply_as(actor: impl Into<String>) -> Self {
        Self {
            dry_run: false,
            actor: actor.into(),
            ..Self::default()
        }
    }
}

/// Result of a single sync invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    /// Vendor slug that was synced.
    pub vendor: String,
    /// Descriptor of the snapshot source; `None` when nothing was loaded.
    pub source: Option<String>,
    /// Number of items in the incoming snapshot.
    pub total: usize,
    /// Items inserted.
    pub created: usize,
    /// Items whose payload changed.
    pub updated: usize,
    /// Items left untouched.
    pub unchanged: usize,
    /// Persisted items deleted.
    pub removed: usize,
    /// Aggregate digest of the incoming snapshot.
    pub hash: String,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Wall-clock cost of the apply; zero for dry runs.
    pub duration_ms: i64,
    /// When the sync started.
    pub timestamp: DateTime<Utc>,
    /// Audit run id; `None` for dry runs or when the audit store was
    /// unavailable at open time.
    pub run_id: Option<Uuid>,
    /// Outcome status. A returned summary is always `Success`; failures
    /// surface as errors instead.
    pub status: RunStatus,
}

impl SyncSummary {
    /// Zero-item summary for the no-source dry-run early exit.
    pub(crate) fn empty(vendor: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            vendor: vendor.to_string(),
            source: None,
            total: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            removed: 0,
            hash: hash::aggregate_hash([]),
            dry_run: true,
            duration_ms: 0,
            timestamp,
            run_id: None,
            status: RunStatus::Success,
        }
    }

    /// Check the count conservation law: created + updated + unchanged = total.
    pub fn counts_conserved(&self) -> bool {
        self.created + self.updated + self.unchanged == self.total
    }
}
