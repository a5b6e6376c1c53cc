//! SyncRun entity - audit record for one reconciliation attempt.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::run_status::RunStatus;

/// SyncRun model - one audited attempt to reconcile a vendor's catalog.
///
/// Rows are append-mostly: created as `Pending` immediately before the
/// apply, then updated exactly once to `Success` or `Failed`. Finalized
/// rows are never touched again.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_runs")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Attribution ─────────────────────────────────────────────────────────
    /// Vendor slug this run reconciled.
    pub vendor: String,
    /// Identity the sync was performed as, for audit attribution.
    pub actor: String,

    // ─── Outcome ─────────────────────────────────────────────────────────────
    /// Lifecycle status: Pending, then exactly one of Success/Failed.
    pub status: RunStatus,
    /// Whether this was a dry run (kept for schema completeness; the engine
    /// never records dry runs, see the sync module docs).
    #[sea_orm(default_value = false)]
    pub dry_run: bool,
    /// Error message for failed runs.
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,

    // ─── Snapshot provenance ─────────────────────────────────────────────────
    /// Descriptor of where the snapshot came from.
    pub source: String,
    /// Aggregate digest of the incoming snapshot.
    pub aggregate_hash: String,

    // ─── Counts ──────────────────────────────────────────────────────────────
    /// Number of items in the incoming snapshot.
    pub total_items: i32,
    /// Items inserted by this run.
    pub created_count: i32,
    /// Items whose payload+hash changed.
    pub updated_count: i32,
    /// Persisted items absent from the snapshot, deleted by this run.
    pub removed_count: i32,
    /// Items whose hash matched the stored record.
    pub unchanged_count: i32,

    // ─── Timing ──────────────────────────────────────────────────────────────
    /// When the run record was opened.
    pub started_at: DateTimeWithTimeZone,
    /// When the run was finalized.
    pub finished_at: Option<DateTimeWithTimeZone>,
    /// Wall-clock cost of the apply, filled at finalization.
    pub duration_ms: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Check the count conservation law: created + updated + unchanged = total.
    pub fn counts_conserved(&self) -> bool {
        self.created_count + self.updated_count + self.unchanged_count == self.total_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn run(created: i32, updated: i32, unchanged: i32, total: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            vendor: "acme".to_string(),
            actor: "test".to_string(),
            status: RunStatus::Success,
            dry_run: false,
            error: None,
            source: "file:/tmp/acme.json".to_string(),
            aggregate_hash: "abc".to_string(),
            total_items: total,
            created_count: created,
            updated_count: updated,
            removed_count: 0,
            unchanged_count: unchanged,
            started_at: Utc::now().fixed_offset(),
            finished_at: Some(Utc::now().fixed_offset()),
            duration_ms: Some(12),
        }
    }

    #[test]
    fn test_counts_conserved() {
        assert!(run(1, 2, 3, 6).counts_conserved());
        assert!(!run(1, 2, 3, 7).counts_conserved());
    }
}
