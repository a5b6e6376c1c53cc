use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use uuid::Uuid;

use crate::entity::run_status::RunStatus;
use crate::entity::sync_run::{ActiveModel, Column, Entity as SyncRun, Model};

use super::errors::{Result, StoreError};

/// Default page size for run history listings.
pub const DEFAULT_RUN_PAGE_SIZE: u64 = 50;

/// Fields captured when a run is opened.
#[derive(Debug, Clone)]
pub struct RunDraft {
    /// Vendor slug being reconciled.
    pub vendor: String,
    /// Audit attribution.
    pub actor: String,
    /// Source descriptor of the snapshot.
    pub source: String,
    /// Aggregate digest of the incoming snapshot.
    pub aggregate_hash: String,
    /// Number of items in the snapshot.
    pub total_items: i32,
    /// When the sync started.
    pub started_at: DateTime<Utc>,
}

/// Fields captured when a run is finalized.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Terminal status: Success or Failed.
    pub status: RunStatus,
    /// Items inserted.
    pub created: i32,
    /// Items updated.
    pub updated: i32,
    /// Items deleted.
    pub removed: i32,
    /// Items left untouched.
    pub unchanged: i32,
    /// Error message for failed runs.
    pub error: Option<String>,
    /// Wall-clock cost of the sync.
    pub duration_ms: i64,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

/// Continuation point for cursor-based run listings.
///
/// Runs are ordered `(started_at, id)` descending; the cursor names the last
/// row of the previous page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCursor {
    /// `started_at` of the last row seen.
    pub started_at: DateTime<FixedOffset>,
    /// `id` of the last row seen, tie-breaker for equal timestamps.
    pub id: Uuid,
}

impl RunCursor {
    /// Cursor pointing just past the given run.
    pub fn after(run: &Model) -> Self {
        Self {
            started_at: run.started_at,
            id: run.id,
        }
    }
}

/// Filters for run history listings.
#[derive(Debug, Clone, Default)]
pub struct RunQuery {
    /// Restrict to one vendor.
    pub vendor: Option<String>,
    /// Restrict to one status.
    pub status: Option<RunStatus>,
    /// Only runs started at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only runs started before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Continuation from a previous page.
    pub cursor: Option<RunCursor>,
    /// Page size; 0 means [`DEFAULT_RUN_PAGE_SIZE`].
    pub limit: u64,
}

/// One page of run history, most recent first.
#[derive(Debug, Clone)]
pub struct RunPage {
    /// Runs in `(started_at, id)` descending order.
    pub runs: Vec<Model>,
    /// Cursor for the next page; `None` when exhausted.
    pub next_cursor: Option<RunCursor>,
}

// ─── Run Operations ──────────────────────────────────────────────────────────

/// Insert a new Pending run from a draft, returning its id.
pub async fn insert_run<C: ConnectionTrait>(db: &C, draft: RunDraft) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let model = ActiveModel {
        id: Set(id),
        vendor: Set(draft.vendor),
        actor: Set(draft.actor),
        status: Set(RunStatus::Pending),
        dry_run: Set(false),
        error: Set(None),
        source: Set(draft.source),
        aggregate_hash: Set(draft.aggregate_hash),
        total_items: Set(draft.total_items),
        created_count: Set(0),
        updated_count: Set(0),
        removed_count: Set(0),
        unchanged_count: Set(0),
        started_at: Set(draft.started_at.fixed_offset()),
        finished_at: Set(None),
        duration_ms: Set(None),
    };
    SyncRun::insert(model).exec(db).await?;
    Ok(id)
}

/// Finalize a Pending run exactly once.
///
/// The update is guarded on `status = Pending`, so a second finalization
/// attempt matches zero rows and fails with `AlreadyFinalized` instead of
/// rewriting a terminal record.
pub async fn finalize_run<C: ConnectionTrait>(
    db: &C,
    run_id: Uuid,
    outcome: RunOutcome,
) -> Result<()> {
    let model = ActiveModel {
        status: Set(outcome.status),
        created_count: Set(outcome.created),
        updated_count: Set(outcome.updated),
        removed_count: Set(outcome.removed),
        unchanged_count: Set(outcome.unchanged),
        error: Set(outcome.error),
        duration_ms: Set(Some(outcome.duration_ms)),
        finished_at: Set(Some(outcome.finished_at.fixed_offset())),
        ..Default::default()
    };

    let result = SyncRun::update_many()
        .set(model)
        .filter(Column::Id.eq(run_id))
        .filter(Column::Status.eq(RunStatus::Pending))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        // Either the run does not exist or it already reached a terminal state.
        return match find_run_by_id(db, run_id).await? {
            Some(_) => Err(StoreError::AlreadyFinalized { run_id }),
            None => Err(StoreError::run_not_found(run_id)),
        };
    }

    Ok(())
}

/// Find a run by its id.
pub async fn find_run_by_id<C: ConnectionTrait>(db: &C, run_id: Uuid) -> Result<Option<Model>> {
    SyncRun::find_by_id(run_id)
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// List run history most-recent-first with cursor continuation.
///
/// Fetches one row past the page size to decide whether a next page exists
/// without a second count query.
pub async fn list_runs<C: ConnectionTrait>(db: &C, query: RunQuery) -> Result<RunPage> {
    let limit = if query.limit == 0 {
        DEFAULT_RUN_PAGE_SIZE
    } else {
        query.limit
    };

    let mut find = SyncRun::find()
        .order_by_desc(Column::StartedAt)
        .order_by_desc(Column::Id)
        .limit(limit + 1);

    if let Some(vendor) = &query.vendor {
        find = find.filter(Column::Vendor.eq(vendor));
    }
    if let Some(status) = query.status {
        find = find.filter(Column::Status.eq(status));
    }
    if let Some(since) = query.since {
        find = find.filter(Column::StartedAt.gte(since.fixed_offset()));
    }
    if let Some(until) = query.until {
        find = find.filter(Column::StartedAt.lt(until.fixed_offset()));
    }
    if let Some(cursor) = query.cursor {
        // Strictly after the cursor in (started_at, id) descending order.
        find = find.filter(
            Condition::any()
                .add(Column::StartedAt.lt(cursor.started_at))
                .add(
                    Condition::all()
                        .add(Column::StartedAt.eq(cursor.started_at))
                        .add(Column::Id.lt(cursor.id)),
                ),
        );
    }

    let mut runs = find.all(db).await?;
    let next_cursor = if runs.len() as u64 > limit {
        runs.truncate(limit as usize);
        runs.last().map(RunCursor::after)
    } else {
        None
    };

    Ok(RunPage { runs, next_cursor })
}
