//! Best-effort audit run recording.
//!
//! The audit trail is secondary to the sync's own correctness: if the
//! audit store is unavailable at open or finalize time, the sync proceeds
//! and the failure is logged, never propagated.

use uuid::Uuid;

use crate::repository::{RunDraft, RunOutcome};
use crate::store::CatalogStore;

/// Open a Pending run, returning `None` if the audit store refused.
pub(super) async fn open_run(store: &dyn CatalogStore, draft: RunDraft) -> Option<Uuid> {
    let vendor = draft.vendor.clone();
    match store.create_run(draft).await {
        Ok(run_id) => Some(run_id),
        Err(err) => {
            tracing::warn!(
                vendor,
                error = %err,
                "failed to open sync run; continuing without audit record"
            );
            None
        }
    }
}

/// Finalize an open run, if one was opened; failures are logged only.
pub(super) async fn finalize(store: &dyn CatalogStore, run_id: Option<Uuid>, outcome: RunOutcome) {
    let Some(run_id) = run_id else {
        return;
    };
    if let Err(err) = store.finalize_run(run_id, outcome).await {
        tracing::warn!(
            run_id = %run_id,
            error = %err,
            "failed to finalize sync run"
        );
    }
}
