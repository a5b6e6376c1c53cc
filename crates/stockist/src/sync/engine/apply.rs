//! Bounded execution of the transactional apply.

use std::time::{Duration, Instant};

use crate::diff::CatalogDiff;
use crate::store::{ApplyMeta, CatalogStore};
use crate::sync::error::SyncError;

/// Run the apply transaction under a time bound and return its wall-clock
/// cost in milliseconds.
///
/// On success the duration is also written to the vendor state row in a
/// follow-up update (the transaction cannot know its own cost); a failure
/// of that follow-up is logged and does not fail the sync. On timeout the
/// transaction never commits, so the store is untouched.
pub(super) async fn execute(
    store: &dyn CatalogStore,
    meta: &ApplyMeta,
    diff: &CatalogDiff,
    timeout: Duration,
) -> Result<i64, SyncError> {
    let started = Instant::now();

    match tokio::time::timeout(timeout, store.apply_diff(meta, diff)).await {
        Ok(Ok(())) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            if let Err(err) = store.record_duration(&meta.vendor, duration_ms).await {
                tracing::warn!(
                    vendor = %meta.vendor,
                    error = %err,
                    "failed to record apply duration"
                );
            }
            Ok(duration_ms)
        }
        Ok(Err(store_err)) => Err(SyncError::Store(store_err)),
        Err(_elapsed) => Err(SyncError::ApplyTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
