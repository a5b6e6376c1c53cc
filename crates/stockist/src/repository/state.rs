use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};

use crate::entity::vendor_state::{ActiveModel, Column, Entity as VendorState, Model};

use super::errors::{Result, StoreError};

// ─── Vendor State Operations ─────────────────────────────────────────────────

/// Read the latest committed sync state for a vendor.
///
/// Returns `None` if the vendor has never committed an apply.
pub async fn get_state<C: ConnectionTrait>(db: &C, vendor: &str) -> Result<Option<Model>> {
    VendorState::find_by_id(vendor)
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// Upsert the per-vendor state row after a committed apply.
///
/// Clears `last_error`; the duration is written by [`record_duration`] once
/// the transaction's wall-clock cost is known.
pub async fn upsert_state<C: ConnectionTrait>(
    db: &C,
    vendor: &str,
    run_at: DateTime<Utc>,
    aggregate_hash: &str,
    source: &str,
    actor: &str,
    total_items: i32,
) -> Result<()> {
    let model = ActiveModel {
        vendor: Set(vendor.to_string()),
        last_run_at: Set(run_at.fixed_offset()),
        last_duration_ms: Set(0),
        last_hash: Set(aggregate_hash.to_string()),
        last_source: Set(source.to_string()),
        last_actor: Set(actor.to_string()),
        total_items: Set(total_items),
        last_error: Set(None),
    };

    VendorState::insert(model)
        .on_conflict(
            OnConflict::column(Column::Vendor)
                .update_columns([
                    Column::LastRunAt,
                    Column::LastHash,
                    Column::LastSource,
                    Column::LastActor,
                    Column::TotalItems,
                    Column::LastError,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(())
}

/// Record the apply duration in a follow-up update.
///
/// Duration cannot be known from inside the transaction that produces it,
/// so this runs after commit.
pub async fn record_duration<C: ConnectionTrait>(
    db: &C,
    vendor: &str,
    duration_ms: i64,
) -> Result<()> {
    VendorState::update_many()
        .set(ActiveModel {
            last_duration_ms: Set(duration_ms),
            ..Default::default()
        })
        .filter(Column::Vendor.eq(vendor))
        .exec(db)
        .await?;
    Ok(())
}

/// Record a failed apply's error on the state row, if one exists.
///
/// A vendor that never committed an apply keeps reading as "never synced";
/// no row is created just to carry an error.
pub async fn record_failure<C: ConnectionTrait>(db: &C, vendor: &str, error: &str) -> Result<()> {
    VendorState::update_many()
        .set(ActiveModel {
            last_error: Set(Some(error.to_string())),
            ..Default::default()
        })
        .filter(Column::Vendor.eq(vendor))
        .exec(db)
        .await?;
    Ok(())
}
