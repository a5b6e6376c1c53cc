//! VendorState entity - latest committed sync state, one row per vendor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// VendorState model - "last known good state" projection for a vendor.
///
/// Upserted inside the apply transaction, so it always reflects the most
/// recently committed apply; dry runs never touch it. `last_error` is the
/// one exception: it is written by a best-effort follow-up after a failed
/// apply and cleared by the next successful one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendor_sync_state")]
pub struct Model {
    /// Vendor slug, one row per vendor.
    #[sea_orm(primary_key, auto_increment = false)]
    pub vendor: String,

    /// When the last committed apply ran.
    pub last_run_at: DateTimeWithTimeZone,
    /// Wall-clock cost of the last committed apply.
    pub last_duration_ms: i64,
    /// Aggregate digest of the last committed snapshot.
    pub last_hash: String,
    /// Source descriptor of the last committed snapshot.
    pub last_source: String,
    /// Actor of the last committed apply.
    pub last_actor: String,
    /// Item count of the last committed snapshot.
    pub total_items: i32,
    /// Error from the most recent failed apply; cleared on success.
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
