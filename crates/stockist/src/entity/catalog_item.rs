//! CatalogItem entity - one persisted product entry per vendor.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// CatalogItem model - the reconciled copy of one vendor catalog entry.
///
/// `hash` always equals the content digest of the stored `payload`; the two
/// are only ever written together (first sync inserts both, updates replace
/// both), so the pair cannot drift.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "catalog_items")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    // ─── Identity ────────────────────────────────────────────────────────────
    /// Vendor slug this item belongs to.
    pub vendor: String,
    /// Vendor-assigned identifier, unique within a vendor.
    pub external_id: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    /// Opaque structured document as delivered by the vendor.
    #[sea_orm(column_type = "Json")]
    pub payload: serde_json::Value,
    /// Content digest of the canonicalized payload.
    pub hash: String,

    // ─── Tracking ────────────────────────────────────────────────────────────
    /// When this item first appeared in a committed sync.
    pub first_seen_at: DateTimeWithTimeZone,
    /// When this item was last written by a committed sync.
    pub synced_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Compute the qualified name (vendor/external_id).
    pub fn qualified_id(&self) -> String {
        format!("{}/{}", self.vendor, self.external_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_qualified_id() {
        let now = Utc::now().fixed_offset();
        let model = Model {
            id: Uuid::new_v4(),
            vendor: "acme".to_string(),
            external_id: "SKU-001".to_string(),
            payload: serde_json::json!({"name": "Widget"}),
            hash: "deadbeef".to_string(),
            first_seen_at: now,
            synced_at: now,
        };
        assert_eq!(model.qualified_id(), "acme/SKU-001");
    }
}
