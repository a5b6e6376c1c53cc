use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::integration_kind::IntegrationKind;
use crate::entity::vendor::{ActiveModel, Column, Entity as Vendor, Model};

use super::errors::{Result, StoreError};

// ─── Vendor Registry Operations ──────────────────────────────────────────────

/// Register a vendor, returning the created row.
pub async fn insert_vendor<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    name: &str,
    integration: Option<IntegrationKind>,
) -> Result<Model> {
    if slug.is_empty() {
        return Err(StoreError::invalid_input("vendor slug must not be empty"));
    }

    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        slug: Set(slug.to_string()),
        name: Set(name.to_string()),
        integration: Set(integration),
        created_at: Set(chrono::Utc::now().fixed_offset()),
    };
    model.insert(db).await.map_err(StoreError::from)
}

/// Find a vendor by its slug.
pub async fn find_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> Result<Option<Model>> {
    Vendor::find()
        .filter(Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(StoreError::from)
}

/// List all registered vendors, ordered by slug.
pub async fn list_vendors<C: ConnectionTrait>(db: &C) -> Result<Vec<Model>> {
    Vendor::find()
        .order_by_asc(Column::Slug)
        .all(db)
        .await
        .map_err(StoreError::from)
}
