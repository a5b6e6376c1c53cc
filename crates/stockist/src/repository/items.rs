use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::catalog_item::{ActiveModel, Column, Entity as CatalogItem, Model};

use super::errors::{Result, StoreError};

/// Maximum rows per INSERT statement.
/// Bounds statement size and keeps transaction duration predictable for
/// large snapshots.
pub const INSERT_CHUNK_SIZE: usize = 250;

// ─── Catalog Item Operations ─────────────────────────────────────────────────

/// Find all catalog items for a vendor, ordered by external id.
pub async fn find_by_vendor<C: ConnectionTrait>(db: &C, vendor: &str) -> Result<Vec<Model>> {
    CatalogItem::find()
        .filter(Column::Vendor.eq(vendor))
        .order_by_asc(Column::ExternalId)
        .all(db)
        .await
        .map_err(StoreError::from)
}

/// Count catalog items for a vendor.
pub async fn count_by_vendor<C: ConnectionTrait>(db: &C, vendor: &str) -> Result<u64> {
    use sea_orm::PaginatorTrait;

    CatalogItem::find()
        .filter(Column::Vendor.eq(vendor))
        .count(db)
        .await
        .map_err(StoreError::from)
}

/// Insert catalog items in chunks of [`INSERT_CHUNK_SIZE`].
///
/// Duplicate `(vendor, external_id)` keys are tolerated as no-ops via
/// `ON CONFLICT DO NOTHING`: the diff proposes the set of external ids
/// absent at diff time, and a row that raced in since must not fail the
/// whole batch.
///
/// Returns the number of models submitted (not the number of rows the
/// database actually inserted, which conflicts may reduce).
pub async fn insert_chunked<C: ConnectionTrait>(db: &C, models: Vec<ActiveModel>) -> Result<u64> {
    if models.is_empty() {
        return Ok(0);
    }

    let count = models.len() as u64;
    let mut iter = models.into_iter();
    loop {
        let chunk: Vec<ActiveModel> = iter.by_ref().take(INSERT_CHUNK_SIZE).collect();
        if chunk.is_empty() {
            break;
        }
        CatalogItem::insert_many(chunk)
            .on_conflict(
                OnConflict::columns([Column::Vendor, Column::ExternalId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    Ok(count)
}

/// Replace the payload and hash of an existing item by its store id.
///
/// The two columns are only ever written together, preserving the
/// hash-matches-payload invariant.
pub async fn update_content<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    payload: Value,
    hash: String,
    synced_at: DateTime<FixedOffset>,
) -> Result<()> {
    let model = ActiveModel {
        payload: Set(payload),
        hash: Set(hash),
        synced_at: Set(synced_at),
        ..Default::default()
    };
    CatalogItem::update_many()
        .set(model)
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

/// Delete a vendor's items by external id, chunked to bound statement size.
///
/// Returns the total number of rows deleted.
pub async fn delete_by_external_ids<C: ConnectionTrait>(
    db: &C,
    vendor: &str,
    external_ids: &[String],
) -> Result<u64> {
    if external_ids.is_empty() {
        return Ok(0);
    }

    let mut total_deleted = 0u64;
    for chunk in external_ids.chunks(INSERT_CHUNK_SIZE) {
        let result = CatalogItem::delete_many()
            .filter(Column::Vendor.eq(vendor))
            .filter(Column::ExternalId.is_in(chunk.iter().map(String::as_str)))
            .exec(db)
            .await?;
        total_deleted += result.rows_affected;
    }

    Ok(total_deleted)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    use super::*;

    fn active_model(vendor: &str, external_id: &str) -> ActiveModel {
        let now = Utc::now().fixed_offset();
        ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor: Set(vendor.to_string()),
            external_id: Set(external_id.to_string()),
            payload: Set(json!({"name": external_id})),
            hash: Set(format!("hash-{external_id}")),
            first_seen_at: Set(now),
            synced_at: Set(now),
        }
    }

    #[tokio::test]
    async fn insert_chunked_returns_zero_for_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let count = insert_chunked(&db, Vec::new()).await.expect("should succeed");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn insert_chunked_returns_model_count() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 2,
                last_insert_id: 0,
            }])
            .into_connection();

        let models = vec![active_model("acme", "A"), active_model("acme", "B")];
        let count = insert_chunked(&db, models)
            .await
            .expect("insert_chunked should succeed");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn insert_chunked_splits_large_batches() {
        // 251 models require two INSERT statements.
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([
                MockExecResult {
                    rows_affected: INSERT_CHUNK_SIZE as u64,
                    last_insert_id: 0,
                },
                MockExecResult {
                    rows_affected: 1,
                    last_insert_id: 0,
                },
            ])
            .into_connection();

        let models: Vec<ActiveModel> = (0..=INSERT_CHUNK_SIZE)
            .map(|i| active_model("acme", &format!("SKU-{i}")))
            .collect();
        let count = insert_chunked(&db, models)
            .await
            .expect("chunked insert should succeed");
        assert_eq!(count, INSERT_CHUNK_SIZE as u64 + 1);
    }

    #[tokio::test]
    async fn delete_by_external_ids_returns_zero_for_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let deleted = delete_by_external_ids(&db, "acme", &[])
            .await
            .expect("should succeed");
        assert_eq!(deleted, 0);
    }

    #[tokio::test]
    async fn delete_by_external_ids_returns_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 3,
                last_insert_id: 0,
            }])
            .into_connection();

        let ids = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let deleted = delete_by_external_ids(&db, "acme", &ids)
            .await
            .expect("delete should succeed");
        assert_eq!(deleted, 3);
    }

    #[tokio::test]
    async fn update_content_issues_single_update() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                rows_affected: 1,
                last_insert_id: 0,
            }])
            .into_connection();

        update_content(
            &db,
            Uuid::new_v4(),
            json!({"name": "Widget"}),
            "newhash".to_string(),
            Utc::now().fixed_offset(),
        )
        .await
        .expect("update should succeed");
    }
}
