//! Initial migration to create the stockist database schema.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_vendors(manager).await?;
        self.create_catalog_items(manager).await?;
        self.create_sync_runs(manager).await?;
        self.create_vendor_sync_state(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VendorSyncState::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SyncRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CatalogItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_vendors(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vendors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vendors::Slug).string().not_null())
                    .col(ColumnDef::new(Vendors::Name).string().not_null())
                    .col(ColumnDef::new(Vendors::Integration).string().null())
                    .col(
                        ColumnDef::new(Vendors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on slug
        manager
            .create_index(
                Index::create()
                    .name("idx_vendors_slug")
                    .table(Vendors::Table)
                    .col(Vendors::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_catalog_items(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CatalogItems::Table)
                    .if_not_exists()
                    // Internal
                    .col(
                        ColumnDef::new(CatalogItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    // Identity
                    .col(ColumnDef::new(CatalogItems::Vendor).string().not_null())
                    .col(
                        ColumnDef::new(CatalogItems::ExternalId)
                            .string()
                            .not_null(),
                    )
                    // Content
                    .col(ColumnDef::new(CatalogItems::Payload).json().not_null())
                    .col(ColumnDef::new(CatalogItems::Hash).string().not_null())
                    // Tracking
                    .col(
                        ColumnDef::new(CatalogItems::FirstSeenAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(CatalogItems::SyncedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (vendor, external_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_catalog_items_vendor_external_id")
                    .table(CatalogItems::Table)
                    .col(CatalogItems::Vendor)
                    .col(CatalogItems::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on vendor
        manager
            .create_index(
                Index::create()
                    .name("idx_catalog_items_vendor")
                    .table(CatalogItems::Table)
                    .col(CatalogItems::Vendor)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_sync_runs(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncRuns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SyncRuns::Id).uuid().not_null().primary_key())
                    // Attribution
                    .col(ColumnDef::new(SyncRuns::Vendor).string().not_null())
                    .col(ColumnDef::new(SyncRuns::Actor).string().not_null())
                    // Outcome
                    .col(ColumnDef::new(SyncRuns::Status).string().not_null())
                    .col(
                        ColumnDef::new(SyncRuns::DryRun)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(SyncRuns::Error).text().null())
                    // Provenance
                    .col(ColumnDef::new(SyncRuns::Source).string().not_null())
                    .col(
                        ColumnDef::new(SyncRuns::AggregateHash)
                            .string()
                            .not_null(),
                    )
                    // Counts
                    .col(
                        ColumnDef::new(SyncRuns::TotalItems)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::CreatedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::UpdatedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::RemovedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::UnchangedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    // Timing
                    .col(
                        ColumnDef::new(SyncRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncRuns::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(SyncRuns::DurationMs).big_integer().null())
                    .to_owned(),
            )
            .await?;

        // Composite index on (vendor, started_at) for history paging
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_runs_vendor_started")
                    .table(SyncRuns::Table)
                    .col(SyncRuns::Vendor)
                    .col((SyncRuns::StartedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        // Index on status for filtered listings
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_runs_status")
                    .table(SyncRuns::Table)
                    .col(SyncRuns::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_vendor_sync_state(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VendorSyncState::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VendorSyncState::Vendor)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VendorSyncState::LastRunAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorSyncState::LastDurationMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VendorSyncState::LastHash)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorSyncState::LastSource)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorSyncState::LastActor)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VendorSyncState::TotalItems)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(VendorSyncState::LastError).text().null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
    Slug,
    Name,
    Integration,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CatalogItems {
    Table,
    Id,
    Vendor,
    ExternalId,
    Payload,
    Hash,
    FirstSeenAt,
    SyncedAt,
}

#[derive(DeriveIden)]
enum SyncRuns {
    Table,
    Id,
    Vendor,
    Actor,
    Status,
    DryRun,
    Error,
    Source,
    AggregateHash,
    TotalItems,
    CreatedCount,
    UpdatedCount,
    RemovedCount,
    UnchangedCount,
    StartedAt,
    FinishedAt,
    DurationMs,
}

#[derive(DeriveIden)]
enum VendorSyncState {
    Table,
    Vendor,
    LastRunAt,
    LastDurationMs,
    LastHash,
    LastSource,
    LastActor,
    TotalItems,
    LastError,
}
