//! Common re-exports for convenient entity usage.

pub use super::catalog_item::{
    ActiveModel as CatalogItemActiveModel, Column as CatalogItemColumn, Entity as CatalogItem,
    Model as CatalogItemModel,
};
pub use super::integration_kind::IntegrationKind;
pub use super::run_status::RunStatus;
pub use super::sync_run::{
    ActiveModel as SyncRunActiveModel, Column as SyncRunColumn, Entity as SyncRun,
    Model as SyncRunModel,
};
pub use super::vendor::{
    ActiveModel as VendorActiveModel, Column as VendorColumn, Entity as Vendor,
    Model as VendorModel,
};
pub use super::vendor_state::{
    ActiveModel as VendorStateActiveModel, Column as VendorStateColumn, Entity as VendorState,
    Model as VendorStateModel,
};
