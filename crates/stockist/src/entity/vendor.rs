//! Vendor entity - the registry the dispatcher resolves strategies from.
//!
//! A vendor is one external catalog source, identified by a slug. The
//! `integration` column decides which sync strategy applies; a vendor
//! without one cannot be synced.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::integration_kind::IntegrationKind;

/// Vendor model - one registered external catalog source.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// URL-safe identifier, unique across all vendors.
    #[sea_orm(unique)]
    pub slug: String,

    /// Human-readable display name.
    pub name: String,

    /// Configured sync strategy; `None` means not yet onboarded.
    pub integration: Option<IntegrationKind>,

    /// When this vendor was registered.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
