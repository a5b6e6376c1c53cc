//! Catalog synchronization: loading, guarding, dispatching, and recording.
//!
//! # Module Structure
//!
//! - [`types`] - `SyncOptions`, `SyncSummary`, tuning constants
//! - [`error`] - the `SyncError` taxonomy and propagation policy
//! - [`loader`] - snapshot source resolution and schema validation
//! - [`guard`] - the per-vendor in-flight lease
//! - [`engine`] - the dispatcher orchestrating one sync end to end
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stockist::{SqlCatalogStore, SyncEngine, SyncOptions};
//!
//! let db = stockist::connect_and_migrate("sqlite://stockist.db?mode=rwc").await?;
//! let engine = SyncEngine::new(Arc::new(SqlCatalogStore::new(db)));
//!
//! let summary = engine.sync("acme", SyncOptions::apply_as("cron")).await?;
//! println!("created {}, removed {}", summary.created, summary.removed);
//! ```

pub mod engine;
mod error;
pub mod guard;
pub mod loader;
mod types;

pub use engine::SyncEngine;
pub use error::SyncError;
pub use guard::{VendorGuard, VendorLease};
pub use loader::{LoadError, RawCatalogItem, SnapshotSource, SourceAttempt};
pub use types::{DEFAULT_ACTOR, DEFAULT_APPLY_TIMEOUT, SyncOptions, SyncSummary};
