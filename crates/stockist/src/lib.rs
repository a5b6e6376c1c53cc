//! Stockist - a vendor catalog synchronization engine.
//!
//! Stockist ingests periodic snapshots of external vendors' product
//! catalogs and reconciles them into a persisted store, keeping a
//! verifiable, queryable audit trail of every reconciliation attempt.
//! Each sync loads a snapshot, content-hashes every item, diffs the result
//! against the persisted records, applies the diff in a single atomic
//! transaction, and records a run with outcome and metrics.
//!
//! # Features
//!
//! - `sqlite` - SQLite driver support (on by default).
//! - `migrate` - database migration support; enables
//!   [`connect_and_migrate`] (on by default).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use stockist::{SqlCatalogStore, SyncEngine, SyncOptions};
//!
//! let db = stockist::connect_and_migrate("sqlite://stockist.db?mode=rwc").await?;
//! let store = Arc::new(SqlCatalogStore::new(db));
//! let engine = SyncEngine::new(store.clone());
//!
//! // Preview without writing.
//! let preview = engine.sync("acme", SyncOptions::default()).await?;
//!
//! // Apply for real.
//! let summary = engine.sync("acme", SyncOptions::apply_as("cron")).await?;
//!
//! // Last known good state, independent of run history.
//! let state = store.get_state("acme").await?;
//! ```

pub mod db;
pub mod diff;
pub mod entity;
pub mod hash;
pub mod repository;
pub mod store;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use repository::{RunCursor, RunDraft, RunOutcome, RunPage, RunQuery, StoreError};
pub use store::{ApplyMeta, CatalogStore, SqlCatalogStore};
pub use sync::{LoadError, RawCatalogItem, SyncEngine, SyncError, SyncOptions, SyncSummary};
