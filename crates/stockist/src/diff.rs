//! Catalog diffing - classify an incoming snapshot against persisted records.
//!
//! This is a pure, total function over its inputs: every incoming item lands
//! in exactly one of create/update/unchanged, and every persisted record not
//! present in the snapshot lands in remove. The count laws
//! `created + updated + unchanged = |incoming|` and
//! `removed = |existing| - (updated + unchanged)` hold by construction.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use uuid::Uuid;

use crate::entity::catalog_item::Model as CatalogItemModel;

/// One incoming catalog item with its content digest already computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedItem {
    /// Vendor-assigned identifier, unique within the snapshot.
    pub external_id: String,
    /// Opaque payload as delivered.
    pub payload: Value,
    /// Content digest of the canonicalized payload.
    pub hash: String,
}

/// An update to an existing record: new payload+hash, same row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEntry {
    /// Store-assigned id of the row to update.
    pub id: Uuid,
    /// External id, kept for reporting.
    pub external_id: String,
    /// Replacement payload.
    pub payload: Value,
    /// Replacement digest.
    pub hash: String,
}

/// A persisted record absent from the incoming snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveEntry {
    /// Store-assigned id of the row.
    pub id: Uuid,
    /// External id the delete is keyed on.
    pub external_id: String,
}

/// Result of diffing an incoming snapshot against persisted records.
#[derive(Debug, Clone, Default)]
pub struct CatalogDiff {
    /// Items with no persisted counterpart.
    pub creates: Vec<HashedItem>,
    /// Items whose digest differs from the stored one.
    pub updates: Vec<UpdateEntry>,
    /// Persisted records missing from the snapshot.
    pub removes: Vec<RemoveEntry>,
    /// Number of items whose digest matched the stored record.
    pub unchanged: usize,
}

impl CatalogDiff {
    /// Number of items classified as creates.
    pub fn created(&self) -> usize {
        self.creates.len()
    }

    /// Number of items classified as updates.
    pub fn updated(&self) -> usize {
        self.updates.len()
    }

    /// Number of records classified as removes.
    pub fn removed(&self) -> usize {
        self.removes.len()
    }

    /// Total incoming items this diff was computed from.
    pub fn total(&self) -> usize {
        self.creates.len() + self.updates.len() + self.unchanged
    }

    /// Whether applying this diff would write anything.
    pub fn is_noop(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.removes.is_empty()
    }
}

/// Classify incoming items against the persisted records for a vendor.
///
/// Later duplicates of an `external_id` within `incoming` are not expected
/// here (the loader rejects them); if present, the last occurrence wins for
/// membership and each occurrence is still classified, keeping the count
/// laws intact.
pub fn diff(incoming: &[HashedItem], existing: &[CatalogItemModel]) -> CatalogDiff {
    let by_external_id: HashMap<&str, &CatalogItemModel> = existing
        .iter()
        .map(|record| (record.external_id.as_str(), record))
        .collect();

    let mut result = CatalogDiff::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(incoming.len());

    for item in incoming {
        seen.insert(item.external_id.as_str());
        match by_external_id.get(item.external_id.as_str()) {
            None => result.creates.push(item.clone()),
            Some(record) if record.hash != item.hash => result.updates.push(UpdateEntry {
                id: record.id,
                external_id: item.external_id.clone(),
                payload: item.payload.clone(),
                hash: item.hash.clone(),
            }),
            Some(_) => result.unchanged += 1,
        }
    }

    for record in existing {
        if !seen.contains(record.external_id.as_str()) {
            result.removes.push(RemoveEntry {
                id: record.id,
                external_id: record.external_id.clone(),
            });
        }
    }

    result
}
