//! Catalog snapshot loading and source resolution.
//!
//! A snapshot is a JSON array of `{external_id, payload}` objects. Candidate
//! sources are tried in priority order - explicit override, then the
//! environment-configured snapshot directory, then (outside production) a
//! local developer fixture and, for the demo vendor, a bundled sample
//! catalog. The first candidate that parses and validates wins; if none do,
//! the error carries every attempted source and what went wrong with it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Environment variable naming the directory `<slug>.json` snapshots live in.
pub const SNAPSHOT_DIR_ENV: &str = "STOCKIST_SNAPSHOT_DIR";

/// Environment variable naming the deployment environment.
/// The value `production` disables developer fixtures and the bundled demo.
pub const ENVIRONMENT_ENV: &str = "STOCKIST_ENV";

/// Vendor slug the bundled demo catalog belongs to.
pub const DEMO_VENDOR: &str = "demo";

/// Source descriptor used for injected in-memory snapshots.
pub const INJECTED_SOURCE: &str = "injected";

/// Directory of local developer fixtures, relative to the working directory.
const DEV_FIXTURE_DIR: &str = "fixtures";

/// Sample catalog shipped with the crate for the demo vendor.
const BUNDLED_DEMO_SNAPSHOT: &str = include_str!("../../fixtures/demo_catalog.json");

/// One raw catalog item as delivered in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCatalogItem {
    /// Vendor-assigned identifier, unique within the snapshot.
    #[serde(alias = "externalId")]
    pub external_id: String,
    /// Opaque structured document.
    pub payload: Value,
}

/// One candidate location a snapshot may be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Explicit path supplied by the caller.
    Explicit(PathBuf),
    /// `<slug>.json` under the environment-configured snapshot directory.
    EnvDir(PathBuf),
    /// Local developer fixture (non-production only).
    DevFixture(PathBuf),
    /// Catalog bundled into the crate (demo vendor, non-production only).
    Bundled,
}

impl SnapshotSource {
    /// Human-readable descriptor recorded in runs and state rows.
    pub fn descriptor(&self) -> String {
        match self {
            SnapshotSource::Explicit(path) => format!("file:{}", path.display()),
            SnapshotSource::EnvDir(path) => format!("env:{}", path.display()),
            SnapshotSource::DevFixture(path) => format!("fixture:{}", path.display()),
            SnapshotSource::Bundled => "bundled:demo-catalog".to_string(),
        }
    }

    /// Whether this candidate can be read at all (the file exists, or the
    /// content is compiled in). Says nothing about whether it parses.
    pub fn is_readable(&self) -> bool {
        match self {
            SnapshotSource::Explicit(path)
            | SnapshotSource::EnvDir(path)
            | SnapshotSource::DevFixture(path) => path.is_file(),
            SnapshotSource::Bundled => true,
        }
    }
}

/// One failed attempt at reading a candidate source.
#[derive(Debug, Clone)]
pub struct SourceAttempt {
    /// Descriptor of the candidate.
    pub source: String,
    /// Why it failed.
    pub error: String,
}

/// Errors that can occur while loading a snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No candidate source was readable and parseable.
    #[error("No snapshot source for vendor {vendor}; {}", describe_attempts(.attempted))]
    NoSource {
        vendor: String,
        attempted: Vec<SourceAttempt>,
    },

    /// A snapshot was read but does not satisfy the schema.
    #[error("Invalid snapshot from {origin}: {message}")]
    InvalidSnapshot { origin: String, message: String },
}

fn describe_attempts(attempted: &[SourceAttempt]) -> String {
    if attempted.is_empty() {
        return "no candidate sources configured".to_string();
    }
    let parts: Vec<String> = attempted
        .iter()
        .map(|attempt| format!("{} ({})", attempt.source, attempt.error))
        .collect();
    format!("attempted: {}", parts.join(", "))
}

/// Whether the process is running in production mode.
pub fn is_production() -> bool {
    std::env::var(ENVIRONMENT_ENV)
        .map(|value| value == "production")
        .unwrap_or(false)
}

/// Resolve the prioritized candidate list for a vendor.
///
/// The list may be empty (production, no explicit path, no configured
/// snapshot directory); callers decide whether that is an error or a no-op.
pub fn resolve_candidates(vendor: &str, explicit: Option<&Path>) -> Vec<SnapshotSource> {
    let mut candidates = Vec::new();

    if let Some(path) = explicit {
        candidates.push(SnapshotSource::Explicit(path.to_path_buf()));
    }
    if let Ok(dir) = std::env::var(SNAPSHOT_DIR_ENV) {
        candidates.push(SnapshotSource::EnvDir(
            Path::new(&dir).join(format!("{vendor}.json")),
        ));
    }
    if !is_production() {
        candidates.push(SnapshotSource::DevFixture(
            Path::new(DEV_FIXTURE_DIR).join(format!("{vendor}.json")),
        ));
        if vendor == DEMO_VENDOR {
            candidates.push(SnapshotSource::Bundled);
        }
    }

    candidates
}

/// Whether any candidate could be read at all.
pub fn any_readable(candidates: &[SnapshotSource]) -> bool {
    candidates.iter().any(SnapshotSource::is_readable)
}

/// Load the first candidate that reads, parses, and validates.
///
/// Returns the items and the winning candidate's descriptor. Side effects
/// are filesystem reads only.
pub fn load(
    vendor: &str,
    candidates: &[SnapshotSource],
) -> Result<(Vec<RawCatalogItem>, String), LoadError> {
    let mut attempted = Vec::new();

    for candidate in candidates {
        let descriptor = candidate.descriptor();
        let text = match read_candidate(candidate) {
            Ok(text) => text,
            Err(err) => {
                attempted.push(SourceAttempt {
                    source: descriptor,
                    error: err.to_string(),
                });
                continue;
            }
        };
        match parse_snapshot(&descriptor, &text) {
            Ok(items) => {
                tracing::debug!(vendor, source = %descriptor, items = items.len(), "loaded snapshot");
                return Ok((items, descriptor));
            }
            Err(err) => attempted.push(SourceAttempt {
                source: descriptor,
                error: err.to_string(),
            }),
        }
    }

    Err(LoadError::NoSource {
        vendor: vendor.to_string(),
        attempted,
    })
}

/// Validate injected in-memory rows against the snapshot schema.
pub fn validate_injected(rows: &[RawCatalogItem]) -> Result<(), LoadError> {
    validate_items(INJECTED_SOURCE, rows)
}

fn read_candidate(candidate: &SnapshotSource) -> std::io::Result<String> {
    match candidate {
        SnapshotSource::Explicit(path)
        | SnapshotSource::EnvDir(path)
        | SnapshotSource::DevFixture(path) => fs::read_to_string(path),
        SnapshotSource::Bundled => Ok(BUNDLED_DEMO_SNAPSHOT.to_string()),
    }
}

fn parse_snapshot(source: &str, text: &str) -> Result<Vec<RawCatalogItem>, LoadError> {
    let items: Vec<RawCatalogItem> =
        serde_json::from_str(text).map_err(|err| LoadError::InvalidSnapshot {
            origin: source.to_string(),
            message: err.to_string(),
        })?;
    validate_items(source, &items)?;
    Ok(items)
}

fn validate_items(source: &str, items: &[RawCatalogItem]) -> Result<(), LoadError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
    for item in items {
        if item.external_id.is_empty() {
            return Err(LoadError::InvalidSnapshot {
                origin: source.to_string(),
                message: "item with empty external_id".to_string(),
            });
        }
        if !seen.insert(item.external_id.as_str()) {
            return Err(LoadError::InvalidSnapshot {
                origin: source.to_string(),
                message: format!("duplicate external_id: {}", item.external_id),
            });
        }
    }
    Ok(())
}
