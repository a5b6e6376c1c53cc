//! Integration kind enum for vendor strategy resolution.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a vendor's catalog is obtained.
///
/// Only `Snapshot` has an implemented handler; dispatching a vendor
/// configured with `RemoteApi` fails with an unsupported-integration error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum IntegrationKind {
    /// File/snapshot based: a JSON snapshot of the full catalog is read
    /// from a resolved source and reconciled against the store.
    #[sea_orm(string_value = "snapshot")]
    Snapshot,
    /// Remote API based: the vendor exposes an API to pull the catalog
    /// from. Represented in the registry but not implemented.
    #[sea_orm(string_value = "remote_api")]
    RemoteApi,
}

impl std::fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrationKind::Snapshot => write!(f, "snapshot"),
            IntegrationKind::RemoteApi => write!(f, "remote_api"),
        }
    }
}

impl std::str::FromStr for IntegrationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snapshot" | "file" => Ok(IntegrationKind::Snapshot),
            "remote_api" | "remote-api" | "api" => Ok(IntegrationKind::RemoteApi),
            _ => Err(format!("Unknown integration kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(IntegrationKind::Snapshot.to_string(), "snapshot");
        assert_eq!(IntegrationKind::RemoteApi.to_string(), "remote_api");
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            "snapshot".parse::<IntegrationKind>().unwrap(),
            IntegrationKind::Snapshot
        );
        assert_eq!(
            "file".parse::<IntegrationKind>().unwrap(),
            IntegrationKind::Snapshot
        );
        assert_eq!(
            "remote-api".parse::<IntegrationKind>().unwrap(),
            IntegrationKind::RemoteApi
        );
        assert!("ftp".parse::<IntegrationKind>().is_err());
    }
}
