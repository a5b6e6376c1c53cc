//! Run status enum for sync audit records.
//!
//! This is the single status vocabulary used everywhere inside the crate;
//! consumers translate to their own wire formats at the boundary.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a sync run.
///
/// The engine's state machine only ever writes `Pending` followed by exactly
/// one of `Success` or `Failed`. `Running` exists so that external status
/// vocabularies normalize into this enum without loss.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum RunStatus {
    /// Run record created, apply not yet finished.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Apply in progress (boundary vocabulary only; never persisted by the engine).
    #[sea_orm(string_value = "running")]
    Running,
    /// Apply committed; counts and duration are final.
    #[sea_orm(string_value = "success")]
    Success,
    /// Apply aborted; `error` carries the cause.
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl RunStatus {
    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "success" => Ok(RunStatus::Success),
            "failed" | "error" => Ok(RunStatus::Failed),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}
