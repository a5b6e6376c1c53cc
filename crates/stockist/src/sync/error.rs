//! Error taxonomy for sync operations.
//!
//! Propagation policy:
//! - resolution and load failures abort before any persisted mutation or
//!   audit record exists - safe to retry immediately;
//! - apply failures roll back the transaction, finalize the open run as
//!   Failed (best effort), and re-throw - no partial progress;
//! - audit-store failures are logged and swallowed at both the open and
//!   finalize points and never mask the sync's true outcome.

use thiserror::Error;

use crate::entity::integration_kind::IntegrationKind;
use crate::repository::StoreError;
use crate::sync::loader::LoadError;

/// Errors that can occur during a sync invocation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Vendor unknown or missing a configured integration.
    #[error("Vendor not configured: {vendor}")]
    NotConfigured { vendor: String },

    /// Vendor's configured strategy has no implemented handler.
    #[error("Unsupported integration for {vendor}: {kind}")]
    UnsupportedIntegration {
        vendor: String,
        kind: IntegrationKind,
    },

    /// No candidate snapshot source was readable.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Another sync for the same vendor is in flight.
    #[error("Sync already in flight for vendor: {vendor}")]
    SyncInFlight { vendor: String },

    /// Caller-supplied options are contradictory.
    #[error("Invalid sync options: {message}")]
    InvalidOptions { message: String },

    /// The apply transaction exceeded its time bound.
    #[error("Apply timed out after {timeout_ms}ms")]
    ApplyTimeout { timeout_ms: u64 },

    /// Write failure inside the apply transaction; the store rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Create a not-configured error.
    #[inline]
    pub fn not_configured(vendor: impl Into<String>) -> Self {
        Self::NotConfigured {
            vendor: vendor.into(),
        }
    }

    /// Create an unsupported-integration error.
    #[inline]
    pub fn unsupported(vendor: impl Into<String>, kind: IntegrationKind) -> Self {
        Self::UnsupportedIntegration {
            vendor: vendor.into(),
            kind,
        }
    }

    /// Create an in-flight error.
    #[inline]
    pub fn in_flight(vendor: impl Into<String>) -> Self {
        Self::SyncInFlight {
            vendor: vendor.into(),
        }
    }

    /// Create an invalid-options error.
    #[inline]
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Whether retrying immediately is safe (nothing was mutated).
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured { .. }
                | Self::UnsupportedIntegration { .. }
                | Self::Load(_)
                | Self::SyncInFlight { .. }
                | Self::InvalidOptions { .. }
        )
    }
}
