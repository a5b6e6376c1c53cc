use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Record not found.
    #[error("Not found: {context}")]
    NotFound { context: String },

    /// A finalized run was asked to transition again.
    #[error("Run already finalized: {run_id}")]
    AlreadyFinalized { run_id: Uuid },

    /// Invalid input data.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl StoreError {
    /// Create a NotFound error for a vendor slug lookup.
    pub fn vendor_not_found(slug: &str) -> Self {
        Self::NotFound {
            context: format!("vendor={}", slug),
        }
    }

    /// Create a NotFound error for a run id lookup.
    pub fn run_not_found(run_id: Uuid) -> Self {
        Self::NotFound {
            context: format!("run={}", run_id),
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
