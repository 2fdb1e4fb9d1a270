//! Error types for the sync contract.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that travel through the failure channel of a sync call.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A registered handler failed.
    #[error("handler failed: {0}")]
    Handler(String),

    /// A batch named a model that is not registered.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// An item could not be merged into its model's store.
    #[error("merge failed for model {model}: {reason}")]
    Merge { model: String, reason: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
