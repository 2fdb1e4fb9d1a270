//! Error types for the model layer.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while defining models or using their instances.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model name rendered to an empty string.
    #[error("model name must render to a non-empty string")]
    InvalidName,

    /// The attribute is not part of the model's schema.
    #[error("model {model} has no attribute {attribute}")]
    UnknownAttribute { model: String, attribute: String },

    /// The attribute is computed and has no backing storage.
    #[error("attribute {attribute} of model {model} is computed and cannot be set")]
    ReadOnlyAttribute { model: String, attribute: String },

    /// The method is not part of the model's schema.
    #[error("model {model} has no method {method}")]
    UnknownMethod { model: String, method: String },

    /// A model was re-declared with a different attribute shape under strict mode.
    #[error("model {0} is already defined with a different schema")]
    SchemaMismatch(String),

    /// The persistence seam rejected a save.
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
