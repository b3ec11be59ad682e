//! Error types for domain models.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised by the pure domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Unknown vehicle class: {0}")]
    UnknownClass(String),

    #[error("Class index {index} out of range (table has {len} entries)")]
    UnknownClassIndex { index: usize, len: usize },

    #[error("Invalid green-time policy: {0}")]
    InvalidPolicy(String),
}

impl ModelError {
    pub fn unknown_class(label: impl Into<String>) -> Self {
        Self::UnknownClass(label.into())
    }

    pub fn invalid_policy(msg: impl Into<String>) -> Self {
        Self::InvalidPolicy(msg.into())
    }
}
