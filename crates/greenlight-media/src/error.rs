//! Error types for media operations.

use std::path::PathBuf;

use greenlight_models::ModelError;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during detection and annotation.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Failed to decode image {path}: {message}")]
    ImageDecode { path: PathBuf, message: String },

    #[error("Failed to encode image {path}: {message}")]
    ImageEncode { path: PathBuf, message: String },

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid class names file {path}: {message}")]
    ClassNames { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl MediaError {
    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an inference failure error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    pub fn class_names(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ClassNames {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
