//! Local image storage.
//!
//! This crate provides:
//! - Upload and result directories, created on startup
//! - Upload persistence keyed by sanitized filename
//! - Filename sanitization and extension allow-listing

pub mod error;
pub mod filename;
pub mod local;

pub use error::{StorageError, StorageResult};
pub use filename::{allowed_file, secure_filename, ALLOWED_EXTENSIONS};
pub use local::LocalStore;
