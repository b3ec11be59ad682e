//! Filesystem-backed image store.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Upload and result directories on local disk.
///
/// Files are keyed by their sanitized filename; concurrent writes to the
/// same name are not coordinated and the last write wins.
#[derive(Debug, Clone)]
pub struct LocalStore {
    uploads_dir: PathBuf,
    results_dir: PathBuf,
}

impl LocalStore {
    /// Open the store, creating both directories if absent.
    pub fn open(uploads_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let store = Self {
            uploads_dir: uploads_dir.into(),
            results_dir: results_dir.into(),
        };

        for dir in [&store.uploads_dir, &store.results_dir] {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }

        info!(
            uploads = %store.uploads_dir.display(),
            results = %store.results_dir.display(),
            "Image store ready"
        );

        Ok(store)
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Path an upload with this name is stored at.
    pub fn upload_path(&self, filename: &str) -> StorageResult<PathBuf> {
        Ok(self.uploads_dir.join(validate_key(filename)?))
    }

    /// Path the annotated result for this name is written to.
    pub fn result_path(&self, filename: &str) -> StorageResult<PathBuf> {
        Ok(self.results_dir.join(validate_key(filename)?))
    }

    /// Persist uploaded bytes and return the stored path.
    pub async fn save_upload(&self, filename: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let path = self.upload_path(filename)?;
        tokio::fs::write(&path, data).await?;

        debug!(path = %path.display(), bytes = data.len(), "Upload saved");

        Ok(path)
    }

    /// Check that both directories accept writes.
    ///
    /// Each call uses its own scratch file, so concurrent checks don't race.
    pub async fn check_writable(&self) -> StorageResult<()> {
        for dir in [&self.uploads_dir, &self.results_dir] {
            let scratch = dir.join(format!(".write-check-{}", Uuid::new_v4()));
            tokio::fs::write(&scratch, b"ok").await?;
            match tokio::fs::remove_file(&scratch).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Keys must be a single, non-hidden path component.
fn validate_key(filename: &str) -> StorageResult<&str> {
    let is_flat = !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(['/', '\\'])
        && Path::new(filename).file_name().map(|n| n == filename).unwrap_or(false);

    if is_flat {
        Ok(filename)
    } else {
        Err(StorageError::invalid_filename(filename))
    }
}
