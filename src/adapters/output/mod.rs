//! Delivery of finished documents
//!
//! A sink receives the rendered bytes and the deterministic file name and
//! stores them somewhere the caller can pick them up.

use crate::domain::{KeepsakeError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Destination for exported documents
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Stores `bytes` under `file_name` and returns where it ended up
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes documents into a directory on disk
///
/// Bytes are written to a hidden temporary file first and renamed into place,
/// so readers never observe a partially written document.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates a sink for `dir`; the directory is created on first delivery
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(KeepsakeError::Validation(format!(
                "Invalid artifact file name: {file_name:?}"
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            KeepsakeError::Io(format!(
                "Failed to create output directory {}: {e}",
                self.dir.display()
            ))
        })?;

        let final_path = self.dir.join(file_name);
        let temp_path = self.dir.join(format!(".{file_name}.part"));

        if let Err(e) = tokio::fs::write(&temp_path, bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(KeepsakeError::Io(format!(
                "Failed to write {}: {e}",
                temp_path.display()
            )));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(KeepsakeError::Io(format!(
                "Failed to move document into {}: {e}",
                final_path.display()
            )));
        }

        tracing::debug!(path = %final_path.display(), bytes = bytes.len(), "Document written");
        Ok(final_path)
    }
}
