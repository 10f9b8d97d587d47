//! Filesystem-based checkpoint storage implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::store::{CheckpointStore, StoredCheckpoint};

/// Filesystem implementation of CheckpointStore trait.
///
/// Stores the checkpoint as a single JSON file. Writes go to a sibling
/// temporary file which is flushed to disk and then renamed over the target,
/// so readers only ever observe a complete document.
pub struct FilesystemStore {
    path: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the checkpoint file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FilesystemStore {
    async fn store_checkpoint(&self, checkpoint: &StoredCheckpoint) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create checkpoint directory {}", parent.display())
                })?;
            }
        }

        let tmp = self.temp_path();
        let content = serde_json::to_string_pretty(checkpoint)?;
        let mut file = File::create(&tmp)
            .with_context(|| format!("Failed to create checkpoint file {}", tmp.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write checkpoint file {}", tmp.display()))?;
        // Data must be on disk before the rename makes it visible
        file.sync_all()
            .with_context(|| format!("Failed to sync checkpoint file {}", tmp.display()))?;
        drop(file);
        std::fs::rename(&tmp, &self.path).with_context(|| {
            format!(
                "Failed to move checkpoint file {} into place at {}",
                tmp.display(),
                self.path.display()
            )
        })?;

        tracing::debug!("Stored checkpoint to {}", self.path.display());
        Ok(())
    }

    async fn read_checkpoint(&self) -> Result<Option<StoredCheckpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read checkpoint file {}", self.path.display()))?;
        let stored = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse checkpoint file {}", self.path.display()))?;
        Ok(Some(stored))
    }

    async fn clear_checkpoint(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Checkpoint file {} removed", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "Checkpoint file {} not found, nothing to remove",
                    self.path.display()
                );
                Ok(())
            }
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove checkpoint file {}", self.path.display())
            }),
        }
    }
}
