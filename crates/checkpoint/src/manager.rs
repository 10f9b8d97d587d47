//! Checkpoint manager used by the sync loop.

use crate::{store::CheckpointStore, Checkpoint, StoredCheckpoint};

/// Manager for loading and saving the sync cursor.
///
/// The manager never lets checkpoint trouble stop the pipeline:
/// - **Loading**: a missing, unreadable, corrupt, or foreign checkpoint
///   yields `C::initial()` and a log line
/// - **Saving**: a failed write is logged at error level and reported to the
///   caller as `false`; the in-memory cursor stays authoritative
///
/// # Example
///
/// ```rust,ignore
/// use checkpoint::{CheckpointManager, FilesystemStore};
///
/// let manager = CheckpointManager::new(FilesystemStore::new("state.json"));
///
/// let cursor: ModifiedCursor = manager.get().await;
/// manager.set(&cursor).await;
/// ```
pub struct CheckpointManager<S: CheckpointStore> {
    store: S,
}

impl<S: CheckpointStore> CheckpointManager<S> {
    /// Create a new manager backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the persisted checkpoint, falling back to `C::initial()`.
    pub async fn get<C: Checkpoint>(&self) -> C {
        let stored = match self.store.read_checkpoint().await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                let initial = C::initial();
                tracing::info!(
                    "No checkpoint found, starting from {}",
                    initial.to_cli_string()
                );
                return initial;
            }
            Err(e) => {
                let initial = C::initial();
                tracing::warn!(
                    "Failed to load checkpoint, starting from {}: {e:#}",
                    initial.to_cli_string()
                );
                return initial;
            }
        };

        if let Some(database_type) = &stored.database_type {
            if database_type != C::DATABASE_TYPE {
                let initial = C::initial();
                tracing::warn!(
                    "Checkpoint type mismatch: expected '{}', found '{}'; starting from {}",
                    C::DATABASE_TYPE,
                    database_type,
                    initial.to_cli_string()
                );
                return initial;
            }
        }

        match C::from_cli_string(&stored.checkpoint_data) {
            Ok(checkpoint) => {
                tracing::info!("Loaded checkpoint: {}", checkpoint.to_cli_string());
                checkpoint
            }
            Err(e) => {
                let initial = C::initial();
                tracing::warn!(
                    "Invalid checkpoint value '{}', starting from {}: {e:#}",
                    stored.checkpoint_data,
                    initial.to_cli_string()
                );
                initial
            }
        }
    }

    /// Persist the checkpoint, replacing any previous one.
    ///
    /// Returns whether the write succeeded. Failures are logged, not raised.
    pub async fn set<C: Checkpoint>(&self, checkpoint: &C) -> bool {
        let stored = StoredCheckpoint::new(C::DATABASE_TYPE, checkpoint.to_cli_string());
        match self.store.store_checkpoint(&stored).await {
            Ok(()) => {
                tracing::debug!("Saved checkpoint: {}", stored.checkpoint_data);
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to save checkpoint {}; continuing with in-memory cursor: {e:#}",
                    stored.checkpoint_data
                );
                false
            }
        }
    }

    /// Delete the persisted checkpoint.
    pub async fn reset(&self) -> anyhow::Result<()> {
        self.store.clear_checkpoint().await
    }
}
