//! In-memory checkpoint storage.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{CheckpointStore, StoredCheckpoint};

/// Process-local CheckpointStore.
///
/// Nothing survives a restart. Used by tests and by dry runs.
#[derive(Default)]
pub struct MemoryStore {
    stored: Mutex<Option<StoredCheckpoint>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a checkpoint.
    pub fn with_checkpoint(checkpoint: StoredCheckpoint) -> Self {
        Self {
            stored: Mutex::new(Some(checkpoint)),
        }
    }

    /// Current stored document, if any.
    pub async fn snapshot(&self) -> Option<StoredCheckpoint> {
        self.stored.lock().await.clone()
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn store_checkpoint(&self, checkpoint: &StoredCheckpoint) -> Result<()> {
        *self.stored.lock().await = Some(checkpoint.clone());
        Ok(())
    }

    async fn read_checkpoint(&self) -> Result<Option<StoredCheckpoint>> {
        Ok(self.stored.lock().await.clone())
    }

    async fn clear_checkpoint(&self) -> Result<()> {
        *self.stored.lock().await = None;
        Ok(())
    }
}
