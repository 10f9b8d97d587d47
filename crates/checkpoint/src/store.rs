//! Checkpoint storage trait and types
//!
//! This module defines the CheckpointStore trait for backend-agnostic
//! checkpoint storage operations, plus the persisted document shape.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Checkpoint document stored in a backend.
///
/// # File Format
///
/// ```json
/// {
///     "last_processed_modified": "2024-01-01T00:00:00.000000+00:00",
///     "database_type": "postgresql",
///     "updated_at": "2024-01-01T00:00:05.123Z"
/// }
/// ```
///
/// Only `last_processed_modified` is required when reading, so a document
/// containing just the cursor value is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCheckpoint {
    /// Serialized cursor, as produced by `Checkpoint::to_cli_string`
    #[serde(rename = "last_processed_modified")]
    pub checkpoint_data: String,
    /// Source type for validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_type: Option<String>,
    /// Timestamp when the document was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredCheckpoint {
    pub fn new(database_type: &str, checkpoint_data: String) -> Self {
        Self {
            checkpoint_data,
            database_type: Some(database_type.to_string()),
            updated_at: Some(Utc::now()),
        }
    }
}

/// Trait for checkpoint storage operations.
///
/// A store holds at most one checkpoint document. Every `store_checkpoint`
/// replaces it entirely.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Replace the stored checkpoint document.
    async fn store_checkpoint(&self, checkpoint: &StoredCheckpoint) -> Result<()>;

    /// Read the stored checkpoint document.
    ///
    /// Returns None if no checkpoint exists. Returns an error if one exists
    /// but cannot be read or decoded.
    async fn read_checkpoint(&self) -> Result<Option<StoredCheckpoint>>;

    /// Remove the stored checkpoint document. Removing a missing one is not an error.
    async fn clear_checkpoint(&self) -> Result<()>;
}
