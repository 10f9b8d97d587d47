//! Checkpoint management for film-sync
//!
//! Provides storage-agnostic handling of the sync cursor: the single
//! high-water mark that records how far the source has been processed.
//!
//! # Architecture
//!
//! - The `Checkpoint` trait is implemented by source-specific cursor types
//! - `CheckpointStore` abstracts where the cursor document lives
//! - `CheckpointManager` wraps a store with the sync loop's tolerance rules:
//!   a missing or corrupt checkpoint reads as the initial cursor, and a
//!   failed write is logged instead of aborting the loop
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - a single JSON document, rewritten on every save
//! - `MemoryStore` - process-local storage for tests and dry runs

mod filesystem;
mod manager;
mod memory;
pub mod store;


pub use filesystem::FilesystemStore;
pub use manager::CheckpointManager;
pub use memory::MemoryStore;
pub use store::{CheckpointStore, StoredCheckpoint};

/// Trait that source-specific checkpoints must implement.
///
/// # Example
///
/// ```rust
/// use checkpoint::Checkpoint;
/// use chrono::{DateTime, TimeZone, Utc};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct MyCursor {
///     pub timestamp: DateTime<Utc>,
/// }
///
/// impl Checkpoint for MyCursor {
///     const DATABASE_TYPE: &'static str = "mydatabase";
///
///     fn initial() -> Self {
///         Self { timestamp: Utc.timestamp_opt(0, 0).unwrap() }
///     }
///
///     fn to_cli_string(&self) -> String {
///         self.timestamp.to_rfc3339()
///     }
///
///     fn from_cli_string(s: &str) -> anyhow::Result<Self> {
///         Ok(Self {
///             timestamp: DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc),
///         })
///     }
/// }
/// ```
pub trait Checkpoint: Clone + Send + Sync {
    /// Source type identifier written next to the cursor value.
    ///
    /// A stored checkpoint tagged with a different type is ignored on load.
    const DATABASE_TYPE: &'static str;

    /// The cursor used when nothing has been processed yet.
    fn initial() -> Self;

    /// Convert to the string form persisted in the checkpoint document.
    ///
    /// The same format is accepted on the command line and shown in logs.
    fn to_cli_string(&self) -> String;

    /// Parse the format produced by `to_cli_string()`.
    fn from_cli_string(s: &str) -> anyhow::Result<Self>
    where
        Self: Sized;
}
