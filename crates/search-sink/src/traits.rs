//! SearchSink trait definition.

use anyhow::Result;
use sync_core::Document;

use crate::BulkReport;

/// Trait for writing documents to a search index.
///
/// # Usage Pattern
///
/// The sync loop is generic over the sink:
///
/// ```ignore
/// async fn index<K: SearchSink>(sink: &K, documents: &[Document]) -> Result<()> {
///     let report = sink.upsert(documents).await?;
///     report.log(sink.name());
///     Ok(())
/// }
/// ```
#[async_trait::async_trait]
pub trait SearchSink: Send + Sync {
    /// Name of the target collection, used in log lines.
    fn name(&self) -> &str;

    /// Create the target collection with its fixed mapping if it does not exist.
    async fn ensure_collection(&self) -> Result<()>;

    /// Delete the target collection, if present, and create it again empty.
    async fn reset_collection(&self) -> Result<()>;

    /// Insert or fully replace each document by its `id`.
    ///
    /// Writes are visible to searches once this returns. Per-document
    /// rejections are reported in the [`BulkReport`]; `Err` means the
    /// request as a whole failed and nothing can be assumed written.
    async fn upsert(&self, documents: &[Document]) -> Result<BulkReport>;
}
