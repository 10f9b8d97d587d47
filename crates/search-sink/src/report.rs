//! Bulk upsert outcome.

use sync_core::Document;

/// A document the search engine rejected, with the engine's reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedDocument {
    pub document: Document,
    pub reason: String,
}

/// Result of one bulk upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: Vec<FailedDocument>,
}

impl BulkReport {
    /// Report for a batch where every document was written.
    pub fn all_succeeded(count: usize) -> Self {
        Self {
            succeeded: count,
            failed: Vec::new(),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Ids of the rejected documents, in batch order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.document.id.as_str()).collect()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: BulkReport) {
        self.succeeded += other.succeeded;
        self.failed.extend(other.failed);
    }

    /// Log the outcome for a batch written to `collection`.
    pub fn log(&self, collection: &str) {
        tracing::info!(
            "Successfully loaded {} documents into {}. Failed: {}",
            self.succeeded,
            collection,
            self.failed.len()
        );
        for failure in &self.failed {
            tracing::error!(
                "Failed to load document {} into {}: {}",
                failure.document.id,
                collection,
                failure.reason
            );
        }
    }
}
