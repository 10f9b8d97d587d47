//! In-process sink.

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use sync_core::Document;
use tokio::sync::Mutex;

use crate::{BulkReport, FailedDocument, SearchSink};

#[derive(Default)]
struct State {
    exists: bool,
    documents: BTreeMap<String, Document>,
    rejected: HashSet<String>,
    upsert_calls: usize,
}

/// [`SearchSink`] holding documents in memory, keyed by id.
///
/// Used by `--dry-run` and by tests. Specific ids can be marked as rejected
/// to exercise partial bulk failures.
#[derive(Default)]
pub struct MemorySink {
    state: Mutex<State>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future upsert of `id` fail with a per-document error.
    pub async fn reject_id(&self, id: impl Into<String>) {
        self.state.lock().await.rejected.insert(id.into());
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        self.state.lock().await.documents.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn collection_exists(&self) -> bool {
        self.state.lock().await.exists
    }

    /// Number of `upsert` calls received, including empty ones.
    pub async fn upsert_calls(&self) -> usize {
        self.state.lock().await.upsert_calls
    }
}

#[async_trait::async_trait]
impl SearchSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_collection(&self) -> Result<()> {
        self.state.lock().await.exists = true;
        Ok(())
    }

    async fn reset_collection(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.documents.clear();
        state.exists = true;
        Ok(())
    }

    async fn upsert(&self, documents: &[Document]) -> Result<BulkReport> {
        let mut state = self.state.lock().await;
        state.upsert_calls += 1;
        state.exists = true;

        let mut report = BulkReport::default();
        for document in documents {
            if state.rejected.contains(&document.id) {
                report.failed.push(FailedDocument {
                    document: document.clone(),
                    reason: "rejected by memory sink".to_string(),
                });
                continue;
            }
            state
                .documents
                .insert(document.id.clone(), document.clone());
            report.succeeded += 1;
        }

        tracing::debug!(
            "Memory sink stored {} documents ({} total)",
            report.succeeded,
            state.documents.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::PersonRef;

    fn document(id: &str, title: &str) -> Document {
        Document {
            id: id.to_string(),
            imdb_rating: None,
            genres: vec![],
            title: Some(title.to_string()),
            description: None,
            directors_names: vec![],
            actors_names: vec![],
            writers_names: vec![],
            directors: vec![],
            actors: vec![],
            writers: vec![],
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_document() {
        let sink = MemorySink::new();

        let mut first = document("1", "Original");
        first.actors = vec![PersonRef::new("a", "Someone")];
        first.actors_names = vec!["Someone".to_string()];
        sink.upsert(&[first]).await.unwrap();

        let second = document("1", "Replacement");
        sink.upsert(&[second.clone()]).await.unwrap();

        assert_eq!(sink.len().await, 1);
        // Full replace, not merge: the actors from the first version are gone
        assert_eq!(sink.get("1").await, Some(second));
    }

    #[tokio::test]
    async fn test_empty_upsert_is_noop_success() {
        let sink = MemorySink::new();
        let report = sink.upsert(&[]).await.unwrap();

        assert_eq!(report, BulkReport::default());
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejected_ids_are_reported() {
        let sink = MemorySink::new();
        sink.reject_id("2").await;

        let report = sink
            .upsert(&[document("1", "a"), document("2", "b"), document("3", "c")])
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed_ids(), vec!["2"]);
        assert!(sink.get("2").await.is_none());
    }

    #[tokio::test]
    async fn test_reset_collection_clears_documents() {
        let sink = MemorySink::new();
        sink.upsert(&[document("1", "a")]).await.unwrap();

        sink.reset_collection().await.unwrap();
        assert!(sink.is_empty().await);
        assert!(sink.collection_exists().await);
    }

    #[test]
    fn test_report_merge() {
        let mut total = BulkReport::all_succeeded(3);
        total.merge(BulkReport {
            succeeded: 1,
            failed: vec![FailedDocument {
                document: document("9", "x"),
                reason: "mapper_parsing_exception".to_string(),
            }],
        });

        assert_eq!(total.succeeded, 4);
        assert!(total.has_failures());
        assert_eq!(total.failed_ids(), vec!["9"]);
    }
}
