//! `_bulk` request encoding and response decoding.

use anyhow::{Context, Result};
use search_sink::{BulkReport, FailedDocument};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use sync_core::Document;

/// Build the NDJSON body: one `index` action line plus one source line per document.
pub fn build_bulk_body(index: &str, documents: &[Document]) -> Result<String> {
    let mut body = String::new();
    for document in documents {
        let action = json!({ "index": { "_index": index, "_id": document.id } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(
            &serde_json::to_string(document)
                .with_context(|| format!("Failed to encode document {}", document.id))?,
        );
        body.push('\n');
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItem {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub status: u16,
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItemError {
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: Option<String>,
}

/// Match response items to the documents sent, in order.
pub fn bulk_report(documents: &[Document], response: BulkResponse) -> Result<BulkReport> {
    if response.items.len() != documents.len() {
        anyhow::bail!(
            "Bulk response has {} items for {} documents",
            response.items.len(),
            documents.len()
        );
    }

    if !response.errors {
        return Ok(BulkReport::all_succeeded(documents.len()));
    }

    let mut report = BulkReport::default();
    for (document, item) in documents.iter().zip(response.items) {
        let Some(result) = item.into_values().next() else {
            report.failed.push(FailedDocument {
                document: document.clone(),
                reason: "empty bulk response item".to_string(),
            });
            continue;
        };

        match result.error {
            Some(error) => report.failed.push(FailedDocument {
                document: document.clone(),
                reason: format!(
                    "{} (status {}): {}",
                    error.kind,
                    result.status,
                    error.reason.unwrap_or_default()
                ),
            }),
            None if result.status >= 300 => report.failed.push(FailedDocument {
                document: document.clone(),
                reason: format!("status {}", result.status),
            }),
            None => report.succeeded += 1,
        }
    }
    Ok(report)
}
