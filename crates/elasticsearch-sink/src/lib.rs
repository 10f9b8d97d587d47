//! Elasticsearch implementation of [`SearchSink`].
//!
//! Talks to the REST API directly: index existence and creation through
//! `HEAD`/`PUT /{index}`, writes through `POST /_bulk`.

mod bulk;
mod mapping;

pub use bulk::{build_bulk_body, bulk_report, BulkResponse};
pub use mapping::index_body;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use search_sink::{BulkReport, SearchSink};
use std::time::Duration;
use sync_core::Document;

/// Connection options for the Elasticsearch sink.
#[derive(Debug, Clone)]
pub struct ElasticOpts {
    /// Base URL, e.g. `http://localhost:9200`.
    pub host: String,
    pub index: String,
    pub request_timeout: Duration,
}

impl ElasticOpts {
    pub fn new(host: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            index: index.into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct ElasticsearchSink {
    client: Client,
    base_url: String,
    index: String,
}

impl ElasticsearchSink {
    pub fn new(opts: ElasticOpts) -> Result<Self> {
        let client = Client::builder()
            .timeout(opts.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: opts.host.trim_end_matches('/').to_string(),
            index: opts.index,
        })
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    async fn index_exists(&self) -> Result<bool> {
        let response = self
            .client
            .head(self.index_url())
            .send()
            .await
            .with_context(|| format!("Failed to check index {}", self.index))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => anyhow::bail!("Unexpected status {status} checking index {}", self.index),
        }
    }

    async fn create_index(&self) -> Result<()> {
        let response = self
            .client
            .put(self.index_url())
            .json(&index_body())
            .send()
            .await
            .with_context(|| format!("Failed to create index {}", self.index))?;

        if response.status().is_success() {
            tracing::info!("Created index {}", self.index);
            return Ok(());
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        // Another writer may have created it between HEAD and PUT
        if status == StatusCode::BAD_REQUEST && text.contains("resource_already_exists_exception")
        {
            tracing::debug!("Index {} already exists", self.index);
            return Ok(());
        }
        anyhow::bail!("Creating index {} failed with {status}: {text}", self.index)
    }
}

async fn error_for_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    anyhow::bail!("{action} failed with {status}: {text}")
}

#[async_trait::async_trait]
impl SearchSink for ElasticsearchSink {
    fn name(&self) -> &str {
        &self.index
    }

    async fn ensure_collection(&self) -> Result<()> {
        if self.index_exists().await? {
            tracing::debug!("Index {} exists", self.index);
            return Ok(());
        }
        self.create_index().await
    }

    async fn reset_collection(&self) -> Result<()> {
        let response = self
            .client
            .delete(self.index_url())
            .send()
            .await
            .with_context(|| format!("Failed to delete index {}", self.index))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Index {} did not exist", self.index);
        } else {
            error_for_status(response, &format!("Deleting index {}", self.index)).await?;
            tracing::info!("Deleted index {}", self.index);
        }

        self.create_index().await
    }

    async fn upsert(&self, documents: &[Document]) -> Result<BulkReport> {
        if documents.is_empty() {
            return Ok(BulkReport::default());
        }

        let body = build_bulk_body(&self.index, documents)?;
        tracing::debug!(
            "Sending bulk request with {} documents to {}",
            documents.len(),
            self.index
        );

        let response = self
            .client
            .post(format!("{}/_bulk?refresh=wait_for", self.base_url))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .context("Bulk request failed")?;
        let response = error_for_status(response, "Bulk request").await?;

        let parsed: BulkResponse = response
            .json()
            .await
            .context("Failed to decode bulk response")?;
        bulk_report(documents, parsed)
    }
}
