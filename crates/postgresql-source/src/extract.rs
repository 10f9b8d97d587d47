//! Batch extraction of changed films.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sync_core::RawRecord;
use tokio::sync::Mutex;
use tokio_postgres::Client;
use tracing::{debug, info};

use crate::cursor::ModifiedCursor;
use crate::query::extract_batch_query;
use crate::row::row_to_raw_record;
use crate::SourceOpts;

/// Source of changed records, read in bounded batches ordered by `modified`.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Fetch up to `limit` records with `modified > cursor`, oldest first.
    ///
    /// An empty batch means the source is caught up.
    async fn extract_batch(&self, cursor: &ModifiedCursor, limit: usize)
        -> Result<Vec<RawRecord>>;

    /// Fetch every record newer than `start`, batch by batch.
    ///
    /// After each batch the lower bound moves to the batch's newest
    /// `modified`. The bound is exclusive, so rows sharing that exact
    /// timestamp which did not fit in the batch are not fetched by the next
    /// call.
    async fn extract_all(&self, start: &ModifiedCursor, limit: usize) -> Result<Vec<RawRecord>> {
        let mut cursor = *start;
        let mut all = Vec::new();

        loop {
            let batch = self.extract_batch(&cursor, limit).await?;
            let Some(latest) = ModifiedCursor::latest(batch.iter().map(|r| r.modified)) else {
                break;
            };
            if latest <= cursor {
                anyhow::bail!(
                    "Source returned records not newer than cursor {cursor} (newest: {latest})"
                );
            }

            debug!(
                "Extracted batch of {} records, advancing to {latest}",
                batch.len()
            );
            all.extend(batch);
            cursor = latest;
        }

        info!("Extracted {} records after {start}", all.len());
        Ok(all)
    }
}

/// [`BatchSource`] reading from PostgreSQL.
///
/// The connection is opened lazily and re-opened on the next call after it
/// has been closed, so a retried extraction can recover from a dropped
/// connection.
pub struct PostgresBatchSource {
    opts: SourceOpts,
    query: String,
    client: Mutex<Option<Client>>,
}

impl PostgresBatchSource {
    pub fn new(opts: SourceOpts) -> Self {
        let query = extract_batch_query(&opts.source_schema);
        Self {
            opts,
            query,
            client: Mutex::new(None),
        }
    }

    /// Create a source around an already connected client.
    pub fn with_client(opts: SourceOpts, client: Client) -> Self {
        let query = extract_batch_query(&opts.source_schema);
        Self {
            opts,
            query,
            client: Mutex::new(Some(client)),
        }
    }
}

#[async_trait]
impl BatchSource for PostgresBatchSource {
    async fn extract_batch(
        &self,
        cursor: &ModifiedCursor,
        limit: usize,
    ) -> Result<Vec<RawRecord>> {
        let mut guard = self.client.lock().await;

        if guard.as_ref().map_or(true, Client::is_closed) {
            debug!("Opening PostgreSQL connection");
            *guard = Some(crate::new_postgresql_client(&self.opts.source_uri).await?);
        }
        let Some(client) = guard.as_ref() else {
            anyhow::bail!("PostgreSQL client unavailable");
        };

        let limit = i64::try_from(limit).context("Batch limit out of range")?;
        let rows = client
            .query(&self.query, &[&cursor.timestamp, &limit])
            .await
            .with_context(|| format!("Failed to extract films modified after {cursor}"))?;

        debug!("Fetched {} rows modified after {cursor}", rows.len());

        rows.iter().map(row_to_raw_record).collect()
    }
}
