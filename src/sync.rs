//! Sync loop: extract, normalize, index, advance the checkpoint.
//!
//! # Cycle
//!
//! Each cycle reads one batch of films modified after the cursor, turns
//! them into search documents, bulk-upserts them and moves the cursor to
//! the newest `modified` in the batch. The loop alternates between two
//! states:
//!
//! - [`SyncState::CatchingUp`]: the last batch had records, so run the next
//!   cycle immediately.
//! - [`SyncState::Idle`]: the last batch was empty, so sleep for the poll
//!   interval before trying again.
//!
//! # Checkpointing
//!
//! The cursor is persisted after every batch whose bulk request returned,
//! including batches where some documents were rejected. Rejected documents
//! are logged with their ids and are not retried until the film is modified
//! again.
//!
//! Cancellation is checked between cycles and during the idle sleep, never
//! in the middle of a batch.

use anyhow::{Context, Result};
use checkpoint::{CheckpointManager, CheckpointStore};
use film_sync_postgresql_source::{BatchSource, ModifiedCursor};
use search_sink::{BulkReport, SearchSink};
use std::time::Duration;
use sync_core::{normalize_all, RawRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::retry::{RetryPolicy, Sleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOpts {
    /// Maximum records per extraction, and per bulk request during full reload
    pub batch_size: usize,
    /// Sleep when a poll finds nothing new
    pub poll_interval: Duration,
}

impl Default for LoopOpts {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    CatchingUp,
    Idle,
}

/// Outcome of one cycle or of a full reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub extracted: usize,
    pub indexed: usize,
    pub failed: usize,
    pub cursor: ModifiedCursor,
}

impl CycleStats {
    fn log(&self) {
        info!(
            "Cycle done: extracted {}, indexed {}, failed {}, cursor {}",
            self.extracted, self.indexed, self.failed, self.cursor
        );
    }
}

pub struct SyncLoop<S, K, CS, Z>
where
    S: BatchSource,
    K: SearchSink,
    CS: CheckpointStore,
    Z: Sleeper,
{
    source: S,
    sink: K,
    checkpoints: CheckpointManager<CS>,
    sleeper: Z,
    retry: RetryPolicy,
    opts: LoopOpts,
    cursor: ModifiedCursor,
}

impl<S, K, CS, Z> SyncLoop<S, K, CS, Z>
where
    S: BatchSource,
    K: SearchSink,
    CS: CheckpointStore,
    Z: Sleeper,
{
    /// Build the loop and load the stored cursor.
    pub async fn new(
        source: S,
        sink: K,
        checkpoints: CheckpointManager<CS>,
        sleeper: Z,
        retry: RetryPolicy,
        opts: LoopOpts,
    ) -> Self {
        let cursor = checkpoints.get::<ModifiedCursor>().await;
        Self {
            source,
            sink,
            checkpoints,
            sleeper,
            retry,
            opts,
            cursor,
        }
    }

    /// Replace the loaded cursor for this run.
    pub fn start_from(&mut self, cursor: ModifiedCursor) {
        info!("Overriding stored cursor {} with {cursor}", self.cursor);
        self.cursor = cursor;
    }

    pub fn cursor(&self) -> ModifiedCursor {
        self.cursor
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn checkpoints(&self) -> &CheckpointManager<CS> {
        &self.checkpoints
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Run until `shutdown` is cancelled or an external call fails for good.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        let sink = &self.sink;
        self.retry
            .run("ensure_collection", &self.sleeper, move || {
                sink.ensure_collection()
            })
            .await
            .with_context(|| format!("Failed to prepare collection {}", self.sink.name()))?;

        info!(
            "Starting sync into {} from {} (batch size {}, poll interval {:?})",
            self.sink.name(),
            self.cursor,
            self.opts.batch_size,
            self.opts.poll_interval
        );

        let mut state = SyncState::CatchingUp;
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            state = match state {
                SyncState::Idle => tokio::select! {
                    _ = shutdown.cancelled() => break,
                    next = self.step(SyncState::Idle) => next?,
                },
                SyncState::CatchingUp => self.step(SyncState::CatchingUp).await?,
            };
        }

        info!("Shutdown requested, stopping at cursor {}", self.cursor);
        Ok(())
    }

    /// Advance the state machine by one transition.
    pub async fn step(&mut self, state: SyncState) -> Result<SyncState> {
        match state {
            SyncState::CatchingUp => {
                let stats = self.run_cycle().await?;
                if stats.extracted == 0 {
                    debug!("No changes after {}, idling", self.cursor);
                    return Ok(SyncState::Idle);
                }
                stats.log();
                Ok(SyncState::CatchingUp)
            }
            SyncState::Idle => {
                self.sleeper.sleep(self.opts.poll_interval).await;
                Ok(SyncState::CatchingUp)
            }
        }
    }

    /// Extract, normalize and index one batch, then advance the cursor.
    pub async fn run_cycle(&mut self) -> Result<CycleStats> {
        let records = self.extract(self.cursor).await?;

        let mut stats = CycleStats {
            extracted: records.len(),
            indexed: 0,
            failed: 0,
            cursor: self.cursor,
        };
        let Some(latest) = ModifiedCursor::latest(records.iter().map(|r| r.modified)) else {
            return Ok(stats);
        };

        let documents = normalize_all(&records)
            .with_context(|| format!("Failed to normalize batch after {}", self.cursor))?;

        let report = self.index(&documents).await?;
        report.log(self.sink.name());
        if report.has_failures() {
            warn!(
                "Advancing cursor past {} documents that were not indexed: {:?}",
                report.failed.len(),
                report.failed_ids()
            );
        }

        self.advance(latest).await;
        stats.indexed = report.succeeded;
        stats.failed = report.failed.len();
        stats.cursor = self.cursor;
        Ok(stats)
    }

    /// Rebuild the collection from scratch.
    ///
    /// Deletes the checkpoint, recreates the collection, indexes every film
    /// in chunks of `batch_size` and stores the resulting cursor.
    pub async fn full_reload(&mut self) -> Result<CycleStats> {
        info!("Starting full reload into {}", self.sink.name());

        self.checkpoints
            .reset()
            .await
            .context("Failed to delete checkpoint")?;
        self.cursor = ModifiedCursor::sentinel();

        let sink = &self.sink;
        self.retry
            .run("reset_collection", &self.sleeper, move || {
                sink.reset_collection()
            })
            .await
            .with_context(|| format!("Failed to reset collection {}", self.sink.name()))?;

        // Same walk as `BatchSource::extract_all`, with each batch retried on its own
        let limit = self.opts.batch_size;
        let mut records = Vec::new();
        let mut position = ModifiedCursor::sentinel();
        loop {
            let batch = self.extract(position).await?;
            let Some(latest) = ModifiedCursor::latest(batch.iter().map(|r| r.modified)) else {
                break;
            };
            if latest <= position {
                anyhow::bail!(
                    "Source returned records not newer than cursor {position} (newest: {latest})"
                );
            }
            debug!("Extracted {} films up to {latest}", batch.len());
            records.extend(batch);
            position = latest;
        }

        let documents = normalize_all(&records).context("Failed to normalize films")?;

        let mut report = BulkReport::default();
        for chunk in documents.chunks(limit) {
            report.merge(self.index(chunk).await?);
        }
        report.log(self.sink.name());

        match ModifiedCursor::latest(records.iter().map(|r| r.modified)) {
            Some(latest) => self.advance(latest).await,
            None => {
                self.checkpoints.set(&self.cursor).await;
            }
        }

        let stats = CycleStats {
            extracted: records.len(),
            indexed: report.succeeded,
            failed: report.failed.len(),
            cursor: self.cursor,
        };
        info!(
            "Full reload done: extracted {}, indexed {}, failed {}, cursor {}",
            stats.extracted, stats.indexed, stats.failed, stats.cursor
        );
        Ok(stats)
    }

    async fn extract(&self, cursor: ModifiedCursor) -> Result<Vec<RawRecord>> {
        let source = &self.source;
        let cursor_ref = &cursor;
        let limit = self.opts.batch_size;
        self.retry
            .run("extract_batch", &self.sleeper, move || {
                source.extract_batch(cursor_ref, limit)
            })
            .await
            .with_context(|| format!("Failed to extract changes after {cursor}"))
    }

    async fn index(&self, documents: &[sync_core::Document]) -> Result<BulkReport> {
        let sink = &self.sink;
        self.retry
            .run("bulk upsert", &self.sleeper, move || sink.upsert(documents))
            .await
            .with_context(|| {
                format!(
                    "Failed to index {} documents into {}",
                    documents.len(),
                    self.sink.name()
                )
            })
    }

    /// Move the cursor forward, never back, and persist it.
    async fn advance(&mut self, latest: ModifiedCursor) {
        if latest > self.cursor {
            self.cursor = latest;
        }
        self.checkpoints.set(&self.cursor).await;
    }
}
