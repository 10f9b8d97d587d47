//! In-memory doubles for exercising the sync loop without PostgreSQL,
//! Elasticsearch or wall-clock delays.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use film_sync_postgresql_source::{BatchSource, ModifiedCursor};
use std::sync::Mutex;
use std::time::Duration;
use sync_core::{RawRecord, RawValue};

use crate::retry::Sleeper;

/// [`Sleeper`] that returns immediately and remembers every requested delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.delays().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    records: Vec<RawRecord>,
    cursors: Vec<ModifiedCursor>,
    failures_left: usize,
}

/// [`BatchSource`] over a fixed list of records.
///
/// Behaves like the SQL query: records newer than the cursor, oldest first,
/// at most `limit`. Records can be added between calls and the next calls
/// can be made to fail.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    state: Mutex<ScriptState>,
}

impl ScriptedSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        let source = Self::default();
        source.push(records);
        source
    }

    pub fn push(&self, records: Vec<RawRecord>) {
        if let Ok(mut state) = self.state.lock() {
            state.records.extend(records);
            state.records.sort_by_key(|r| r.modified);
        }
    }

    /// Make the next `count` extraction calls fail with a transport error.
    pub fn fail_next(&self, count: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.failures_left = count;
        }
    }

    /// Cursor passed to each extraction call, failed calls included.
    pub fn cursors(&self) -> Vec<ModifiedCursor> {
        self.state
            .lock()
            .map(|s| s.cursors.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.cursors().len()
    }
}

#[async_trait]
impl BatchSource for ScriptedSource {
    async fn extract_batch(&self, cursor: &ModifiedCursor, limit: usize) -> Result<Vec<RawRecord>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("scripted source lock poisoned"))?;
        state.cursors.push(*cursor);

        if state.failures_left > 0 {
            state.failures_left -= 1;
            anyhow::bail!("connection refused");
        }

        Ok(state
            .records
            .iter()
            .filter(|r| r.modified > cursor.timestamp)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Timestamp `minutes` after 2024-01-01T00:00:00Z.
pub fn minutes(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
        + chrono::Duration::minutes(minutes)
}

/// A minimal well-formed film row.
pub fn film(id: &str, title: &str, modified: DateTime<Utc>) -> RawRecord {
    RawRecord {
        id: RawValue::from(id),
        title: RawValue::from(title),
        modified,
        ..RawRecord::default()
    }
}
