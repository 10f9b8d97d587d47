//! Modification-timestamp cursor
//!
//! The cursor marks the newest `modified` value whose row has been indexed.
//! Extraction resumes strictly after it.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fmt;

/// Cursor over the source's `modified` column, microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModifiedCursor {
    pub timestamp: DateTime<Utc>,
}

impl ModifiedCursor {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }

    /// Cursor that precedes every row: `1900-01-01T00:00:00+00:00`.
    pub fn sentinel() -> Self {
        let timestamp = NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { timestamp }
    }

    /// Cursor at the newest of the given timestamps, if any.
    pub fn latest<I>(timestamps: I) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        timestamps.into_iter().max().map(Self::new)
    }
}

impl fmt::Display for ModifiedCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false))
    }
}

impl checkpoint::Checkpoint for ModifiedCursor {
    const DATABASE_TYPE: &'static str = "postgresql";

    fn initial() -> Self {
        Self::sentinel()
    }

    fn to_cli_string(&self) -> String {
        self.to_string()
    }

    /// Accepts RFC 3339 and the PostgreSQL text form (`1970-01-01 00:00:00.000000+00`).
    fn from_cli_string(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = DateTime::parse_from_rfc3339(s)
            .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
            .map_err(|e| anyhow::anyhow!("Invalid cursor timestamp '{s}': {e}"))?;

        Ok(Self {
            timestamp: parsed.with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkpoint::{Checkpoint, CheckpointManager, MemoryStore};
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_sentinel_value() {
        let sentinel = ModifiedCursor::sentinel();
        assert_eq!(sentinel.timestamp.year(), 1900);
        assert_eq!(sentinel.timestamp.month(), 1);
        assert_eq!(sentinel.timestamp.day(), 1);
        assert_eq!(sentinel.timestamp.hour(), 0);
        assert_eq!(ModifiedCursor::initial(), sentinel);
        assert_eq!(sentinel.to_cli_string(), "1900-01-01T00:00:00.000000+00:00");
    }

    #[test]
    fn test_cli_string_roundtrip_keeps_microseconds() {
        let original = ModifiedCursor::new(
            Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 45).unwrap()
                + chrono::Duration::microseconds(123_456),
        );

        let cli_string = original.to_cli_string();
        assert_eq!(cli_string, "2024-03-05T12:30:45.123456+00:00");

        let decoded = ModifiedCursor::from_cli_string(&cli_string).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_from_cli_string_postgres_text_form() {
        let decoded = ModifiedCursor::from_cli_string("1970-01-01 00:00:00.000000+00").unwrap();
        assert_eq!(decoded.timestamp, Utc.timestamp_opt(0, 0).unwrap());

        let offset = ModifiedCursor::from_cli_string("2024-01-01T03:00:00+03:00").unwrap();
        assert_eq!(
            offset.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_from_cli_string_invalid() {
        assert!(ModifiedCursor::from_cli_string("yesterday").is_err());
        assert!(ModifiedCursor::from_cli_string("").is_err());
    }

    #[test]
    fn test_latest() {
        let a = Utc.timestamp_opt(10, 0).unwrap();
        let b = Utc.timestamp_opt(30, 0).unwrap();
        let c = Utc.timestamp_opt(20, 0).unwrap();

        assert_eq!(ModifiedCursor::latest([a, b, c]), Some(ModifiedCursor::new(b)));
        assert_eq!(ModifiedCursor::latest(Vec::new()), None);
    }

    #[test]
    fn test_ordering() {
        let older = ModifiedCursor::new(Utc.timestamp_opt(1, 0).unwrap());
        let newer = ModifiedCursor::new(Utc.timestamp_opt(2, 0).unwrap());
        assert!(ModifiedCursor::sentinel() < older);
        assert!(older < newer);
    }

    #[tokio::test]
    async fn test_cursor_save_load_roundtrip() {
        let manager = CheckpointManager::new(MemoryStore::new());
        let original = ModifiedCursor::new(Utc.with_ymd_and_hms(2023, 7, 1, 8, 0, 0).unwrap());

        manager.set(&original).await;
        let loaded: ModifiedCursor = manager.get().await;

        assert_eq!(original, loaded);
        let stored = manager.store().snapshot().await.unwrap();
        assert_eq!(stored.database_type.as_deref(), Some("postgresql"));
    }
}
