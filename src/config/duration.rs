//! Duration parsing utilities.

use anyhow::Context;
use std::time::Duration;

/// Parse a duration string like "1h", "30m", "5s", "500ms", "5" or "2.5".
/// Supports:
/// - Plain numbers, integer or fractional (interpreted as seconds): "5", "5.0"
/// - Milliseconds suffix: "500ms"
/// - Seconds suffix: "5s", "0.5s"
/// - Minutes suffix: "30m"
/// - Hours suffix: "1h"
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    // "ms" must be checked before "m" and "s"
    if let Some(num_str) = s.strip_suffix("ms") {
        let millis: u64 = num_str
            .trim()
            .parse()
            .with_context(|| format!("Invalid milliseconds value: {num_str}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(num_str) = s.strip_suffix('h') {
        return seconds(num_str, 3600.0).with_context(|| format!("Invalid hours value: {num_str}"));
    }
    if let Some(num_str) = s.strip_suffix('m') {
        return seconds(num_str, 60.0).with_context(|| format!("Invalid minutes value: {num_str}"));
    }
    if let Some(num_str) = s.strip_suffix('s') {
        return seconds(num_str, 1.0).with_context(|| format!("Invalid seconds value: {num_str}"));
    }

    // No suffix - treat as seconds
    seconds(s, 1.0).with_context(|| format!("Invalid duration value: {s}"))
}

fn seconds(num_str: &str, scale: f64) -> anyhow::Result<Duration> {
    let value: f64 = num_str.trim().parse()?;
    Ok(Duration::try_from_secs_f64(value * scale)?)
}

/// `value_parser` adapter for clap.
pub fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| format!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("5.0").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2.5").unwrap(), Duration::from_millis(2500));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration(" 30s ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("5x").is_err());
        assert!(parse_duration("1.5ms").is_err());
    }
}
