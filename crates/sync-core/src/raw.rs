//! Raw values and records as produced by the extractor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Loosely-typed source value.
///
/// `RawValue` keeps whatever the source returned, including placeholder
/// strings and malformed numbers, so that every cleaning decision is made
/// in one place by the normalizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// SQL NULL or an absent column
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Text value
    Text(String),

    /// UUID value
    Uuid(Uuid),

    /// Array of values (aggregated columns)
    Array(Vec<RawValue>),
}

impl RawValue {
    /// Create a text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Create an array of text values.
    pub fn text_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Array(items.into_iter().map(|s| Self::Text(s.into())).collect())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as an array.
    pub fn as_array(&self) -> Option<&[RawValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// String form of a value, used wherever a non-text value must be treated as text.
impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Uuid> for RawValue {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<f64> for RawValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// One film row with its genres and people aggregated.
///
/// People columns hold `id###name` encoded strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// Stable identifier; `Null` means the source violated its contract
    #[serde(default)]
    pub id: RawValue,
    #[serde(default)]
    pub title: RawValue,
    #[serde(default)]
    pub description: RawValue,
    #[serde(default, alias = "imdb_rating")]
    pub rating: RawValue,
    /// Modification timestamp, the ordering key for extraction
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub genres: RawValue,
    #[serde(default)]
    pub actors: RawValue,
    #[serde(default)]
    pub writers: RawValue,
    #[serde(default)]
    pub directors: RawValue,
}
