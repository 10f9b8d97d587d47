//! Search documents produced by the normalizer.

use serde::{Deserialize, Serialize};

/// A person credited on a film, decoded from one `id###name` token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: String,
    pub name: String,
}

impl PersonRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Film document as indexed into the search engine.
///
/// Every field is always serialized: optional scalars become `null` and
/// lists are written even when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub imdb_rating: Option<f64>,
    pub genres: Vec<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub directors_names: Vec<String>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub directors: Vec<PersonRef>,
    pub actors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
}

impl Document {
    /// Number of keys in the serialized document.
    pub const FIELD_COUNT: usize = 11;
}
