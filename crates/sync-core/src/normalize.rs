//! Cleaning rules that turn a [`RawRecord`] into a [`Document`].
//!
//! All functions here are pure. Placeholder markers used by the source for
//! missing data (`"N/A"`, `"None"`) are mapped to null, people tokens are
//! decoded from their `id###name` form, and the rating is coerced to a
//! finite float when possible.

use crate::document::{Document, PersonRef};
use crate::raw::{RawRecord, RawValue};

/// Values that mean "not available" once trimmed. Matching is case-sensitive.
const PLACEHOLDERS: [&str; 2] = ["N/A", "None"];

/// Separator between person id and person name in aggregated columns.
const PERSON_DELIMITER: &str = "###";

/// Errors raised for records that break the source contract.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("record modified at {modified} has no id")]
    MissingId { modified: String },
}

/// Trim a value and map placeholders to `None`.
///
/// Non-text values are stringified first, so `Int(7)` cleans to `"7"`.
pub fn clean_value(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Null => None,
        RawValue::Text(s) => clean_str(s),
        other => clean_str(&other.to_string()),
    }
}

fn clean_str(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if PLACEHOLDERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Decode a list of `id###name` tokens.
///
/// Anything that is not a list yields an empty list. Non-text elements,
/// elements that clean to nothing, tokens that do not split into exactly
/// two parts, and tokens whose name cleans to nothing are skipped. Order is
/// preserved.
pub fn parse_person_list(raw: &RawValue) -> Vec<PersonRef> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let RawValue::Text(text) = item else {
                return None;
            };
            let token = clean_str(text).filter(|t| !t.is_empty())?;

            let parts: Vec<&str> = token.splitn(3, PERSON_DELIMITER).collect();
            let [id, name] = parts.as_slice() else {
                return None;
            };

            let id = id.trim();
            let name = clean_str(name).filter(|n| !n.is_empty())?;
            if id.is_empty() {
                return None;
            }
            Some(PersonRef::new(id, name))
        })
        .collect()
}

/// Clean each genre, dropping placeholders and nulls.
///
/// Duplicates are kept; the source query already aggregates distinct names.
pub fn parse_genres(raw: &RawValue) -> Vec<String> {
    raw.as_array()
        .map(|items| items.iter().filter_map(clean_value).collect())
        .unwrap_or_default()
}

/// Coerce a rating to a finite float.
pub fn parse_rating(raw: &RawValue) -> Option<f64> {
    let value = match raw {
        RawValue::Float(x) => *x,
        RawValue::Int(i) => *i as f64,
        RawValue::Bool(b) => f64::from(u8::from(*b)),
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Null | RawValue::Uuid(_) | RawValue::Array(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Normalize one record into a search document.
pub fn normalize(record: &RawRecord) -> Result<Document, NormalizeError> {
    if record.id.is_null() {
        return Err(NormalizeError::MissingId {
            modified: record.modified.to_rfc3339(),
        });
    }

    let directors = parse_person_list(&record.directors);
    let actors = parse_person_list(&record.actors);
    let writers = parse_person_list(&record.writers);

    Ok(Document {
        id: record.id.to_string(),
        imdb_rating: parse_rating(&record.rating),
        genres: parse_genres(&record.genres),
        title: clean_value(&record.title),
        description: clean_value(&record.description),
        directors_names: names(&directors),
        actors_names: names(&actors),
        writers_names: names(&writers),
        directors,
        actors,
        writers,
    })
}

/// Normalize a batch, preserving order. The first failing record aborts the batch.
pub fn normalize_all(records: &[RawRecord]) -> Result<Vec<Document>, NormalizeError> {
    records.iter().map(normalize).collect()
}

fn names(people: &[PersonRef]) -> Vec<String> {
    people.iter().map(|p| p.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_values() -> Vec<RawValue> {
        vec![
            RawValue::Null,
            RawValue::text(""),
            RawValue::text("   "),
            RawValue::text("N/A"),
            RawValue::text(" N/A "),
            RawValue::text("None"),
            RawValue::text("none"),
            RawValue::text("n/a"),
            RawValue::text("  Matrix  "),
            RawValue::text(" None of the above "),
            RawValue::Int(42),
            RawValue::Float(8.7),
            RawValue::Bool(false),
            RawValue::Uuid(Uuid::nil()),
            RawValue::Array(vec![RawValue::Null]),
        ]
    }

    // ------------------------------------------------------------------------
    // clean_value
    // ------------------------------------------------------------------------

    #[test]
    fn test_clean_value_placeholders() {
        assert_eq!(clean_value(&RawValue::Null), None);
        assert_eq!(clean_value(&RawValue::text("N/A")), None);
        assert_eq!(clean_value(&RawValue::text("  None\t")), None);
        // Case-sensitive
        assert_eq!(clean_value(&RawValue::text("none")), Some("none".to_string()));
        assert_eq!(clean_value(&RawValue::text("n/a")), Some("n/a".to_string()));
    }

    #[test]
    fn test_clean_value_trims() {
        assert_eq!(
            clean_value(&RawValue::text("  The Matrix \n")),
            Some("The Matrix".to_string())
        );
        assert_eq!(clean_value(&RawValue::text("   ")), Some(String::new()));
    }

    #[test]
    fn test_clean_value_stringifies_non_text() {
        assert_eq!(clean_value(&RawValue::Int(7)), Some("7".to_string()));
        assert_eq!(clean_value(&RawValue::Float(8.7)), Some("8.7".to_string()));
        assert_eq!(
            clean_value(&RawValue::Uuid(Uuid::nil())),
            Some("00000000-0000-0000-0000-000000000000".to_string())
        );
    }

    #[test]
    fn test_clean_value_is_idempotent() {
        for value in sample_values() {
            let once = clean_value(&value);
            let twice = clean_value(&RawValue::from(once.clone()));
            assert_eq!(once, twice, "clean_value not idempotent for {value:?}");
        }
    }

    // ------------------------------------------------------------------------
    // parse_person_list
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_person_list_valid_entries() {
        let raw = RawValue::text_array(["1###Keanu Reeves", " 2 ### Carrie-Anne Moss "]);
        assert_eq!(
            parse_person_list(&raw),
            vec![
                PersonRef::new("1", "Keanu Reeves"),
                PersonRef::new("2", "Carrie-Anne Moss"),
            ]
        );
    }

    #[test]
    fn test_parse_person_list_non_list_input() {
        assert!(parse_person_list(&RawValue::Null).is_empty());
        assert!(parse_person_list(&RawValue::text("1###Keanu Reeves")).is_empty());
        assert!(parse_person_list(&RawValue::Array(vec![])).is_empty());
    }

    #[test]
    fn test_parse_person_list_skips_bad_entries() {
        let raw = RawValue::Array(vec![
            RawValue::Null,
            RawValue::Int(5),
            RawValue::text(""),
            RawValue::text("N/A"),
            RawValue::text("no delimiter"),
            RawValue::text("1###a###b"),
            RawValue::text("2###None"),
            RawValue::text("3###N/A"),
            RawValue::text("4###   "),
            RawValue::text("###Nameless Id"),
            RawValue::text("5###Hugo Weaving"),
        ]);
        assert_eq!(
            parse_person_list(&raw),
            vec![PersonRef::new("5", "Hugo Weaving")]
        );
    }

    #[test]
    fn test_parse_person_list_id_not_placeholder_checked() {
        let raw = RawValue::text_array(["N/A###Someone"]);
        assert_eq!(parse_person_list(&raw), vec![PersonRef::new("N/A", "Someone")]);
    }

    #[test]
    fn test_parse_person_list_never_emits_empty_or_split_names() {
        let raw = RawValue::text_array([
            "1###x",
            "2######",
            "3###y###z",
            "###",
            "4###  None  ",
            "5### ok ",
        ]);
        for person in parse_person_list(&raw) {
            assert!(!person.name.is_empty());
            assert!(!person.id.is_empty());
            assert!(!person.name.contains(PERSON_DELIMITER));
            assert!(!person.id.contains(PERSON_DELIMITER));
        }
    }

    // ------------------------------------------------------------------------
    // parse_genres / parse_rating
    // ------------------------------------------------------------------------

    #[test]
    fn test_parse_genres_drops_placeholders_keeps_order() {
        let raw = RawValue::Array(vec![
            RawValue::text("Drama"),
            RawValue::Null,
            RawValue::text(" N/A "),
            RawValue::text(" Action "),
            RawValue::text("Drama"),
        ]);
        assert_eq!(parse_genres(&raw), vec!["Drama", "Action", "Drama"]);
        assert!(parse_genres(&RawValue::Null).is_empty());
    }

    #[test]
    fn test_parse_rating() {
        assert_eq!(parse_rating(&RawValue::Float(8.7)), Some(8.7));
        assert_eq!(parse_rating(&RawValue::Int(9)), Some(9.0));
        assert_eq!(parse_rating(&RawValue::text(" 7.25 ")), Some(7.25));
        assert_eq!(parse_rating(&RawValue::Bool(true)), Some(1.0));
        assert_eq!(parse_rating(&RawValue::Null), None);
        assert_eq!(parse_rating(&RawValue::text("N/A")), None);
        assert_eq!(parse_rating(&RawValue::text("abc")), None);
        assert_eq!(parse_rating(&RawValue::text("NaN")), None);
        assert_eq!(parse_rating(&RawValue::text("inf")), None);
        assert_eq!(parse_rating(&RawValue::Float(f64::NEG_INFINITY)), None);
        assert_eq!(parse_rating(&RawValue::Float(f64::NAN)), None);
    }

    // ------------------------------------------------------------------------
    // normalize
    // ------------------------------------------------------------------------

    #[test]
    fn test_normalize_matrix_scenario() {
        let record = RawRecord {
            id: RawValue::Int(7),
            title: RawValue::text(" Matrix "),
            description: RawValue::text("N/A"),
            rating: RawValue::text("8.7"),
            modified: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            genres: RawValue::Array(vec![RawValue::text("Action"), RawValue::Null]),
            actors: RawValue::text_array(["1###Keanu Reeves", "2###None"]),
            ..Default::default()
        };

        let document = normalize(&record).unwrap();

        assert_eq!(
            document,
            Document {
                id: "7".to_string(),
                imdb_rating: Some(8.7),
                genres: vec!["Action".to_string()],
                title: Some("Matrix".to_string()),
                description: None,
                directors_names: vec![],
                actors_names: vec!["Keanu Reeves".to_string()],
                writers_names: vec![],
                directors: vec![],
                actors: vec![PersonRef::new("1", "Keanu Reeves")],
                writers: vec![],
            }
        );
    }

    #[test]
    fn test_normalize_always_serializes_every_field() {
        let record = RawRecord {
            id: RawValue::Uuid(Uuid::nil()),
            ..Default::default()
        };
        let json = serde_json::to_value(normalize(&record).unwrap()).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), Document::FIELD_COUNT);
        for key in [
            "genres",
            "directors_names",
            "actors_names",
            "writers_names",
            "directors",
            "actors",
            "writers",
        ] {
            assert!(object[key].is_array(), "{key} should be an array");
        }
        for key in ["imdb_rating", "title", "description"] {
            assert!(object[key].is_null(), "{key} should be null");
        }
    }

    #[test]
    fn test_normalize_names_follow_people_order() {
        let record = RawRecord {
            id: RawValue::text("abc"),
            directors: RawValue::text_array(["2###Lana", "1###Lilly"]),
            writers: RawValue::text_array(["9###N/A", "8###Lilly"]),
            ..Default::default()
        };
        let document = normalize(&record).unwrap();

        assert_eq!(document.directors_names, vec!["Lana", "Lilly"]);
        assert_eq!(document.writers_names, vec!["Lilly"]);
        assert_eq!(document.writers, vec![PersonRef::new("8", "Lilly")]);
    }

    #[test]
    fn test_normalize_id_is_stringified_not_cleaned() {
        let record = RawRecord {
            id: RawValue::text(" N/A "),
            ..Default::default()
        };
        assert_eq!(normalize(&record).unwrap().id, " N/A ");
    }

    #[test]
    fn test_normalize_missing_id_is_error() {
        let record = RawRecord::default();
        assert!(matches!(
            normalize(&record),
            Err(NormalizeError::MissingId { .. })
        ));
    }

    #[test]
    fn test_normalize_all_preserves_order_and_propagates_errors() {
        let ok = |id: i64| RawRecord {
            id: RawValue::Int(id),
            ..Default::default()
        };

        let documents = normalize_all(&[ok(3), ok(1), ok(2)]).unwrap();
        let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);

        assert!(normalize_all(&[ok(1), RawRecord::default(), ok(2)]).is_err());
        assert!(normalize_all(&[]).unwrap().is_empty());
    }
}
