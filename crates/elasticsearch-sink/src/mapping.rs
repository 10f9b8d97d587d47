//! Fixed index settings and mapping for film documents.

use serde_json::{json, Value};

/// Body sent when creating the index.
pub fn index_body() -> Value {
    let person = json!({
        "type": "nested",
        "dynamic": "strict",
        "properties": {
            "id": { "type": "keyword" },
            "name": { "type": "text", "analyzer": "films_analyzer" }
        }
    });
    let names = json!({ "type": "text", "analyzer": "films_analyzer" });

    json!({
        "settings": {
            "refresh_interval": "1s",
            "analysis": {
                "filter": {
                    "english_stop": { "type": "stop", "stopwords": "_english_" },
                    "english_stemmer": { "type": "stemmer", "language": "english" },
                    "english_possessive_stemmer": {
                        "type": "stemmer",
                        "language": "possessive_english"
                    }
                },
                "analyzer": {
                    "films_analyzer": {
                        "tokenizer": "standard",
                        "filter": [
                            "lowercase",
                            "english_stop",
                            "english_stemmer",
                            "english_possessive_stemmer"
                        ]
                    }
                }
            }
        },
        "mappings": {
            "dynamic": "strict",
            "properties": {
                "id": { "type": "keyword" },
                "imdb_rating": { "type": "float" },
                "genres": { "type": "keyword" },
                "title": {
                    "type": "text",
                    "analyzer": "films_analyzer",
                    "fields": { "raw": { "type": "keyword" } }
                },
                "description": { "type": "text", "analyzer": "films_analyzer" },
                "directors_names": names,
                "actors_names": names,
                "writers_names": names,
                "directors": person,
                "actors": person,
                "writers": person
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::Document;

    #[test]
    fn test_mapping_covers_every_document_field() {
        let body = index_body();
        let properties = body["mappings"]["properties"].as_object().unwrap();

        assert_eq!(properties.len(), Document::FIELD_COUNT);
        assert_eq!(properties["imdb_rating"]["type"], "float");
        assert_eq!(properties["actors"]["type"], "nested");
        assert_eq!(properties["actors"]["properties"]["id"]["type"], "keyword");
        assert_eq!(body["mappings"]["dynamic"], "strict");
    }
}
