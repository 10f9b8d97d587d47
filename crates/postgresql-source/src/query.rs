//! Extraction query
//!
//! One statement per batch. Parameters: `$1` cursor (timestamptz, exclusive
//! lower bound), `$2` limit (bigint). The LEFT JOINs fan out one row per
//! genre/person link; `GROUP BY fw.id` folds them back into a single row with
//! de-duplicated aggregates, so films without genres or people still appear.

/// Build the batch extraction query against the given schema.
pub fn extract_batch_query(schema: &str) -> String {
    let schema = quote_ident(schema);
    format!(
        "SELECT
            fw.id,
            fw.title,
            fw.description,
            fw.rating AS imdb_rating,
            fw.modified,
            ARRAY_AGG(DISTINCT g.name) FILTER (WHERE g.name IS NOT NULL) AS genres,
            ARRAY_AGG(DISTINCT p.id || '###' || p.full_name)
                FILTER (WHERE pfw.role = 'actor' AND p.full_name IS NOT NULL) AS actors,
            ARRAY_AGG(DISTINCT p.id || '###' || p.full_name)
                FILTER (WHERE pfw.role = 'writer' AND p.full_name IS NOT NULL) AS writers,
            ARRAY_AGG(DISTINCT p.id || '###' || p.full_name)
                FILTER (WHERE pfw.role = 'director' AND p.full_name IS NOT NULL) AS directors
        FROM {schema}.film_work fw
        LEFT JOIN {schema}.genre_film_work gfw ON fw.id = gfw.film_work_id
        LEFT JOIN {schema}.genre g ON gfw.genre_id = g.id
        LEFT JOIN {schema}.person_film_work pfw ON fw.id = pfw.film_work_id
        LEFT JOIN {schema}.person p ON pfw.person_id = p.id
        WHERE fw.modified > $1
        GROUP BY fw.id
        ORDER BY fw.modified
        LIMIT $2"
    )
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
