//! PostgreSQL batch extraction for film-sync
//!
//! Polls `film_work` for rows modified after a cursor, with genres and
//! credited people aggregated into each row. The cursor is the row
//! modification timestamp, persisted through the `checkpoint` crate.

mod client;
pub mod cursor;
mod extract;
mod query;
mod row;

pub use client::new_postgresql_client;
pub use cursor::ModifiedCursor;
pub use extract::{BatchSource, PostgresBatchSource};
pub use query::extract_batch_query;
pub use row::row_to_raw_record;

/// PostgreSQL source connection options
#[derive(Clone, Debug)]
pub struct SourceOpts {
    /// PostgreSQL connection URI
    pub source_uri: String,
    /// Schema holding the film, genre and person tables
    pub source_schema: String,
}
