//! Search index sink trait abstraction.
//!
//! This crate defines the `SearchSink` trait that the sync loop writes
//! documents through. `elasticsearch-sink` implements it over HTTP;
//! `MemorySink` keeps documents in process for tests and dry runs.

mod memory;
mod report;
mod traits;

pub use memory::MemorySink;
pub use report::{BulkReport, FailedDocument};
pub use traits::SearchSink;
