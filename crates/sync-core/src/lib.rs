//! Core types for the film-sync pipeline.
//!
//! This crate provides the types that flow through one sync cycle and the
//! pure transformation between them:
//!
//! - [`RawValue`] - Loosely-typed column value as read from the source
//! - [`RawRecord`] - One aggregated film row, before cleaning
//! - [`Document`] - The search document handed to the indexer
//! - [`normalize`] - Turns a [`RawRecord`] into a [`Document`]
//!
//! # Architecture
//!
//! ```text
//! postgresql-source ──RawRecord──▶ sync-core::normalize ──Document──▶ search-sink
//! ```
//!
//! Nothing in this crate performs I/O.
//!
//! # Example
//!
//! ```rust
//! use sync_core::{normalize, RawRecord, RawValue};
//!
//! let record = RawRecord {
//!     id: RawValue::Int(7),
//!     title: RawValue::text(" Matrix "),
//!     rating: RawValue::text("8.7"),
//!     ..Default::default()
//! };
//!
//! let document = normalize(&record).unwrap();
//! assert_eq!(document.id, "7");
//! assert_eq!(document.title.as_deref(), Some("Matrix"));
//! assert_eq!(document.imdb_rating, Some(8.7));
//! ```

pub mod document;
pub mod normalize;
pub mod raw;

pub use document::{Document, PersonRef};
pub use normalize::{
    clean_value, normalize, normalize_all, parse_genres, parse_person_list, parse_rating,
    NormalizeError,
};
pub use raw::{RawRecord, RawValue};
