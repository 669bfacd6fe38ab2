//! The `SearchIndex` handle and its batch, merge and search operations.

mod batch;
mod consistency;
mod lifecycle;
mod merge;
mod search;

pub use lifecycle::{ExtraFields, SearchIndex, SearchIndexBuilder};
