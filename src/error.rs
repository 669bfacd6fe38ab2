use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, IndexError>;

/// Failures surfaced by the help index.
///
/// Most of these never reach callers of the batch boundary methods: those log the
/// error and report `false`. They do reach callers of the per-document operations
/// (wrapped in a [`crate::Status`]) and of [`crate::SearchIndex::merge`].
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("search engine failure: {0}")]
    Engine(#[from] tantivy::TantivyError),

    #[error("search engine rejected directory: {0}")]
    EngineDirectory(#[from] tantivy::directory::error::OpenDirectoryError),

    #[error("prebuilt index archive is unreadable: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("lock {path} is already held by this index")]
    LockAlreadyHeld { path: PathBuf },

    #[error("index directory {path} could not be created")]
    DirectoryUnavailable { path: PathBuf },

    #[error("no {expected} batch is open")]
    NoOpenBatch { expected: &'static str },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    QueryTooComplex(#[from] QueryTooComplex),

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("stored record could not be copied: {reason}")]
    InvalidRecord { reason: String },

    #[error("participant failed: {reason}")]
    Participant { reason: String },
}

/// A query expanded to more term clauses than the configured bound.
///
/// This is the one search failure handed back to callers; they may retry with a
/// narrower query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("query expands to {clauses} clauses (limit {limit})")]
pub struct QueryTooComplex {
    pub clauses: usize,
    pub limit: usize,
}

impl IndexError {
    /// True when the failure is the recoverable "narrow your query" signal.
    #[must_use]
    pub fn is_query_too_complex(&self) -> bool {
        matches!(self, Self::QueryTooComplex(_))
    }
}

impl From<tantivy::query::QueryParserError> for IndexError {
    fn from(err: tantivy::query::QueryParserError) -> Self {
        Self::InvalidQuery {
            reason: err.to_string(),
        }
    }
}
