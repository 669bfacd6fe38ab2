//! Builder-style tuning options for a [`crate::SearchIndex`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DRAIN_POLL_MS, DEFAULT_HEAP_SIZE_BYTES, DEFAULT_MAX_CLAUSE_COUNT,
    DEFAULT_MAX_FIELD_TERMS, DEFAULT_MAX_HITS, DEFAULT_MERGE_FAN_IN,
};

fn default_heap_size() -> usize {
    DEFAULT_HEAP_SIZE_BYTES
}

fn default_merge_fan_in() -> usize {
    DEFAULT_MERGE_FAN_IN
}

fn default_max_field_terms() -> usize {
    DEFAULT_MAX_FIELD_TERMS
}

fn default_max_clause_count() -> usize {
    DEFAULT_MAX_CLAUSE_COUNT
}

fn default_max_hits() -> usize {
    DEFAULT_MAX_HITS
}

fn default_drain_poll() -> Duration {
    Duration::from_millis(DEFAULT_DRAIN_POLL_MS)
}

/// Tunables for writers, searches and shutdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Memory budget handed to each engine writer.
    #[serde(default = "default_heap_size")]
    pub heap_size_bytes: usize,
    /// Number of same-level segments that triggers a background merge.
    #[serde(default = "default_merge_fan_in")]
    pub merge_fan_in: usize,
    /// Analysed text beyond this many terms per field is not indexed.
    #[serde(default = "default_max_field_terms")]
    pub max_field_terms: usize,
    /// Upper bound on term clauses a parsed query may expand to.
    #[serde(default = "default_max_clause_count")]
    pub max_clause_count: usize,
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,
    /// `None` waits for in-flight searches however long they take.
    #[serde(default)]
    pub drain_timeout: Option<Duration>,
    #[serde(default = "default_drain_poll")]
    pub drain_poll_interval: Duration,
    /// Tag stored with every record so duplicates across sub-indexes can be told apart.
    #[serde(default)]
    pub relative_path: Option<String>,
    /// Vendor archive unpacked once when the index does not exist yet.
    #[serde(default)]
    pub prebuilt_index: Option<PathBuf>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            heap_size_bytes: default_heap_size(),
            merge_fan_in: default_merge_fan_in(),
            max_field_terms: default_max_field_terms(),
            max_clause_count: default_max_clause_count(),
            max_hits: default_max_hits(),
            drain_timeout: None,
            drain_poll_interval: default_drain_poll(),
            relative_path: None,
            prebuilt_index: None,
        }
    }
}

impl IndexOptions {
    /// Start a fluent builder for `IndexOptions`.
    #[must_use]
    pub fn builder() -> IndexOptionsBuilder {
        IndexOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexOptionsBuilder {
    inner: IndexOptions,
}

impl IndexOptionsBuilder {
    #[must_use]
    pub fn heap_size_bytes(mut self, bytes: usize) -> Self {
        self.inner.heap_size_bytes = bytes;
        self
    }

    #[must_use]
    pub fn merge_fan_in(mut self, fan_in: usize) -> Self {
        self.inner.merge_fan_in = fan_in.max(2);
        self
    }

    #[must_use]
    pub fn max_field_terms(mut self, terms: usize) -> Self {
        self.inner.max_field_terms = terms;
        self
    }

    #[must_use]
    pub fn max_clause_count(mut self, clauses: usize) -> Self {
        self.inner.max_clause_count = clauses;
        self
    }

    #[must_use]
    pub fn max_hits(mut self, hits: usize) -> Self {
        self.inner.max_hits = hits.max(1);
        self
    }

    #[must_use]
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.inner.drain_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn drain_poll_interval(mut self, interval: Duration) -> Self {
        self.inner.drain_poll_interval = interval;
        self
    }

    #[must_use]
    pub fn relative_path(mut self, tag: impl Into<String>) -> Self {
        self.inner.relative_path = Some(tag.into());
        self
    }

    #[must_use]
    pub fn prebuilt_index(mut self, archive: impl Into<PathBuf>) -> Self {
        self.inner.prebuilt_index = Some(archive.into());
        self
    }

    #[must_use]
    pub fn build(self) -> IndexOptions {
        self.inner
    }
}
