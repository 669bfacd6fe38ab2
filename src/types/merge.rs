//! Inputs and output of folding prebuilt sub-indexes into a running index.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// Prebuilt indexes contributed by one owning module, most specific first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginIndex {
    pub plugin_id: String,
    /// `(index id, index directory)` in priority order.
    pub indexes: Vec<(String, PathBuf)>,
}

impl PluginIndex {
    #[must_use]
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_index(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.indexes.push((id.into(), path.into()));
        self
    }
}

/// Result of a merge: every merged document identifier, mapped to the ids of
/// the lower-priority sub-indexes that carried it too.
///
/// An empty list means the document was seen once and needs no cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl DuplicateMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` as kept with no duplicates, discarding earlier findings.
    pub(crate) fn keep(&mut self, name: &str) {
        self.entries.insert(name.to_string(), Vec::new());
    }

    pub(crate) fn record_duplicate(&mut self, name: &str, index_id: &str) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .push(index_id.to_string());
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Ids of the sub-indexes holding a redundant copy of `name`, if merged.
    #[must_use]
    pub fn duplicates_of(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Documents that have at least one redundant copy.
    pub fn duplicated(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .filter(|(_, dups)| !dups.is_empty())
            .map(|(name, dups)| (name.as_str(), dups.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cooperative cancellation flag shared between a driver and a merge.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
