//! Persisted set of document identifiers represented in an index.

use std::collections::BTreeSet;
use std::path::Path;

use crate::constants::{INDEXED_DOCS_FILE, NO_FILTERS};
use crate::error::Result;
use crate::io::PropertiesFile;

/// Document identifier to filter tag, mirrored to `indexed_docs`.
///
/// Outside an open batch the key set equals the set of names the engine holds.
/// During a batch it is mutated in lock-step with engine calls and flushed only
/// when the batch sequence completes.
#[derive(Debug, Clone)]
pub struct DocumentLedger {
    props: PropertiesFile,
}

impl DocumentLedger {
    /// An empty ledger that will be saved into `dir`.
    #[must_use]
    pub fn empty(dir: &Path) -> Self {
        Self {
            props: PropertiesFile::new(INDEXED_DOCS_FILE, dir),
        }
    }

    /// The ledger last saved into `dir`, or an empty one.
    #[must_use]
    pub fn restore(dir: &Path) -> Self {
        let mut ledger = Self::empty(dir);
        ledger.props.restore();
        ledger
    }

    /// Records `name`; a missing filter tag is stored as [`NO_FILTERS`].
    pub fn put(&mut self, name: &str, filters: Option<&str>) {
        self.props.put(name, filters.unwrap_or(NO_FILTERS));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.props.remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    #[must_use]
    pub fn filters(&self, name: &str) -> Option<&str> {
        self.props.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.props.keys()
    }

    #[must_use]
    pub fn keys(&self) -> BTreeSet<String> {
        self.props.keys().map(str::to_string).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn save(&self) -> Result<()> {
        self.props.save()
    }
}
