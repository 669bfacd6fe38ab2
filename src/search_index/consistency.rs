//! Crash and compatibility tracking for the on-disk index.
//!
//! A marker file next to the index directory flags a batch in progress (or one
//! that died mid-way). The dependency record stores the engine version and
//! analyzer id the index was built with; either mismatch makes the index as
//! unusable as a crash would.

use crate::constants::{
    DEPENDENCIES_KEY_ANALYZER, DEPENDENCIES_KEY_ENGINE, DEPENDENCIES_VERSION_FILENAME,
};
use crate::engine::{engine_version, versions_compatible};
use crate::error::Result;
use crate::io::PropertiesFile;

use super::SearchIndex;

impl SearchIndex {
    /// Creates the marker file. Failures are ignored.
    pub fn mark_inconsistent(&self) {
        if let Some(parent) = self.inconsistency_file.parent() {
            let _ = fs_err::create_dir_all(parent);
        }
        if let Err(err) = fs_err::File::create(&self.inconsistency_file) {
            tracing::debug!(error = %err, "inconsistency marker could not be created");
        }
    }

    /// Deletes the marker file if present.
    pub fn mark_consistent(&self) {
        match fs_err::remove_file(&self.inconsistency_file) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(error = %err, "inconsistency marker could not be removed");
            }
        }
    }

    #[must_use]
    pub fn has_inconsistency_marker(&self) -> bool {
        self.inconsistency_file.exists()
    }

    /// Marker present, or the index was built by an incompatible engine or analyzer.
    #[must_use]
    pub fn is_inconsistent(&self) -> bool {
        self.has_inconsistency_marker() || !self.dependencies_compatible()
    }

    /// The index may serve queries.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.is_inconsistent()
    }

    /// Compares a recorded engine version with the running one, ignoring qualifiers.
    #[must_use]
    pub fn is_engine_compatible(&self, recorded: Option<&str>) -> bool {
        versions_compatible(recorded, engine_version())
    }

    #[must_use]
    pub fn is_analyzer_compatible(&self, recorded: Option<&str>) -> bool {
        self.analyzer.is_compatible(recorded.unwrap_or_default())
    }

    pub(crate) fn dependencies_compatible(&self) -> bool {
        let dependencies = self.dependencies();
        self.is_engine_compatible(dependencies.get(DEPENDENCIES_KEY_ENGINE))
            && self.is_analyzer_compatible(dependencies.get(DEPENDENCIES_KEY_ANALYZER))
    }

    /// Records the running engine version and analyzer id.
    pub fn persist_dependency_versions(&self) -> Result<()> {
        let mut dependencies = self.dependencies();
        dependencies.put(DEPENDENCIES_KEY_ENGINE, engine_version());
        dependencies.put(DEPENDENCIES_KEY_ANALYZER, self.analyzer.id());
        dependencies.save()
    }

    fn dependencies(&self) -> PropertiesFile {
        let mut dependencies = PropertiesFile::new(DEPENDENCIES_VERSION_FILENAME, &self.index_dir);
        dependencies.restore();
        dependencies
    }
}
