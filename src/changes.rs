//! Detection of documentation contributions that changed since the last build.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::constants::INDEXED_CONTRIBUTION_INFO_FILE;
use crate::error::Result;
use crate::io::PropertiesFile;

/// Decides whether the document corpus changed since the index was last built.
pub trait ChangeDetector: Send {
    fn detect_change(&mut self) -> bool;

    /// Persists the current snapshot as the baseline for the next check.
    fn save(&mut self) -> Result<()>;
}

/// Snapshot of contributing module ids and versions, compared against the copy
/// saved by the last successful batch.
#[derive(Debug, Clone)]
pub struct PluginVersionInfo {
    saved: PropertiesFile,
    current: BTreeMap<String, String>,
    ignore_saved: bool,
    added: BTreeSet<String>,
    removed: BTreeSet<String>,
    changed: BTreeSet<String>,
}

impl PluginVersionInfo {
    /// `ignore_saved` treats the persisted snapshot as absent, used when the
    /// index itself does not exist.
    pub fn new<I, K, V>(dir: &Path, contributions: I, ignore_saved: bool) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            saved: PropertiesFile::new(INDEXED_CONTRIBUTION_INFO_FILE, dir),
            current: contributions
                .into_iter()
                .map(|(id, version)| (id.into(), version.into()))
                .collect(),
            ignore_saved,
            added: BTreeSet::new(),
            removed: BTreeSet::new(),
            changed: BTreeSet::new(),
        }
    }

    /// Modules contributing now but absent from the saved snapshot.
    #[must_use]
    pub fn added(&self) -> &BTreeSet<String> {
        &self.added
    }

    #[must_use]
    pub fn removed(&self) -> &BTreeSet<String> {
        &self.removed
    }

    /// Modules present in both snapshots with a different version.
    #[must_use]
    pub fn changed(&self) -> &BTreeSet<String> {
        &self.changed
    }

    #[must_use]
    pub fn contributions(&self) -> &BTreeMap<String, String> {
        &self.current
    }
}

impl ChangeDetector for PluginVersionInfo {
    fn detect_change(&mut self) -> bool {
        self.added.clear();
        self.removed.clear();
        self.changed.clear();
        if self.ignore_saved || !self.saved.restore() {
            self.added = self.current.keys().cloned().collect();
            return true;
        }
        for (id, version) in &self.current {
            match self.saved.get(id) {
                None => {
                    self.added.insert(id.clone());
                }
                Some(saved) if saved != version => {
                    self.changed.insert(id.clone());
                }
                Some(_) => {}
            }
        }
        self.removed = self
            .saved
            .keys()
            .filter(|id| !self.current.contains_key(*id))
            .map(str::to_string)
            .collect();
        !(self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty())
    }

    fn save(&mut self) -> Result<()> {
        let mut snapshot = PropertiesFile::new(INDEXED_CONTRIBUTION_INFO_FILE, dir_of(&self.saved));
        for (id, version) in &self.current {
            snapshot.put(id.as_str(), version.as_str());
        }
        snapshot.save()?;
        self.saved = snapshot;
        self.ignore_saved = false;
        Ok(())
    }
}

fn dir_of(props: &PropertiesFile) -> &Path {
    props.path().parent().unwrap_or_else(|| Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn first_run_reports_everything_added() {
        let dir = TempDir::new().unwrap();
        let mut info = PluginVersionInfo::new(dir.path(), [("org.docs", "1.0.0")], false);
        assert!(info.detect_change());
        assert!(info.added().contains("org.docs"));
    }

    #[test]
    fn saved_snapshot_is_the_baseline() {
        let dir = TempDir::new().unwrap();
        let mut info = PluginVersionInfo::new(
            dir.path(),
            [("org.docs", "1.0.0"), ("org.guide", "2.1.0")],
            true,
        );
        info.save().unwrap();
        assert!(!info.detect_change());

        let mut upgraded = PluginVersionInfo::new(
            dir.path(),
            [("org.docs", "1.0.1"), ("org.tips", "0.1.0")],
            false,
        );
        assert!(upgraded.detect_change());
        assert_eq!(upgraded.changed(), &BTreeSet::from(["org.docs".to_string()]));
        assert_eq!(upgraded.added(), &BTreeSet::from(["org.tips".to_string()]));
        assert_eq!(upgraded.removed(), &BTreeSet::from(["org.guide".to_string()]));
    }

    #[test]
    fn ignore_saved_forces_change() {
        let dir = TempDir::new().unwrap();
        let mut info = PluginVersionInfo::new(dir.path(), [("org.docs", "1.0.0")], false);
        info.save().unwrap();
        let mut missing_index = PluginVersionInfo::new(dir.path(), [("org.docs", "1.0.0")], true);
        assert!(missing_index.detect_change());
    }
}
