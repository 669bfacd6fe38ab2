use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use atomic_write_file::AtomicWriteFile;

use crate::error::Result;

/// Flat string-to-string file stored next to the engine files.
///
/// Serialized as a JSON object. Restoring a missing or unreadable file yields an
/// empty table; saving replaces the file atomically so a crash never leaves a
/// half-written copy behind.
#[derive(Debug, Clone)]
pub struct PropertiesFile {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PropertiesFile {
    #[must_use]
    pub fn new(name: &str, dir: &Path) -> Self {
        Self {
            path: dir.join(name),
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory table with the persisted one.
    ///
    /// Returns false when nothing usable was on disk.
    pub fn restore(&mut self) -> bool {
        self.entries.clear();
        let bytes = match fs_err::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return false,
            Err(err) => {
                tracing::warn!(
                    file = %self.path.display(),
                    error = %err,
                    "properties file unreadable"
                );
                return false;
            }
        };
        match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
            Ok(entries) => {
                self.entries = entries;
                true
            }
            Err(err) => {
                tracing::warn!(
                    file = %self.path.display(),
                    error = %err,
                    "properties file corrupt; starting empty"
                );
                false
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs_err::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(&self.entries)?;
        let mut file = AtomicWriteFile::open(&self.path)?;
        file.write_all(&payload)?;
        file.commit()?;
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
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
