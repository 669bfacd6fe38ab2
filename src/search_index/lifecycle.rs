//! Construction of a [`SearchIndex`] and the queries about its on-disk state.
//!
//! Responsibilities:
//! - Derive the sibling marker and lock paths from the index directory.
//! - Restore a vendor prebuilt index once, guarded by the per-locale lock.
//! - Answer existence and freshness questions without opening a batch.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, PoisonError};

use crate::changes::{ChangeDetector, PluginVersionInfo};
use crate::constants::{INCONSISTENT_SUFFIX, LOCK_SUFFIX};
use crate::engine::{self, AnalyzerDescriptor, DocumentRecord};
use crate::error::Result;
use crate::href::{self, DocumentLocator};
use crate::io::unpack_archive;
use crate::ledger::DocumentLedger;
use crate::lock::FileLock;
use crate::participant::ParticipantRegistry;
use crate::types::IndexOptions;

use super::batch::BatchState;
use super::search::SearchGate;

/// Callback adding fields to every record before its participant runs.
pub type ExtraFields = Box<dyn Fn(&str, &mut DocumentRecord) + Send + Sync>;

/// One on-disk search index for one locale.
///
/// A batch belongs to the thread that began it until that thread ends it; a
/// `begin_*` from another thread waits meanwhile. Searches run concurrently
/// with batches against the view that was current when each search started.
pub struct SearchIndex {
    pub(crate) locale: String,
    pub(crate) index_dir: PathBuf,
    pub(crate) options: IndexOptions,
    pub(crate) analyzer: AnalyzerDescriptor,
    pub(crate) participants: ParticipantRegistry,
    pub(crate) lock: FileLock,
    pub(crate) inconsistency_file: PathBuf,
    pub(crate) contributions: BTreeMap<String, String>,
    pub(crate) change_detector: Mutex<Option<Box<dyn ChangeDetector>>>,
    pub(crate) extra_fields: Option<ExtraFields>,
    pub(crate) batch: Mutex<BatchState>,
    pub(crate) batch_released: Condvar,
    pub(crate) gate: SearchGate,
}

/// Builder for [`SearchIndex`].
pub struct SearchIndexBuilder {
    locale: String,
    index_dir: PathBuf,
    options: IndexOptions,
    analyzer: Option<AnalyzerDescriptor>,
    participants: Option<ParticipantRegistry>,
    content_root: Option<PathBuf>,
    contributions: BTreeMap<String, String>,
    change_detector: Option<Box<dyn ChangeDetector>>,
    extra_fields: Option<ExtraFields>,
}

impl SearchIndexBuilder {
    pub fn options(mut self, options: IndexOptions) -> Self {
        self.options = options;
        self
    }

    pub fn analyzer(mut self, analyzer: AnalyzerDescriptor) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Replaces the default registry, which only knows the HTML participant.
    pub fn participants(mut self, participants: ParticipantRegistry) -> Self {
        self.participants = Some(participants);
        self
    }

    /// Directory the default HTML participant resolves `/plugin/path` hrefs against.
    pub fn content_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content_root = Some(root.into());
        self
    }

    /// Declares a contributing module and its version for change detection.
    pub fn contribution(mut self, id: impl Into<String>, version: impl Into<String>) -> Self {
        self.contributions.insert(id.into(), version.into());
        self
    }

    pub fn change_detector<D>(mut self, detector: D) -> Self
    where
        D: ChangeDetector + 'static,
    {
        self.change_detector = Some(Box::new(detector));
        self
    }

    pub fn extra_fields<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &mut DocumentRecord) + Send + Sync + 'static,
    {
        self.extra_fields = Some(Box::new(hook));
        self
    }

    /// Builds the handle, restoring the prebuilt index first if one is configured
    /// and no usable index exists yet.
    pub fn build(self) -> SearchIndex {
        let siblings = self
            .index_dir
            .parent()
            .map_or_else(|| self.index_dir.clone(), Path::to_path_buf);
        let participants = self.participants.unwrap_or_else(|| {
            ParticipantRegistry::with_html(
                self.content_root
                    .clone()
                    .unwrap_or_else(|| siblings.clone()),
            )
        });
        let index = SearchIndex {
            analyzer: self
                .analyzer
                .unwrap_or_else(|| AnalyzerDescriptor::for_locale(&self.locale)),
            lock: FileLock::new(siblings.join(format!("{}.{LOCK_SUFFIX}", self.locale))),
            inconsistency_file: siblings.join(format!("{}.{INCONSISTENT_SUFFIX}", self.locale)),
            locale: self.locale,
            index_dir: self.index_dir,
            options: self.options,
            participants,
            contributions: self.contributions,
            change_detector: Mutex::new(self.change_detector),
            extra_fields: self.extra_fields,
            batch: Mutex::new(BatchState::default()),
            batch_released: Condvar::new(),
            gate: SearchGate::new(),
        };
        index.restore_prebuilt_index();
        index
    }
}

impl SearchIndex {
    #[must_use]
    pub fn builder(locale: impl Into<String>, index_dir: impl Into<PathBuf>) -> SearchIndexBuilder {
        SearchIndexBuilder {
            locale: locale.into(),
            index_dir: index_dir.into(),
            options: IndexOptions::default(),
            analyzer: None,
            participants: None,
            content_root: None,
            contributions: BTreeMap::new(),
            change_detector: None,
            extra_fields: None,
        }
    }

    /// Handle with default options and the HTML participant only.
    #[must_use]
    pub fn new(locale: impl Into<String>, index_dir: impl Into<PathBuf>) -> Self {
        Self::builder(locale, index_dir).build()
    }

    /// `<user data dir>/helpindex/index/<locale>`, when the platform has a data dir.
    #[must_use]
    pub fn default_directory(locale: &str) -> Option<PathBuf> {
        dirs_next::data_dir().map(|dir| dir.join("helpindex").join("index").join(locale))
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[must_use]
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    #[must_use]
    pub fn analyzer(&self) -> &AnalyzerDescriptor {
        &self.analyzer
    }

    #[must_use]
    pub fn participants(&self) -> &ParticipantRegistry {
        &self.participants
    }

    /// The index directory is present and nothing flags it inconsistent.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.index_dir.is_dir() && !self.is_inconsistent()
    }

    /// True when the index is missing or its contributions changed since it was built.
    pub fn needs_updating(&self) -> bool {
        if !self.exists() {
            return true;
        }
        self.with_change_detector(|detector| detector.detect_change())
    }

    /// Replaces the change detector, e.g. with one prepared by an external indexer.
    pub fn set_change_detector<D>(&self, detector: D)
    where
        D: ChangeDetector + 'static,
    {
        let mut slot = self
            .change_detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Box::new(detector));
    }

    pub(crate) fn with_change_detector<R>(
        &self,
        f: impl FnOnce(&mut dyn ChangeDetector) -> R,
    ) -> R {
        let mut slot = self
            .change_detector
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let detector = slot.get_or_insert_with(|| {
            Box::new(PluginVersionInfo::new(
                &self.index_dir,
                self.contributions.clone(),
                !self.exists(),
            ))
        });
        f(detector.as_mut())
    }

    /// Snapshot of the persisted ledger; empty when the index does not exist.
    #[must_use]
    pub fn indexed_docs(&self) -> DocumentLedger {
        if self.exists() {
            DocumentLedger::restore(&self.index_dir)
        } else {
            DocumentLedger::empty(&self.index_dir)
        }
    }

    /// Names of every live record in the engine index.
    pub fn engine_document_names(&self) -> Result<BTreeSet<String>> {
        engine::document_names(&self.index_dir, &self.analyzer)
    }

    /// Document identifier for `url`, or `None` when nothing can index it.
    #[must_use]
    pub fn indexable_href(&self, url: &str) -> Option<String> {
        href::indexable_href(url, &self.participants)
    }

    /// Locator used to fetch `url` in this index's locale.
    #[must_use]
    pub fn indexable_locator(
        &self,
        url: &str,
        id: Option<&str>,
        participant_id: Option<&str>,
    ) -> Option<DocumentLocator> {
        href::indexable_locator(&self.locale, url, id, participant_id, &self.participants)
    }

    /// Takes the per-locale lock without blocking.
    pub fn try_lock(&self) -> Result<bool> {
        self.lock.try_acquire()
    }

    pub fn release_lock(&self) {
        self.lock.release();
    }

    /// Removes the lock file; refused while the lock is held.
    pub fn delete_lock_file(&self) -> bool {
        self.lock.delete_lock_file()
    }

    fn restore_prebuilt_index(&self) {
        let Some(archive) = self.options.prebuilt_index.clone() else {
            return;
        };
        if self.exists() {
            return;
        }
        match self.try_lock() {
            Ok(true) => {
                if !self.exists() {
                    self.unpack_prebuilt(&archive);
                }
                self.release_lock();
            }
            Ok(false) => {
                tracing::debug!(
                    locale = %self.locale,
                    "prebuilt index restored by another process"
                );
            }
            Err(err) => {
                tracing::debug!(
                    locale = %self.locale,
                    error = %err,
                    "prebuilt index restore already in progress"
                );
            }
        }
    }

    fn unpack_prebuilt(&self, archive: &Path) {
        if !archive.is_file() {
            tracing::debug!(archive = %archive.display(), "no prebuilt index archive");
            return;
        }
        self.mark_inconsistent();
        self.clean_old_index();
        match unpack_archive(archive, &self.index_dir) {
            Ok(entries) => {
                tracing::info!(
                    index = %self.index_dir.display(),
                    entries,
                    "prebuilt index restored"
                );
                self.mark_consistent();
            }
            Err(err) => {
                tracing::error!(
                    index = %self.index_dir.display(),
                    error = %err,
                    "prebuilt index could not be restored"
                );
            }
        }
    }

    /// Removes any previous index files so an archive extracts into a clean directory.
    fn clean_old_index(&self) {
        if self.index_dir.exists() {
            if let Err(err) = fs_err::remove_dir_all(&self.index_dir) {
                tracing::warn!(error = %err, "old index could not be removed");
            }
        }
        if let Err(err) = fs_err::create_dir_all(&self.index_dir) {
            tracing::warn!(error = %err, "index directory could not be created");
        }
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("locale", &self.locale)
            .field("index_dir", &self.index_dir)
            .field("options", &self.options)
            .field("analyzer", &self.analyzer)
            .finish_non_exhaustive()
    }
}
