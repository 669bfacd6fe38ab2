//! Folding prebuilt sub-indexes into the index and removing the copies that
//! lower-priority sub-indexes contributed twice.

use crate::engine;
use crate::error::{IndexError, Result};
use crate::ledger::DocumentLedger;
use crate::types::{BatchKind, CancelToken, DuplicateMap, PluginIndex, Status};

use super::SearchIndex;
use super::batch::{BatchState, Session};

impl SearchIndex {
    /// Merges prebuilt sub-indexes into the open add batch.
    ///
    /// Sub-indexes are taken in the given order, most specific first. Within one
    /// module the first sub-index is taken as is; a later sub-index repeating a
    /// document name is recorded as its duplicate. Every merged name enters the
    /// ledger without filters. A sub-index that cannot be opened is skipped;
    /// a failure while copying records yields an empty map.
    pub fn merge(
        &self,
        plugin_indexes: &[PluginIndex],
        cancel: &CancelToken,
    ) -> Result<DuplicateMap> {
        let mut state = self.lock_batch();
        let BatchState { session, ledger, .. } = &mut *state;
        let Session::Add(target) = session else {
            return Err(IndexError::NoOpenBatch {
                expected: BatchKind::Add.label(),
            });
        };

        let mut merged = DuplicateMap::new();
        let mut sources = Vec::new();
        for plugin in plugin_indexes {
            if cancel.is_cancelled() {
                tracing::debug!(plugin = %plugin.plugin_id, "merge cancelled");
                return Err(IndexError::Cancelled);
            }
            for (position, (index_id, path)) in plugin.indexes.iter().enumerate() {
                let source = match engine::open_source(path) {
                    Ok(source) => source,
                    Err(err) => {
                        tracing::error!(
                            index_id = %index_id,
                            path = %path.display(),
                            error = %err,
                            "prebuilt search index could not be opened"
                        );
                        continue;
                    }
                };
                tracing::debug!(
                    index_id = %index_id,
                    path = %path.display(),
                    "merging prebuilt index"
                );
                let prebuilt = DocumentLedger::restore(path);
                for name in prebuilt.names() {
                    if position > 0 && merged.contains(name) {
                        merged.record_duplicate(name, index_id);
                    } else {
                        merged.keep(name);
                    }
                }
                sources.push((index_id, source));
            }
        }

        let ledger = ledger.get_or_insert_with(|| DocumentLedger::restore(&self.index_dir));
        for name in merged.names() {
            ledger.put(name, None);
        }
        for (index_id, source) in &sources {
            match target.fold(source) {
                Ok(copied) => {
                    tracing::debug!(index_id = %index_id, copied, "folded prebuilt index");
                }
                Err(err) => {
                    tracing::error!(
                        index_id = %index_id,
                        error = %err,
                        "merging search indexes failed"
                    );
                    return Ok(DuplicateMap::new());
                }
            }
        }
        Ok(merged)
    }

    /// Deletes the records of `name` tagged with any of `index_ids`.
    ///
    /// For each tag the posting lists of the name and the tag are intersected;
    /// records carrying only one of the two are left alone.
    pub fn remove_duplicates(&self, name: &str, index_ids: &[String]) -> Status {
        tracing::debug!(name, ?index_ids, "removing duplicates");
        let state = self.lock_batch();
        let Session::RemoveDuplicates(engine) = &state.session else {
            return Status::error(
                format!("no remove duplicates batch is open for document {name}"),
                Some(IndexError::NoOpenBatch {
                    expected: BatchKind::RemoveDuplicates.label(),
                }),
            );
        };
        let mut removed = 0usize;
        for index_id in index_ids {
            match engine.delete_tagged(name, index_id) {
                Ok(count) => removed += count,
                Err(err) => {
                    let index = self.index_dir.display();
                    return Status::error(
                        format!("I/O failure removing duplicates of {name} from index {index}"),
                        Some(err),
                    );
                }
            }
        }
        tracing::debug!(name, removed, "duplicates removed");
        Status::ok()
    }
}
