//! Add, delete and duplicate-removal batches.
//!
//! Every batch arms the inconsistency marker when it begins. Only the end of a
//! batch sequence clears it, and only after the ledger, the contribution
//! snapshot and the dependency record are on disk.
//!
//! An open batch belongs to the thread that began it. Another thread's
//! `begin_*` blocks until the owner's matching `end_*`.

use std::sync::{MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::engine::{self, EngineSession};
use crate::error::{IndexError, Result};
use crate::href::DocumentLocator;
use crate::ledger::DocumentLedger;
use crate::participant::{DocumentRequest, run_participant};
use crate::types::{BatchKind, BatchStep, Status};

use super::SearchIndex;

/// Which engine session, if any, the open batch holds.
#[derive(Debug, Default)]
pub(crate) enum Session {
    #[default]
    Idle,
    Add(EngineSession),
    Delete(EngineSession),
    RemoveDuplicates(EngineSession),
}

impl Session {
    fn kind(&self) -> Option<BatchKind> {
        match self {
            Self::Idle => None,
            Self::Add(_) => Some(BatchKind::Add),
            Self::Delete(_) => Some(BatchKind::Delete),
            Self::RemoveDuplicates(_) => Some(BatchKind::RemoveDuplicates),
        }
    }
}

/// State guarded by the batch lock.
///
/// The ledger outlives individual batches of a sequence: a non-final add batch
/// leaves it here for the next batch to continue.
#[derive(Debug, Default)]
pub(crate) struct BatchState {
    pub(crate) session: Session,
    pub(crate) ledger: Option<DocumentLedger>,
    /// Thread between a successful `begin_*` and its `end_*`.
    owner: Option<ThreadId>,
}

impl BatchState {
    pub(crate) fn ledger_or_restore(&mut self, index: &SearchIndex) -> &mut DocumentLedger {
        self.ledger
            .get_or_insert_with(|| DocumentLedger::restore(&index.index_dir))
    }

    fn held_elsewhere(&self) -> bool {
        self.owner
            .is_some_and(|owner| owner != thread::current().id())
    }

    /// Takes the session if it is of `kind`, leaving anything else in place.
    fn take(&mut self, kind: BatchKind) -> Result<EngineSession> {
        match (std::mem::take(&mut self.session), kind) {
            (Session::Add(engine), BatchKind::Add)
            | (Session::Delete(engine), BatchKind::Delete)
            | (Session::RemoveDuplicates(engine), BatchKind::RemoveDuplicates) => Ok(engine),
            (other, _) => {
                self.session = other;
                Err(IndexError::NoOpenBatch {
                    expected: kind.label(),
                })
            }
        }
    }
}

impl SearchIndex {
    pub(crate) fn lock_batch(&self) -> MutexGuard<'_, BatchState> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the batch state once no other thread has a batch open.
    fn lock_batch_for_begin(&self) -> MutexGuard<'_, BatchState> {
        let state = self.lock_batch();
        self.batch_released
            .wait_while(state, |state| state.held_elsewhere())
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn claim_batch(state: &mut BatchState) {
        state.owner = Some(thread::current().id());
    }

    fn release_batch(&self, state: &mut BatchState) {
        state.owner = None;
        self.batch_released.notify_all();
    }

    /// Kind of the batch currently open, if any.
    #[must_use]
    pub fn open_batch(&self) -> Option<BatchKind> {
        self.lock_batch().session.kind()
    }

    /// Opens an add batch.
    ///
    /// The index is recreated from scratch when it is missing, was built by an
    /// incompatible engine or analyzer, or carries the marker at the start of a
    /// sequence. Returns false (after logging) when the batch could not be opened.
    pub fn begin_add_batch(&self, step: BatchStep) -> bool {
        let mut state = self.lock_batch_for_begin();
        match self.try_begin_add(&mut state, step) {
            Ok(()) => {
                Self::claim_batch(&mut state);
                true
            }
            Err(err) => {
                self.release_batch(&mut state);
                tracing::error!(
                    index = %self.index_dir.display(),
                    error = %err,
                    "search indexing failed at begin add batch"
                );
                false
            }
        }
    }

    fn try_begin_add(&self, state: &mut BatchState, step: BatchStep) -> Result<()> {
        self.close_stray_session(state);
        let recreate = !self.index_dir.is_dir()
            || !engine::index_exists(&self.index_dir)
            || !self.dependencies_compatible()
            || (self.has_inconsistency_marker() && step.is_first());
        if recreate {
            if self.index_dir.exists() {
                fs_err::remove_dir_all(&self.index_dir)?;
            }
            if fs_err::create_dir_all(&self.index_dir).is_err() || !self.index_dir.is_dir() {
                return Err(IndexError::DirectoryUnavailable {
                    path: self.index_dir.clone(),
                });
            }
        }
        tracing::debug!(
            index = %self.index_dir.display(),
            recreate,
            ?step,
            "beginning add batch"
        );

        let ledger = if recreate {
            DocumentLedger::empty(&self.index_dir)
        } else {
            match state.ledger.take() {
                Some(carried) if !step.is_first() => carried,
                _ => DocumentLedger::restore(&self.index_dir),
            }
        };
        self.mark_inconsistent();
        let engine = if recreate {
            EngineSession::create(&self.index_dir, &self.analyzer, &self.options)?
        } else {
            EngineSession::open(&self.index_dir, &self.analyzer, &self.options, false)?
        };
        state.ledger = Some(ledger);
        state.session = Session::Add(engine);
        Ok(())
    }

    /// Indexes one document through the participant chosen for it.
    ///
    /// The ledger records the document only once the engine accepted it.
    pub fn add_document(&self, name: &str, locator: &DocumentLocator) -> Status {
        tracing::debug!(index = %self.index_dir.display(), name, "adding document");
        let mut state = self.lock_batch();
        let BatchState { session, ledger, .. } = &mut *state;
        let Session::Add(engine) = session else {
            return Status::error(
                format!("no add batch is open for document {name}"),
                Some(IndexError::NoOpenBatch {
                    expected: BatchKind::Add.label(),
                }),
            );
        };

        let request = DocumentRequest::new(name, locator);
        let mut record = engine.new_record();
        record.set_name(name);
        record.set_uid(&uuid::Uuid::new_v4().to_string());
        if let Some(tag) = &self.options.relative_path {
            record.set_index_id(tag);
        }
        if let Some(hook) = &self.extra_fields {
            hook(name, &mut record);
        }

        let participant = self.participants.resolve(
            locator.participant_id.as_deref(),
            request.plugin_id,
            name,
        );
        let status = run_participant(participant.as_ref(), self, &request, &mut record);
        if !status.is_ok() {
            tracing::warn!(
                name,
                participant = participant.name(),
                status = %status,
                "document not indexed"
            );
            return status;
        }
        if let Some(id) = &locator.id {
            record.set_id(id);
        }
        if let Some(participant_id) = &locator.participant_id {
            record.set_participant_id(participant_id);
        }

        let filters = record.filters().map(str::to_string);
        match engine.add(record) {
            Ok(()) => {
                ledger
                    .get_or_insert_with(|| DocumentLedger::restore(&self.index_dir))
                    .put(name, filters.as_deref());
                Status::ok()
            }
            Err(err) => Status::error(
                format!(
                    "I/O failure while adding document {name} to index {}",
                    self.index_dir.display()
                ),
                Some(err),
            ),
        }
    }

    /// Lets a participant hand a document on to the participant registered for
    /// its type, or to the HTML fallback.
    ///
    /// Panics inside the delegate are reported as an error status.
    pub fn add_document_with_participant(
        &self,
        request: &DocumentRequest<'_>,
        record: &mut engine::DocumentRecord,
    ) -> Status {
        let participant = self
            .participants
            .for_document(request.plugin_id, request.name)
            .unwrap_or_else(|| self.participants.fallback());
        run_participant(participant.as_ref(), self, request, record)
    }

    /// Closes the add batch, committing and optionally compacting the index.
    ///
    /// On the last step of a sequence the ledger is flushed and the marker
    /// cleared; otherwise both stay pending for the next batch.
    pub fn end_add_batch(&self, optimize: bool, step: BatchStep) -> bool {
        let mut state = self.lock_batch();
        if state.held_elsewhere() {
            tracing::error!(
                index = %self.index_dir.display(),
                "end add batch called by a thread that does not own the batch"
            );
            return false;
        }
        let outcome = self.try_end_add(&mut state, optimize, step);
        if !matches!(outcome, Err(IndexError::NoOpenBatch { .. })) {
            self.release_batch(&mut state);
        }
        self.gate.invalidate();
        match outcome {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    index = %self.index_dir.display(),
                    error = %err,
                    "search indexing failed at end add batch"
                );
                false
            }
        }
    }

    fn try_end_add(&self, state: &mut BatchState, optimize: bool, step: BatchStep) -> Result<()> {
        let engine = state.take(BatchKind::Add)?;
        engine.finish(optimize)?;
        self.with_change_detector(|detector| detector.save())?;
        self.persist_dependency_versions()?;
        if step.is_last() {
            if let Some(ledger) = state.ledger.take() {
                ledger.save()?;
            }
            self.mark_consistent();
        }
        tracing::debug!(index = %self.index_dir.display(), ?step, "ended add batch");
        Ok(())
    }

    /// Opens a delete batch against the existing index.
    pub fn begin_delete_batch(&self) -> bool {
        let mut state = self.lock_batch_for_begin();
        match self.try_begin_deletion(&mut state, BatchKind::Delete) {
            Ok(()) => {
                Self::claim_batch(&mut state);
                true
            }
            Err(err) => {
                self.release_batch(&mut state);
                tracing::error!(
                    index = %self.index_dir.display(),
                    error = %err,
                    "search indexing failed at begin delete batch"
                );
                false
            }
        }
    }

    /// Opens a duplicate-removal batch, normally following a merge.
    pub fn begin_remove_duplicates_batch(&self) -> bool {
        let mut state = self.lock_batch_for_begin();
        match self.try_begin_deletion(&mut state, BatchKind::RemoveDuplicates) {
            Ok(()) => {
                Self::claim_batch(&mut state);
                true
            }
            Err(err) => {
                self.release_batch(&mut state);
                tracing::error!(
                    index = %self.index_dir.display(),
                    error = %err,
                    "search indexing failed at begin remove duplicates batch"
                );
                false
            }
        }
    }

    fn try_begin_deletion(&self, state: &mut BatchState, kind: BatchKind) -> Result<()> {
        self.close_stray_session(state);
        state.ledger_or_restore(self);
        self.mark_inconsistent();
        let engine = EngineSession::open(&self.index_dir, &self.analyzer, &self.options, true)?;
        state.session = match kind {
            BatchKind::RemoveDuplicates => Session::RemoveDuplicates(engine),
            _ => Session::Delete(engine),
        };
        tracing::debug!(index = %self.index_dir.display(), batch = kind.label(), "beginning batch");
        Ok(())
    }

    /// Deletes every record named `name` and drops it from the ledger.
    pub fn remove_document(&self, name: &str) -> Status {
        tracing::debug!(index = %self.index_dir.display(), name, "removing document");
        let mut state = self.lock_batch();
        let BatchState { session, ledger, .. } = &mut *state;
        let Session::Delete(engine) = session else {
            return Status::error(
                format!(
                    "no delete batch is open to remove document {name} from index {}",
                    self.index_dir.display()
                ),
                Some(IndexError::NoOpenBatch {
                    expected: BatchKind::Delete.label(),
                }),
            );
        };
        engine.delete_name(name);
        if let Some(ledger) = ledger {
            ledger.remove(name);
        }
        Status::ok()
    }

    pub fn end_delete_batch(&self) -> bool {
        self.end_deletion(BatchKind::Delete)
    }

    pub fn end_remove_duplicates_batch(&self) -> bool {
        self.end_deletion(BatchKind::RemoveDuplicates)
    }

    fn end_deletion(&self, kind: BatchKind) -> bool {
        let mut state = self.lock_batch();
        if state.held_elsewhere() {
            tracing::error!(
                index = %self.index_dir.display(),
                batch = kind.label(),
                "end of batch called by a thread that does not own the batch"
            );
            return false;
        }
        let outcome = self.try_end_deletion(&mut state, kind);
        if !matches!(outcome, Err(IndexError::NoOpenBatch { .. })) {
            self.release_batch(&mut state);
        }
        self.gate.invalidate();
        match outcome {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(
                    index = %self.index_dir.display(),
                    batch = kind.label(),
                    error = %err,
                    "search indexing failed at end of batch"
                );
                false
            }
        }
    }

    fn try_end_deletion(&self, state: &mut BatchState, kind: BatchKind) -> Result<()> {
        let engine = state.take(kind)?;
        engine.finish(false)?;
        if let Some(ledger) = state.ledger.take() {
            ledger.save()?;
        }
        self.with_change_detector(|detector| detector.save())?;
        self.persist_dependency_versions()?;
        self.mark_consistent();
        tracing::debug!(index = %self.index_dir.display(), batch = kind.label(), "ended batch");
        Ok(())
    }

    /// Commits whatever a previous, never-ended batch left open.
    fn close_stray_session(&self, state: &mut BatchState) {
        let stray = std::mem::take(&mut state.session);
        let (kind, engine) = match stray {
            Session::Idle => return,
            Session::Add(engine) => (BatchKind::Add, engine),
            Session::Delete(engine) => (BatchKind::Delete, engine),
            Session::RemoveDuplicates(engine) => (BatchKind::RemoveDuplicates, engine),
        };
        tracing::warn!(batch = kind.label(), "closing batch that was never ended");
        if let Err(err) = engine.finish(false) {
            tracing::error!(
                batch = kind.label(),
                error = %err,
                "stray batch could not be committed"
            );
        }
    }
}
