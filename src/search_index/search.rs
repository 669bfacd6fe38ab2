//! Query execution gate.
//!
//! Searches register a guard for their whole duration. `close` stops new
//! searches, waits for the registered ones to drop their guards and then
//! releases the shared view. Views are opened lazily and replaced whenever a
//! batch ends, so a running search keeps the view it started with.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::engine::SearchView;
use crate::error::{IndexError, QueryTooComplex, Result};
use crate::types::{SearchHitCollector, SearchQuery};

use super::SearchIndex;

pub(crate) struct SearchGate {
    closed: AtomicBool,
    active: Mutex<usize>,
    idle: Condvar,
    view: Mutex<Option<Arc<SearchView>>>,
}

/// Registration of one in-flight search; dropping it unregisters.
struct ActiveSearch<'a> {
    gate: &'a SearchGate,
}

impl Drop for ActiveSearch<'_> {
    fn drop(&mut self) {
        let mut active = self.gate.active.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.gate.idle.notify_all();
        }
    }
}

impl SearchGate {
    pub(crate) fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
            active: Mutex::new(0),
            idle: Condvar::new(),
            view: Mutex::new(None),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn register(&self) -> ActiveSearch<'_> {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        ActiveSearch { gate: self }
    }

    fn active(&self) -> usize {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The shared view, opened on first use after an invalidation.
    fn view_or_open(&self, open: impl FnOnce() -> Result<SearchView>) -> Result<Arc<SearchView>> {
        let mut slot = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(view) = slot.as_ref() {
            return Ok(Arc::clone(view));
        }
        let view = Arc::new(open()?);
        *slot = Some(Arc::clone(&view));
        Ok(view)
    }

    /// Drops the shared view so the next search sees fresh data.
    pub(crate) fn invalidate(&self) {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Waits until no search is registered. Returns false if `timeout` ran out first.
    fn drain(&self, poll: Duration, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        while *active > 0 {
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    poll.min(deadline - now)
                }
                None => poll,
            };
            active = self
                .idle
                .wait_timeout(active, wait)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

impl SearchIndex {
    /// Runs `query` and hands the hits to `collector`.
    ///
    /// Does nothing once the index is closed. A query expanding past
    /// `max_clause_count` terms is reported as [`QueryTooComplex`]; every other
    /// failure is logged and leaves the collector untouched.
    pub fn search(
        &self,
        query: &SearchQuery,
        collector: &mut dyn SearchHitCollector,
    ) -> std::result::Result<(), QueryTooComplex> {
        if self.gate.is_closed() {
            return Ok(());
        }
        let _registered = self.gate.register();
        if self.gate.is_closed() {
            return Ok(());
        }
        match self.run_search(query, collector) {
            Ok(()) => Ok(()),
            Err(IndexError::QueryTooComplex(err)) => Err(err),
            Err(err) => {
                tracing::error!(
                    query = %query.search_word,
                    error = %err,
                    "search failed"
                );
                Ok(())
            }
        }
    }

    fn run_search(
        &self,
        query: &SearchQuery,
        collector: &mut dyn SearchHitCollector,
    ) -> Result<()> {
        let view = self
            .gate
            .view_or_open(|| SearchView::open(&self.index_dir, &self.analyzer))?;
        if let Some((hits, highlight_terms)) =
            view.search(query, self.options.max_clause_count, self.options.max_hits)?
        {
            collector.add_hits(hits, &highlight_terms);
        }
        Ok(())
    }

    /// Stops accepting searches, waits for running ones and releases the view.
    ///
    /// Waits indefinitely unless `drain_timeout` is configured; returns false
    /// when the timeout expired with searches still running.
    pub fn close(&self) -> bool {
        self.gate.closed.store(true, Ordering::SeqCst);
        let drained = self
            .gate
            .drain(self.options.drain_poll_interval, self.options.drain_timeout);
        if drained {
            self.gate.invalidate();
        } else {
            tracing::warn!(
                active = self.gate.active(),
                "search index closed with searches still running"
            );
        }
        drained
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.gate.is_closed()
    }

    /// Number of searches currently registered.
    #[must_use]
    pub fn active_searches(&self) -> usize {
        self.gate.active()
    }
}
