//! Integration tests for the query execution gate.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use helpindex_core::{
    IndexOptions, SearchHit, SearchHitCollector, SearchQuery, VecHitCollector,
};

use common::{MemoryParticipant, add_all, hrefs, open_index, open_index_with, search};

/// Collector that announces itself and then takes its time.
struct SlowCollector<'a> {
    entered: mpsc::Sender<()>,
    delay: Duration,
    finished: &'a AtomicBool,
}

impl SearchHitCollector for SlowCollector<'_> {
    fn add_hits(&mut self, _hits: Vec<SearchHit>, _highlight_terms: &str) {
        let _ = self.entered.send(());
        thread::sleep(self.delay);
        self.finished.store(true, Ordering::SeqCst);
    }
}

#[test]
fn search_returns_hits_and_highlight_terms() {
    let temp = TempDir::new().unwrap();
    let participant = MemoryParticipant::with_pages([
        ("/org.docs/install.html", "Installing the workbench on Linux"),
        ("/org.docs/update.html", "Updating plugins"),
    ]);
    let index = open_index(&temp.path().join("en"), participant);
    add_all(&index, &["/org.docs/install.html", "/org.docs/update.html"]);

    let collector = search(&index, "Workbench");
    assert_eq!(hrefs(&collector), vec!["/org.docs/install.html".to_string()]);
    assert_eq!(collector.highlight_terms, "workbench");
    let hit = &collector.hits[0];
    assert_eq!(hit.title.as_deref(), Some("/org.docs/install.html"));
    assert!(hit.score > 0.0);
}

#[test]
fn query_past_clause_limit_is_too_complex() {
    let temp = TempDir::new().unwrap();
    let options = IndexOptions::builder().max_clause_count(3).build();
    let index = open_index_with(&temp.path().join("en"), MemoryParticipant::default(), options);
    add_all(&index, &["/org.docs/a.html"]);

    let mut collector = VecHitCollector::default();
    let err = index
        .search(&SearchQuery::new("alpha beta gamma delta"), &mut collector)
        .unwrap_err();
    assert_eq!(err.limit, 3);
    assert!(err.clauses > 3);
    assert!(collector.hits.is_empty());

    assert!(index.search(&SearchQuery::new("alpha"), &mut collector).is_ok());
}

#[test]
fn other_search_failures_yield_no_results() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());

    // No index on disk yet.
    assert!(search(&index, "anything").hits.is_empty());

    add_all(&index, &["/org.docs/a.html"]);
    assert!(search(&index, "nosuchfield:content").hits.is_empty());
    assert!(search(&index, "   ").hits.is_empty());
}

#[test]
fn finished_batch_refreshes_the_view() {
    let temp = TempDir::new().unwrap();
    let participant = MemoryParticipant::with_pages([
        ("/org.docs/a.html", "first page"),
        ("/org.docs/b.html", "second page"),
    ]);
    let index = open_index(&temp.path().join("en"), participant);
    add_all(&index, &["/org.docs/a.html"]);
    assert_eq!(search(&index, "page").hits.len(), 1);

    add_all(&index, &["/org.docs/b.html"]);
    assert_eq!(search(&index, "page").hits.len(), 2);
}

#[test]
fn close_waits_for_running_search() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());
    add_all(&index, &["/org.docs/a.html"]);
    let finished = AtomicBool::new(false);
    let (entered_tx, entered_rx) = mpsc::channel();

    thread::scope(|scope| {
        let searcher = scope.spawn(|| {
            let mut collector = SlowCollector {
                entered: entered_tx,
                delay: Duration::from_millis(300),
                finished: &finished,
            };
            index.search(&SearchQuery::new("content"), &mut collector)
        });

        entered_rx.recv().unwrap();
        assert_eq!(index.active_searches(), 1);
        assert!(index.close());
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(index.active_searches(), 0);
        assert!(searcher.join().unwrap().is_ok());
    });

    assert!(index.is_closed());
    assert!(search(&index, "content").hits.is_empty());
}

#[test]
fn bounded_drain_gives_up() {
    let temp = TempDir::new().unwrap();
    let options = IndexOptions::builder()
        .drain_timeout(Duration::from_millis(50))
        .drain_poll_interval(Duration::from_millis(10))
        .build();
    let index = open_index_with(&temp.path().join("en"), MemoryParticipant::default(), options);
    add_all(&index, &["/org.docs/a.html"]);
    let finished = AtomicBool::new(false);
    let (entered_tx, entered_rx) = mpsc::channel();

    thread::scope(|scope| {
        scope.spawn(|| {
            let mut collector = SlowCollector {
                entered: entered_tx,
                delay: Duration::from_millis(500),
                finished: &finished,
            };
            index.search(&SearchQuery::new("content"), &mut collector)
        });

        entered_rx.recv().unwrap();
        assert!(!index.close());
        assert!(!finished.load(Ordering::SeqCst));
    });

    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(index.active_searches(), 0);
}
