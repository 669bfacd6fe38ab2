//! Integration tests for add/delete batches, the ledger invariant and crash flags.

mod common;

use std::collections::BTreeSet;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use helpindex_core::{
    AnalyzerDescriptor, BatchKind, BatchStep, DocumentLocator, IndexError, ParticipantRegistry,
    SearchIndex, Severity,
};

use common::{MemoryParticipant, add_all, assert_ledger_matches_engine, hrefs, open_index, search};

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|name| (*name).to_string()).collect()
}

#[test]
fn standalone_add_batch_builds_usable_index() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());
    assert!(!index.exists());
    assert!(index.needs_updating());

    add_all(&index, &["/org.docs/a.html", "/org.docs/b.html", "/org.docs/c.html"]);

    assert!(index.exists());
    assert!(index.is_usable());
    assert!(!index.has_inconsistency_marker());
    assert_eq!(index.open_batch(), None);
    assert_eq!(
        index.indexed_docs().keys(),
        names(&["/org.docs/a.html", "/org.docs/b.html", "/org.docs/c.html"])
    );
    assert_ledger_matches_engine(&index);
}

#[test]
fn delete_batch_keeps_ledger_in_step_with_engine() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());
    add_all(&index, &["/org.docs/a.html", "/org.docs/b.html"]);

    assert!(index.begin_delete_batch());
    assert_eq!(index.open_batch(), Some(BatchKind::Delete));
    assert!(index.has_inconsistency_marker());
    assert!(index.remove_document("/org.docs/a.html").is_ok());
    assert!(index.end_delete_batch());

    assert!(index.is_usable());
    assert_eq!(index.indexed_docs().keys(), names(&["/org.docs/b.html"]));
    assert_ledger_matches_engine(&index);
}

#[test]
fn failed_documents_stay_out_of_ledger_and_engine() {
    let temp = TempDir::new().unwrap();
    let participant = MemoryParticipant {
        failing: vec!["/org.docs/broken.html".to_string()],
        ..MemoryParticipant::default()
    };
    let index = open_index(&temp.path().join("en"), participant);

    assert!(index.begin_add_batch(BatchStep::Standalone));
    let ok = index.add_document(
        "/org.docs/a.html",
        &DocumentLocator::new("/org.docs/a.html", "en"),
    );
    let failed = index.add_document(
        "/org.docs/broken.html",
        &DocumentLocator::new("/org.docs/broken.html", "en"),
    );
    assert!(index.end_add_batch(false, BatchStep::Standalone));

    assert!(ok.is_ok());
    assert_eq!(failed.severity(), Severity::Error);
    assert_eq!(index.indexed_docs().keys(), names(&["/org.docs/a.html"]));
    assert_ledger_matches_engine(&index);
}

#[test]
fn sequence_keeps_marker_until_last_step() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());

    assert!(index.begin_add_batch(BatchStep::SequenceStart));
    assert!(
        index
            .add_document(
                "/org.docs/a.html",
                &DocumentLocator::new("/org.docs/a.html", "en")
            )
            .is_ok()
    );
    assert!(index.end_add_batch(false, BatchStep::SequenceStart));
    assert!(index.has_inconsistency_marker());
    assert!(!index.is_usable());

    assert!(index.begin_add_batch(BatchStep::SequenceEnd));
    assert!(
        index
            .add_document(
                "/org.docs/b.html",
                &DocumentLocator::new("/org.docs/b.html", "en")
            )
            .is_ok()
    );
    assert!(index.end_add_batch(true, BatchStep::SequenceEnd));

    assert!(!index.has_inconsistency_marker());
    assert!(index.is_usable());
    assert_eq!(
        index.indexed_docs().keys(),
        names(&["/org.docs/a.html", "/org.docs/b.html"])
    );
    assert_ledger_matches_engine(&index);
}

#[test]
fn leftover_marker_forces_rebuild_on_next_sequence() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("en");
    {
        let index = open_index(&dir, MemoryParticipant::default());
        add_all(&index, &["/org.docs/old.html"]);
        // Simulate a crash in the middle of a later batch.
        index.mark_inconsistent();
    }

    let index = open_index(&dir, MemoryParticipant::default());
    assert!(!index.is_usable());
    assert!(!index.exists());
    assert!(index.needs_updating());
    assert!(index.indexed_docs().is_empty());

    add_all(&index, &["/org.docs/new.html"]);
    assert!(index.is_usable());
    assert_eq!(index.indexed_docs().keys(), names(&["/org.docs/new.html"]));
    assert_ledger_matches_engine(&index);
}

#[test]
fn batch_boundaries_without_open_batch_fail_softly() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());

    assert!(!index.end_add_batch(false, BatchStep::Standalone));
    assert!(!index.end_delete_batch());
    assert!(!index.end_remove_duplicates_batch());

    let status = index.add_document(
        "/org.docs/a.html",
        &DocumentLocator::new("/org.docs/a.html", "en"),
    );
    assert_eq!(status.severity(), Severity::Error);
    assert!(matches!(status.source(), Some(IndexError::NoOpenBatch { .. })));

    let status = index.remove_document("/org.docs/a.html");
    assert_eq!(status.severity(), Severity::Error);
}

#[test]
fn delete_batch_on_missing_index_fails() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());
    assert!(!index.begin_delete_batch());
    assert_eq!(index.open_batch(), None);
}

#[test]
fn analyzer_change_makes_index_unusable() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("en");
    {
        let index = SearchIndex::builder("en", &dir)
            .analyzer(AnalyzerDescriptor::with_id("custom#1.0.0?locale=en", "en"))
            .participants(ParticipantRegistry::new(MemoryParticipant::default()))
            .build();
        add_all(&index, &["/org.docs/a.html"]);
        assert!(index.is_usable());
    }

    let index = open_index(&dir, MemoryParticipant::default());
    assert!(!index.is_analyzer_compatible(Some("custom#1.0.0?locale=en")));
    assert!(!index.has_inconsistency_marker());
    assert!(!index.is_usable());
}

#[test]
fn engine_versions_compare_without_qualifier() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());
    let current = helpindex_core::engine_version();

    assert!(index.is_engine_compatible(Some(current)));
    assert!(index.is_engine_compatible(Some(&format!("{current}.build7"))));
    assert!(!index.is_engine_compatible(Some("0.0.1")));
    assert!(!index.is_engine_compatible(None));
}

#[test]
fn extra_fields_hook_runs_for_every_record() {
    let temp = TempDir::new().unwrap();
    let index = SearchIndex::builder("en", temp.path().join("en"))
        .participants(ParticipantRegistry::new(MemoryParticipant::default()))
        .extra_fields(|_, record| record.add_summary("zebra"))
        .build();
    add_all(&index, &["/org.docs/a.html"]);

    let mut collector = helpindex_core::VecHitCollector::default();
    index
        .search(
            &helpindex_core::SearchQuery::new("zebra").in_fields(["summary"]),
            &mut collector,
        )
        .unwrap();
    assert_eq!(hrefs(&collector), vec!["/org.docs/a.html".to_string()]);
    assert!(search(&index, "zebra").hits.is_empty());
}

#[test]
fn batch_from_another_thread_waits_for_open_batch_to_end() {
    let temp = TempDir::new().unwrap();
    let index = open_index(&temp.path().join("en"), MemoryParticipant::default());
    add_all(&index, &["/org.docs/a.html", "/org.docs/b.html"]);

    assert!(index.begin_add_batch(BatchStep::Standalone));
    let (began_tx, began_rx) = mpsc::channel();

    thread::scope(|scope| {
        let deleter = scope.spawn(|| {
            let began = index.begin_delete_batch();
            began_tx.send(began).unwrap();
            let removed = index.remove_document("/org.docs/a.html");
            assert!(removed.is_ok(), "{removed}");
            index.end_delete_batch()
        });

        assert!(began_rx.recv_timeout(Duration::from_millis(300)).is_err());
        assert_eq!(index.open_batch(), Some(BatchKind::Add));

        let name = "/org.docs/c.html";
        let status = index.add_document(name, &DocumentLocator::new(name, "en"));
        assert!(status.is_ok(), "{status}");
        assert!(!index.end_delete_batch());
        assert!(index.end_add_batch(false, BatchStep::Standalone));

        assert!(began_rx.recv_timeout(Duration::from_secs(10)).unwrap());
        assert!(deleter.join().unwrap());
    });

    assert_eq!(index.open_batch(), None);
    assert!(index.is_usable());
    assert_eq!(
        index.indexed_docs().keys(),
        names(&["/org.docs/b.html", "/org.docs/c.html"])
    );
    assert_ledger_matches_engine(&index);
}

#[test]
fn first_filter_value_wins() {
    let temp = TempDir::new().unwrap();
    let index = SearchIndex::builder("en", temp.path().join("en"))
        .participants(ParticipantRegistry::new(MemoryParticipant::default()))
        .extra_fields(|_, record| {
            record.set_filters("os=linux");
            record.set_filters("os=win32");
        })
        .build();
    add_all(&index, &["/org.docs/a.html"]);

    assert_eq!(index.indexed_docs().filters("/org.docs/a.html"), Some("os=linux"));
    let hits = search(&index, "content").hits;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].filters.as_deref(), Some("os=linux"));
}
