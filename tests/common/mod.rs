//! Shared fixtures: an in-memory participant and small batch helpers.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use helpindex_core::{
    BatchStep, DocumentLocator, DocumentRecord, DocumentRequest, IndexError, IndexOptions,
    ParticipantRegistry, SearchIndex, SearchParticipant, SearchQuery, Status, VecHitCollector,
};

/// Serves document text from memory; names listed in `failing` report an error.
#[derive(Clone, Default)]
pub struct MemoryParticipant {
    pub pages: Arc<Mutex<BTreeMap<String, String>>>,
    pub failing: Vec<String>,
}

impl MemoryParticipant {
    pub fn with_pages<'a>(pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let participant = Self::default();
        {
            let mut map = participant.pages.lock().unwrap();
            for (name, text) in pages {
                map.insert(name.to_string(), text.to_string());
            }
        }
        participant
    }
}

impl SearchParticipant for MemoryParticipant {
    fn name(&self) -> &str {
        "memory"
    }

    fn add_document(
        &self,
        _index: &SearchIndex,
        request: &DocumentRequest<'_>,
        record: &mut DocumentRecord,
    ) -> Status {
        if self.failing.iter().any(|name| name == request.name) {
            return Status::error(
                format!("cannot read {}", request.name),
                Some(IndexError::Participant {
                    reason: "unreadable".to_string(),
                }),
            );
        }
        let pages = self.pages.lock().unwrap();
        let text = pages
            .get(request.name)
            .cloned()
            .unwrap_or_else(|| format!("content of {}", request.name));
        record.add_title(request.name);
        record.add_contents(&text);
        Status::ok()
    }
}

pub fn open_index(dir: &Path, participant: MemoryParticipant) -> SearchIndex {
    open_index_with(dir, participant, IndexOptions::default())
}

pub fn open_index_with(
    dir: &Path,
    participant: MemoryParticipant,
    options: IndexOptions,
) -> SearchIndex {
    SearchIndex::builder("en", dir)
        .options(options)
        .participants(ParticipantRegistry::new(participant))
        .contribution("org.docs", "1.0.0")
        .build()
}

/// Runs one standalone add batch over `names`.
pub fn add_all(index: &SearchIndex, names: &[&str]) {
    assert!(index.begin_add_batch(BatchStep::Standalone));
    for name in names {
        let status = index.add_document(name, &DocumentLocator::new(*name, index.locale()));
        assert!(status.is_ok(), "{status}");
    }
    assert!(index.end_add_batch(true, BatchStep::Standalone));
}

pub fn search(index: &SearchIndex, text: &str) -> VecHitCollector {
    let mut collector = VecHitCollector::default();
    index
        .search(&SearchQuery::new(text), &mut collector)
        .expect("query within clause limit");
    collector
}

pub fn hrefs(collector: &VecHitCollector) -> Vec<String> {
    let mut hrefs: Vec<String> = collector.hits.iter().map(|hit| hit.href.clone()).collect();
    hrefs.sort();
    hrefs
}

/// The ledger mirrors the engine exactly.
pub fn assert_ledger_matches_engine(index: &SearchIndex) {
    let ledger = index.indexed_docs().keys();
    let engine = index.engine_document_names().unwrap();
    assert_eq!(ledger, engine);
}
