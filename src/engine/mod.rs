//! Thin adapter over the embedded search engine.
//!
//! Everything engine-specific (directory layout, writer tuning, posting lists,
//! copying records between indexes) lives here; the rest of the crate treats the
//! engine as a black box reached through these functions.

mod analyzer;
mod postings;
mod record;
mod schema;
mod session;
mod version;
mod view;

use std::collections::BTreeSet;
use std::path::Path;

use tantivy::directory::MmapDirectory;
use tantivy::indexer::LogMergePolicy;
use tantivy::Document as _;
use tantivy::schema::Value;
use tantivy::{
    DocAddress, Index, IndexReader, IndexSettings, IndexWriter, ReloadPolicy, Searcher,
    TantivyDocument,
};

pub use analyzer::AnalyzerDescriptor;
pub use postings::{intersect, records_with_both};
pub use record::DocumentRecord;
pub use schema::HelpSchema;
pub use session::EngineSession;
pub use version::{Version, engine_version, versions_compatible};
pub use view::SearchView;

use crate::constants::FIELD_UID;
use crate::error::{IndexError, Result};
use crate::types::IndexOptions;

/// Engines refuse writers with a smaller per-thread budget than this.
const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;

/// True when `dir` holds engine metadata (and so can be opened).
#[must_use]
pub fn index_exists(dir: &Path) -> bool {
    dir.join("meta.json").is_file()
}

/// Creates a fresh, empty engine index in an existing directory.
pub fn create_index(
    dir: &Path,
    schema: &HelpSchema,
    analyzer: &AnalyzerDescriptor,
) -> Result<Index> {
    let directory = MmapDirectory::open(dir)?;
    let index = Index::create(directory, schema.schema.clone(), IndexSettings::default())?;
    analyzer.register(&index);
    Ok(index)
}

/// Opens an existing engine index and resolves its field handles.
pub fn open_index(dir: &Path, analyzer: &AnalyzerDescriptor) -> Result<(Index, HelpSchema)> {
    let index = Index::open_in_dir(dir)?;
    analyzer.register(&index);
    let schema = HelpSchema::from_schema(index.schema())?;
    Ok((index, schema))
}

pub fn open_writer(index: &Index, options: &IndexOptions) -> Result<IndexWriter<TantivyDocument>> {
    let heap = options.heap_size_bytes.max(MIN_WRITER_HEAP_BYTES);
    let writer = index.writer::<TantivyDocument>(heap)?;
    let mut policy = LogMergePolicy::default();
    policy.set_min_num_segments(options.merge_fan_in.max(2));
    writer.set_merge_policy(Box::new(policy));
    Ok(writer)
}

pub fn open_reader(index: &Index) -> Result<IndexReader> {
    let reader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;
    Ok(reader)
}

/// Merges every searchable segment into one.
pub fn compact(index: &Index, writer: &mut IndexWriter<TantivyDocument>) -> Result<()> {
    let segments = index.searchable_segment_ids()?;
    if segments.len() > 1 {
        writer.merge(&segments).wait()?;
    }
    Ok(())
}

/// Opens a sub-index whose records will be folded into another index.
pub fn open_source(dir: &Path) -> Result<Index> {
    Ok(Index::open_in_dir(dir)?)
}

/// Copies every live record of `source` into `writer`.
///
/// Records are matched to the target schema by field name and get a fresh
/// `uid`, so folding the same source twice never produces colliding keys.
pub fn fold_index(
    source: &Index,
    target: &HelpSchema,
    writer: &IndexWriter<TantivyDocument>,
) -> Result<usize> {
    let source_schema = source.schema();
    let searcher = open_reader(source)?.searcher();

    let mut copied = 0usize;
    for (ord, segment) in searcher.segment_readers().iter().enumerate() {
        for doc in segment.doc_ids_alive() {
            let stored: TantivyDocument = searcher.doc(DocAddress::new(ord as u32, doc))?;
            let mut fields: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&stored.to_json(&source_schema))?;
            fields.insert(
                FIELD_UID.to_string(),
                serde_json::Value::from(vec![uuid::Uuid::new_v4().to_string()]),
            );
            let json = serde_json::to_string(&fields)?;
            let record = TantivyDocument::parse_json(&target.schema, &json).map_err(|err| {
                IndexError::InvalidRecord {
                    reason: err.to_string(),
                }
            })?;
            writer.add_document(record)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Names of every live record visible to `searcher`.
pub fn live_names(searcher: &Searcher, schema: &HelpSchema) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for (ord, segment) in searcher.segment_readers().iter().enumerate() {
        for doc in segment.doc_ids_alive() {
            let stored: TantivyDocument = searcher.doc(DocAddress::new(ord as u32, doc))?;
            if let Some(name) = stored.get_first(schema.name).and_then(|value| value.as_str()) {
                names.insert(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Names of every live record in the index stored in `dir`.
pub fn document_names(dir: &Path, analyzer: &AnalyzerDescriptor) -> Result<BTreeSet<String>> {
    let (index, schema) = open_index(dir, analyzer)?;
    let searcher = open_reader(&index)?.searcher();
    live_names(&searcher, &schema)
}
