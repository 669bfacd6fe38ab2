use std::path::Path;

use tantivy::schema::Value;
use tantivy::{Index, IndexWriter, Searcher, TantivyDocument, Term};

use super::analyzer::AnalyzerDescriptor;
use super::postings::records_with_both;
use super::record::DocumentRecord;
use super::schema::HelpSchema;
use super::{compact, create_index, fold_index, open_index, open_reader, open_writer};
use crate::error::Result;
use crate::types::IndexOptions;

/// An open engine writer, optionally paired with a point-in-time searcher.
///
/// Add batches write records; delete and duplicate-removal batches only delete,
/// locating records through the snapshot taken when the session opened.
pub struct EngineSession {
    index: Index,
    schema: HelpSchema,
    writer: IndexWriter<TantivyDocument>,
    snapshot: Option<Searcher>,
    max_field_terms: usize,
}

impl EngineSession {
    /// Creates a fresh engine index inside the existing directory `dir`.
    pub fn create(
        dir: &Path,
        analyzer: &AnalyzerDescriptor,
        options: &IndexOptions,
    ) -> Result<Self> {
        let schema = HelpSchema::build();
        let index = create_index(dir, &schema, analyzer)?;
        Self::with_index(index, schema, options, false)
    }

    pub fn open(
        dir: &Path,
        analyzer: &AnalyzerDescriptor,
        options: &IndexOptions,
        with_snapshot: bool,
    ) -> Result<Self> {
        let (index, schema) = open_index(dir, analyzer)?;
        Self::with_index(index, schema, options, with_snapshot)
    }

    fn with_index(
        index: Index,
        schema: HelpSchema,
        options: &IndexOptions,
        with_snapshot: bool,
    ) -> Result<Self> {
        let snapshot = if with_snapshot {
            Some(open_reader(&index)?.searcher())
        } else {
            None
        };
        let writer = open_writer(&index, options)?;
        Ok(Self {
            index,
            schema,
            writer,
            snapshot,
            max_field_terms: options.max_field_terms,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &HelpSchema {
        &self.schema
    }

    /// A blank record bound to this index's schema.
    #[must_use]
    pub fn new_record(&self) -> DocumentRecord {
        DocumentRecord::new(self.schema.clone(), self.max_field_terms)
    }

    pub fn add(&self, record: DocumentRecord) -> Result<()> {
        self.writer.add_document(record.into_document())?;
        Ok(())
    }

    /// Deletes every record named `name`.
    pub fn delete_name(&self, name: &str) {
        self.writer
            .delete_term(Term::from_field_text(self.schema.name, name));
    }

    /// Deletes the records named `name` that carry the sub-index tag `tag`.
    ///
    /// Returns how many records were deleted. Needs a session opened with a
    /// snapshot; without one nothing is visible and nothing is deleted.
    pub fn delete_tagged(&self, name: &str, tag: &str) -> Result<usize> {
        let Some(searcher) = self.snapshot.as_ref() else {
            return Ok(0);
        };
        let name_term = Term::from_field_text(self.schema.name, name);
        let tag_term = Term::from_field_text(self.schema.index_id, tag);
        let mut deleted = 0usize;
        for address in records_with_both(searcher, &name_term, &tag_term)? {
            let stored: TantivyDocument = searcher.doc(address)?;
            match stored.get_first(self.schema.uid).and_then(|value| value.as_str()) {
                Some(uid) => {
                    self.writer
                        .delete_term(Term::from_field_text(self.schema.uid, uid));
                    deleted += 1;
                }
                None => {
                    tracing::warn!(name, tag, "record without uid cannot be deleted individually");
                }
            }
        }
        Ok(deleted)
    }

    /// Copies every live record of `source` into this session.
    pub fn fold(&self, source: &Index) -> Result<usize> {
        fold_index(source, &self.schema, &self.writer)
    }

    /// Commits pending changes, optionally compacts, and closes the writer.
    pub fn finish(mut self, optimize: bool) -> Result<()> {
        self.writer.commit()?;
        if optimize {
            compact(&self.index, &mut self.writer)?;
        }
        self.writer.wait_merging_threads()?;
        Ok(())
    }
}

impl std::fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineSession")
            .field("snapshot", &self.snapshot.is_some())
            .field("max_field_terms", &self.max_field_terms)
            .finish_non_exhaustive()
    }
}
