use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{Index, IndexReader, TantivyDocument};

use super::analyzer::AnalyzerDescriptor;
use super::schema::HelpSchema;
use super::{open_index, open_reader};
use crate::error::{QueryTooComplex, Result};
use crate::types::{SearchHit, SearchQuery};

/// Read-only view over the on-disk index as of the moment it was opened.
pub struct SearchView {
    index: Index,
    schema: HelpSchema,
    reader: IndexReader,
}

impl SearchView {
    pub fn open(dir: &Path, analyzer: &AnalyzerDescriptor) -> Result<Self> {
        let (index, schema) = open_index(dir, analyzer)?;
        let reader = open_reader(&index)?;
        Ok(Self {
            index,
            schema,
            reader,
        })
    }

    /// Runs `query`, returning its hits and the terms worth highlighting.
    ///
    /// `Ok(None)` means the query text produced nothing to search for.
    pub fn search(
        &self,
        query: &SearchQuery,
        max_clauses: usize,
        max_hits: usize,
    ) -> Result<Option<(Vec<SearchHit>, String)>> {
        let fields = self.fields_for(query);
        if query.search_word.trim().is_empty() || fields.is_empty() {
            return Ok(None);
        }
        let mut parser = QueryParser::for_index(&self.index, fields);
        parser.set_conjunction_by_default();
        let parsed = parser.parse_query(&query.search_word)?;

        let mut clauses = 0usize;
        let mut highlight: Vec<String> = Vec::new();
        parsed.query_terms(&mut |term, _| {
            clauses += 1;
            if let Some(text) = term.value().as_str() {
                if !highlight.iter().any(|seen| seen == text) {
                    highlight.push(text.to_string());
                }
            }
        });
        if clauses > max_clauses {
            return Err(QueryTooComplex {
                clauses,
                limit: max_clauses,
            }
            .into());
        }

        let searcher = self.reader.searcher();
        let top = searcher.search(&*parsed, &TopDocs::with_limit(max_hits.max(1)))?;
        let mut hits = Vec::with_capacity(top.len());
        for (score, address) in top {
            let doc: TantivyDocument = searcher.doc(address)?;
            let Some(href) = stored_text(&doc, self.schema.name) else {
                continue;
            };
            hits.push(SearchHit {
                href,
                score,
                title: stored_text(&doc, self.schema.title),
                summary: stored_text(&doc, self.schema.summary),
                filters: stored_text(&doc, self.schema.filters),
                id: stored_text(&doc, self.schema.id),
                participant_id: stored_text(&doc, self.schema.participant_id),
            });
        }
        Ok(Some((hits, highlight.join(" "))))
    }

    fn fields_for(&self, query: &SearchQuery) -> Vec<Field> {
        let mut fields = if query.field_search {
            Vec::new()
        } else {
            self.schema.default_search_fields()
        };
        for name in &query.field_names {
            if let Some(field) = self.schema.text_field(name) {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        fields
    }
}

fn stored_text(doc: &TantivyDocument, field: Field) -> Option<String> {
    doc.get_first(field)
        .and_then(|value| value.as_str())
        .map(str::to_string)
}
