use std::collections::HashMap;

use tantivy::TantivyDocument;
use tantivy::schema::Field;

use super::schema::HelpSchema;
use crate::constants::{
    FIELD_CONTENTS, FIELD_FILTERS, FIELD_ID, FIELD_PARTICIPANT_ID, FIELD_SUMMARY, FIELD_TITLE,
};
use crate::error::{IndexError, Result};

/// A record under construction, handed to participants to fill in.
///
/// Analysed text is capped at `max_field_terms` whitespace-separated terms per
/// field; anything past the cap is dropped before it reaches the engine.
#[derive(Debug)]
pub struct DocumentRecord {
    schema: HelpSchema,
    doc: TantivyDocument,
    filters: Option<String>,
    max_field_terms: usize,
    terms_per_field: HashMap<Field, usize>,
}

impl DocumentRecord {
    pub(crate) fn new(schema: HelpSchema, max_field_terms: usize) -> Self {
        Self {
            schema,
            doc: TantivyDocument::default(),
            filters: None,
            max_field_terms,
            terms_per_field: HashMap::new(),
        }
    }

    pub fn add_title(&mut self, title: &str) {
        let field = self.schema.title;
        self.add_analysed(field, title);
    }

    pub fn add_contents(&mut self, contents: &str) {
        let field = self.schema.contents;
        self.add_analysed(field, contents);
    }

    pub fn add_summary(&mut self, summary: &str) {
        let field = self.schema.summary;
        self.add_analysed(field, summary);
    }

    /// Sets the filter tag recorded in the ledger for this document.
    ///
    /// Only the first tag is kept; later calls are ignored.
    pub fn set_filters(&mut self, filters: &str) {
        if self.filters.is_some() {
            tracing::debug!(filters, "filter tag already set");
            return;
        }
        self.doc.add_text(self.schema.filters, filters);
        self.filters = Some(filters.to_string());
    }

    /// Adds text to a field by name, for participants that produce generic field maps.
    pub fn add_text(&mut self, field_name: &str, text: &str) -> Result<()> {
        match field_name {
            FIELD_TITLE => self.add_title(text),
            FIELD_CONTENTS => self.add_contents(text),
            FIELD_SUMMARY => self.add_summary(text),
            FIELD_FILTERS => self.set_filters(text),
            FIELD_ID | FIELD_PARTICIPANT_ID => {
                return Err(IndexError::Participant {
                    reason: format!("field {field_name} is reserved"),
                });
            }
            other => {
                return Err(IndexError::Participant {
                    reason: format!("unknown field {other}"),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn filters(&self) -> Option<&str> {
        self.filters.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.doc.add_text(self.schema.name, name);
    }

    pub(crate) fn set_index_id(&mut self, tag: &str) {
        self.doc.add_text(self.schema.index_id, tag);
    }

    pub(crate) fn set_uid(&mut self, uid: &str) {
        self.doc.add_text(self.schema.uid, uid);
    }

    pub(crate) fn set_id(&mut self, id: &str) {
        self.doc.add_text(self.schema.id, id);
    }

    pub(crate) fn set_participant_id(&mut self, participant_id: &str) {
        self.doc.add_text(self.schema.participant_id, participant_id);
    }

    pub(crate) fn into_document(self) -> TantivyDocument {
        self.doc
    }

    fn add_analysed(&mut self, field: Field, text: &str) {
        let used = self.terms_per_field.entry(field).or_insert(0);
        let budget = self.max_field_terms.saturating_sub(*used);
        if budget == 0 {
            return;
        }
        let (kept, terms) = truncate_terms(text, budget);
        *used += terms;
        if kept.len() < text.len() {
            tracing::debug!(terms = self.max_field_terms, "field text truncated at term limit");
        }
        if !kept.is_empty() {
            self.doc.add_text(field, kept);
        }
    }
}

/// Longest prefix of `text` holding at most `max_terms` terms, and its term count.
fn truncate_terms(text: &str, max_terms: usize) -> (&str, usize) {
    let mut terms = 0usize;
    let mut in_term = false;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_term = false;
        } else if !in_term {
            in_term = true;
            if terms == max_terms {
                return (text[..idx].trim_end(), terms);
            }
            terms += 1;
        }
    }
    (text, terms)
}
