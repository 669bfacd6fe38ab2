use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};

use crate::constants::{
    FIELD_CONTENTS, FIELD_FILTERS, FIELD_ID, FIELD_INDEX_ID, FIELD_NAME, FIELD_PARTICIPANT_ID,
    FIELD_SUMMARY, FIELD_TITLE, FIELD_UID, HELP_TOKENIZER,
};
use crate::error::Result;

/// Field handles of the help index schema.
///
/// Every field is stored so that whole sub-indexes can be copied record by
/// record into another index.
#[derive(Debug, Clone)]
pub struct HelpSchema {
    pub schema: Schema,
    pub name: Field,
    pub index_id: Field,
    pub uid: Field,
    pub title: Field,
    pub contents: Field,
    pub summary: Field,
    pub filters: Field,
    pub id: Field,
    pub participant_id: Field,
}

impl HelpSchema {
    #[must_use]
    pub fn build() -> Self {
        let analysed = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(HELP_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let mut builder = Schema::builder();
        let name = builder.add_text_field(FIELD_NAME, STRING | STORED);
        let index_id = builder.add_text_field(FIELD_INDEX_ID, STRING | STORED);
        let uid = builder.add_text_field(FIELD_UID, STRING | STORED);
        let title = builder.add_text_field(FIELD_TITLE, analysed.clone());
        let contents = builder.add_text_field(FIELD_CONTENTS, analysed.clone());
        let summary = builder.add_text_field(FIELD_SUMMARY, analysed);
        let filters = builder.add_text_field(FIELD_FILTERS, STRING | STORED);
        let id = builder.add_text_field(FIELD_ID, STORED);
        let participant_id = builder.add_text_field(FIELD_PARTICIPANT_ID, STORED);

        Self {
            schema: builder.build(),
            name,
            index_id,
            uid,
            title,
            contents,
            summary,
            filters,
            id,
            participant_id,
        }
    }

    /// Resolves the field handles of an existing schema (e.g. one read back from disk).
    pub fn from_schema(schema: Schema) -> Result<Self> {
        Ok(Self {
            name: schema.get_field(FIELD_NAME)?,
            index_id: schema.get_field(FIELD_INDEX_ID)?,
            uid: schema.get_field(FIELD_UID)?,
            title: schema.get_field(FIELD_TITLE)?,
            contents: schema.get_field(FIELD_CONTENTS)?,
            summary: schema.get_field(FIELD_SUMMARY)?,
            filters: schema.get_field(FIELD_FILTERS)?,
            id: schema.get_field(FIELD_ID)?,
            participant_id: schema.get_field(FIELD_PARTICIPANT_ID)?,
            schema,
        })
    }

    /// Searchable (analysed) field by name.
    #[must_use]
    pub fn text_field(&self, name: &str) -> Option<Field> {
        match name {
            FIELD_TITLE => Some(self.title),
            FIELD_CONTENTS => Some(self.contents),
            FIELD_SUMMARY => Some(self.summary),
            _ => None,
        }
    }

    #[must_use]
    pub fn default_search_fields(&self) -> Vec<Field> {
        vec![self.title, self.contents]
    }
}
