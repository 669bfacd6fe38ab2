//! Query and hit types exchanged with the query execution gate.

use serde::{Deserialize, Serialize};

/// A textual query plus the fields it is restricted to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search_word: String,
    /// Extra fields searched alongside the default ones.
    #[serde(default)]
    pub field_names: Vec<String>,
    /// When true only `field_names` are searched.
    #[serde(default)]
    pub field_search: bool,
}

impl SearchQuery {
    #[must_use]
    pub fn new(search_word: impl Into<String>) -> Self {
        Self {
            search_word: search_word.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names = fields.into_iter().map(Into::into).collect();
        self.field_search = true;
        self
    }
}

/// A single ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub href: String,
    pub score: f32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub filters: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub participant_id: Option<String>,
}

/// Receives the hits of one search together with the terms worth highlighting.
pub trait SearchHitCollector {
    fn add_hits(&mut self, hits: Vec<SearchHit>, highlight_terms: &str);
}

/// Collector that simply accumulates everything it is given.
#[derive(Debug, Clone, Default)]
pub struct VecHitCollector {
    pub hits: Vec<SearchHit>,
    pub highlight_terms: String,
}

impl SearchHitCollector for VecHitCollector {
    fn add_hits(&mut self, hits: Vec<SearchHit>, highlight_terms: &str) {
        self.hits.extend(hits);
        self.highlight_terms = highlight_terms.to_string();
    }
}
