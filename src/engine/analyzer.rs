//! Locale-aware text analysis bound to the `help_text` tokenizer name.

use tantivy::Index;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer,
};

use super::version::versions_compatible;
use crate::constants::HELP_TOKENIZER;

const ANALYZER_FAMILY: &str = "helpindex";
const MAX_TOKEN_BYTES: usize = 40;

/// Identifies the analyzer an index is built with.
///
/// Ids look like `helpindex#0.3.0?locale=en`. Two ids are compatible when family
/// and parameters match and the versions agree at `major.minor.micro`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerDescriptor {
    id: String,
    locale: String,
}

impl AnalyzerDescriptor {
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        Self {
            id: format!(
                "{ANALYZER_FAMILY}#{}?locale={locale}",
                env!("CARGO_PKG_VERSION")
            ),
            locale: locale.to_string(),
        }
    }

    /// Descriptor with an explicit id, for analyzers versioned outside this crate.
    #[must_use]
    pub fn with_id(id: impl Into<String>, locale: &str) -> Self {
        Self {
            id: id.into(),
            locale: locale.to_string(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Whether an index recorded with `analyzer_id` can be queried with this analyzer.
    #[must_use]
    pub fn is_compatible(&self, analyzer_id: &str) -> bool {
        if analyzer_id == self.id {
            return true;
        }
        let (family, version, params) = split_id(&self.id);
        let (other_family, other_version, other_params) = split_id(analyzer_id);
        family == other_family
            && params == other_params
            && !version.is_empty()
            && versions_compatible(Some(other_version), version)
    }

    #[must_use]
    pub fn text_analyzer(&self) -> TextAnalyzer {
        let builder = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(MAX_TOKEN_BYTES))
            .filter(LowerCaser);
        if self.locale.to_ascii_lowercase().starts_with("en") {
            builder.filter(Stemmer::new(Language::English)).build()
        } else {
            builder.build()
        }
    }

    /// Binds this analyzer to the tokenizer name used by the analysed fields.
    pub fn register(&self, index: &Index) {
        index.tokenizers().register(HELP_TOKENIZER, self.text_analyzer());
    }
}

fn split_id(id: &str) -> (&str, &str, &str) {
    let (family, rest) = id.split_once('#').unwrap_or((id, ""));
    let (version, params) = rest.split_once('?').unwrap_or((rest, ""));
    (family, version, params)
}
