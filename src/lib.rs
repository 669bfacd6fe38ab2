#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Documentation lints: internal helpers are self-describing; the public handle
// and its batch methods carry their own docs.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Cast safety: segment ordinals and hit counts are bounded by the engine.
#![allow(clippy::cast_possible_truncation)]
//
// Style/complexity: batch bookkeeping reads better in one place.
#![allow(clippy::too_many_lines)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::similar_names)]
// e.g., index_id, index_dir are intentionally similar
//
// Pattern matching: these pedantic lints often suggest changes that reduce clarity.
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
//
// Performance/ergonomics trade-offs that are acceptable for this codebase:
#![allow(clippy::needless_pass_by_value)] // Many builders take owned values intentionally
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't need must_use on every method
//
// Low-value pedantic lints that add noise:
#![allow(clippy::case_sensitive_file_extension_comparisons)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::new_without_default)]
//
// Return value wrapping: some helpers return Result for symmetry with their siblings.
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::unused_self)]

/// The helpindex-core crate version (matches `Cargo.toml`).
pub const HELPINDEX_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod changes;
pub mod constants;
pub mod engine;
pub mod error;
pub mod href;
pub mod io;
pub mod ledger;
mod lock;
pub mod participant;
mod search_index;
pub mod types;

pub use changes::{ChangeDetector, PluginVersionInfo};
pub use engine::{AnalyzerDescriptor, DocumentRecord, engine_version};
pub use error::{IndexError, QueryTooComplex, Result};
pub use href::{DocumentLocator, indexable_href, indexable_locator, plugin_id_of};
pub use ledger::DocumentLedger;
pub use lock::FileLock;
pub use participant::{
    DocumentRequest, HtmlParticipant, ParticipantRegistry, SearchParticipant,
};
pub use search_index::{ExtraFields, SearchIndex, SearchIndexBuilder};
pub use types::{
    BatchKind, BatchStep, CancelToken, DuplicateMap, IndexOptions, IndexOptionsBuilder,
    PluginIndex, SearchHit, SearchHitCollector, SearchQuery, Severity, Status, VecHitCollector,
};
