//! File names, field names and tuning defaults shared across the crate.

/// Ledger of document identifiers currently represented in the index.
pub const INDEXED_DOCS_FILE: &str = "indexed_docs";
/// Snapshot of contributing modules (and versions) from the last successful batch.
pub const INDEXED_CONTRIBUTION_INFO_FILE: &str = "indexed_contributions";
/// Engine version and analyzer id the on-disk index was built with.
pub const DEPENDENCIES_VERSION_FILENAME: &str = "indexed_dependencies";

pub const DEPENDENCIES_KEY_ENGINE: &str = "engine";
pub const DEPENDENCIES_KEY_ANALYZER: &str = "analyzer";

/// Suffix of the sibling marker file flagging a mid-update index.
pub const INCONSISTENT_SUFFIX: &str = "inconsistent";
/// Suffix of the sibling per-locale lock file.
pub const LOCK_SUFFIX: &str = "lock";

/// Ledger value meaning "no filter restrictions".
pub const NO_FILTERS: &str = "0";

pub const FIELD_NAME: &str = "name";
pub const FIELD_INDEX_ID: &str = "index_path";
pub const FIELD_UID: &str = "uid";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_CONTENTS: &str = "contents";
pub const FIELD_SUMMARY: &str = "summary";
pub const FIELD_FILTERS: &str = "filters";
pub const FIELD_ID: &str = "id";
pub const FIELD_PARTICIPANT_ID: &str = "participant_id";

/// Tokenizer name the analysed fields are bound to.
pub const HELP_TOKENIZER: &str = "help_text";

pub const DEFAULT_HEAP_SIZE_BYTES: usize = 50_000_000;
pub const DEFAULT_MERGE_FAN_IN: usize = 20;
pub const DEFAULT_MAX_FIELD_TERMS: usize = 1_000_000;
pub const DEFAULT_MAX_CLAUSE_COUNT: usize = 1024;
pub const DEFAULT_MAX_HITS: usize = 1000;
pub const DEFAULT_DRAIN_POLL_MS: u64 = 50;
/// Summary text length kept by the default HTML participant.
pub const SUMMARY_CHARS: usize = 200;
