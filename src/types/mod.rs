//! Public types exposed by the `helpindex-core` crate.

pub mod batch;
pub mod merge;
pub mod options;
pub mod search;
pub mod status;

pub use batch::{BatchKind, BatchStep};
pub use merge::{CancelToken, DuplicateMap, PluginIndex};
pub use options::{IndexOptions, IndexOptionsBuilder};
pub use search::{SearchHit, SearchHitCollector, SearchQuery, VecHitCollector};
pub use status::{Severity, Status};
