//! Batch kinds and the position of a batch inside a multi-step indexing sequence.

use serde::{Deserialize, Serialize};

/// Kind of the batch currently open on a [`crate::SearchIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Add,
    Delete,
    RemoveDuplicates,
}

impl BatchKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::RemoveDuplicates => "remove-duplicates",
        }
    }
}

/// Where an add batch sits in the driver's sequence of batches.
///
/// A sequence (for example "merge prebuilt indexes, then add the remaining
/// documents") keeps the index flagged inconsistent from its first begin until
/// its last end, so a crash anywhere in between forces a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStep {
    /// A single batch that is both first and last.
    #[default]
    Standalone,
    SequenceStart,
    SequenceContinue,
    SequenceEnd,
}

impl BatchStep {
    /// True for the batch that opens a sequence. A leftover inconsistency marker
    /// only forces re-creation here; later steps append to the partial index.
    #[must_use]
    pub fn is_first(self) -> bool {
        matches!(self, Self::Standalone | Self::SequenceStart)
    }

    /// True for the batch whose clean end clears the inconsistency marker.
    #[must_use]
    pub fn is_last(self) -> bool {
        matches!(self, Self::Standalone | Self::SequenceEnd)
    }
}
