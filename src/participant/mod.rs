//! Content-type specific field extractors and the registry that picks one.

mod html;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

pub use html::HtmlParticipant;

use crate::engine::DocumentRecord;
use crate::error::IndexError;
use crate::href::{DocumentLocator, plugin_id_of};
use crate::search_index::SearchIndex;
use crate::types::Status;

/// What a participant is asked to index.
#[derive(Debug, Clone, Copy)]
pub struct DocumentRequest<'a> {
    /// Owning module, empty when the name has no `/plugin/` prefix.
    pub plugin_id: &'a str,
    pub name: &'a str,
    pub locator: &'a DocumentLocator,
}

impl<'a> DocumentRequest<'a> {
    #[must_use]
    pub fn new(name: &'a str, locator: &'a DocumentLocator) -> Self {
        Self {
            plugin_id: plugin_id_of(name).unwrap_or_default(),
            name,
            locator,
        }
    }
}

/// Populates the searchable fields of one record.
///
/// Implementations run while the index holds its batch lock: they may call
/// [`SearchIndex::add_document_with_participant`] but not the batch methods.
pub trait SearchParticipant: Send + Sync {
    /// Label used in diagnostics.
    fn name(&self) -> &str;

    /// True when this participant indexes `name` contributed by `plugin_id`.
    fn handles(&self, plugin_id: &str, name: &str) -> bool {
        let _ = (plugin_id, name);
        false
    }

    fn add_document(
        &self,
        index: &SearchIndex,
        request: &DocumentRequest<'_>,
        record: &mut DocumentRecord,
    ) -> Status;
}

/// Participants tried in order: explicit id, then pattern match, then the fallback.
pub struct ParticipantRegistry {
    global: BTreeMap<String, Arc<dyn SearchParticipant>>,
    patterns: Vec<Arc<dyn SearchParticipant>>,
    fallback: Arc<dyn SearchParticipant>,
}

impl ParticipantRegistry {
    pub fn new<P>(fallback: P) -> Self
    where
        P: SearchParticipant + 'static,
    {
        Self {
            global: BTreeMap::new(),
            patterns: Vec::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Registry whose fallback reads HTML files below `content_root`.
    #[must_use]
    pub fn with_html(content_root: impl Into<PathBuf>) -> Self {
        Self::new(HtmlParticipant::new(content_root))
    }

    /// Registers a participant reachable only through an explicit `participantId`.
    pub fn register_global<P>(&mut self, id: impl Into<String>, participant: P)
    where
        P: SearchParticipant + 'static,
    {
        self.global.insert(id.into(), Arc::new(participant));
    }

    /// Registers a participant consulted through [`SearchParticipant::handles`].
    pub fn register<P>(&mut self, participant: P)
    where
        P: SearchParticipant + 'static,
    {
        self.patterns.push(Arc::new(participant));
    }

    #[must_use]
    pub fn global(&self, id: &str) -> Option<&Arc<dyn SearchParticipant>> {
        self.global.get(id)
    }

    /// First pattern participant claiming the document.
    #[must_use]
    pub fn for_document(&self, plugin_id: &str, name: &str) -> Option<&Arc<dyn SearchParticipant>> {
        self.patterns
            .iter()
            .find(|participant| participant.handles(plugin_id, name))
    }

    #[must_use]
    pub fn fallback(&self) -> &Arc<dyn SearchParticipant> {
        &self.fallback
    }

    #[must_use]
    pub fn resolve(
        &self,
        participant_id: Option<&str>,
        plugin_id: &str,
        name: &str,
    ) -> &Arc<dyn SearchParticipant> {
        participant_id
            .and_then(|id| self.global(id))
            .or_else(|| self.for_document(plugin_id, name))
            .unwrap_or(&self.fallback)
    }

    /// True when some pattern participant claims `url`.
    #[must_use]
    pub fn is_indexable(&self, url: &str) -> bool {
        let plugin_id = plugin_id_of(url).unwrap_or_default();
        self.for_document(plugin_id, url).is_some()
    }
}

impl std::fmt::Debug for ParticipantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantRegistry")
            .field("global", &self.global.keys().collect::<Vec<_>>())
            .field("patterns", &self.patterns.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

/// Runs a participant, turning a panic into an error status.
pub(crate) fn run_participant(
    participant: &dyn SearchParticipant,
    index: &SearchIndex,
    request: &DocumentRequest<'_>,
    record: &mut DocumentRecord,
) -> Status {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        participant.add_document(index, request, record)
    }));
    outcome.unwrap_or_else(|_| {
        tracing::error!(
            participant = participant.name(),
            name = request.name,
            "participant panicked while adding document"
        );
        Status::error(
            format!(
                "participant {} failed while adding document {}",
                participant.name(),
                request.name
            ),
            Some(IndexError::Participant {
                reason: "panicked".to_string(),
            }),
        )
    })
}
