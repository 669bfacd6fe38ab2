//! Normalisation of document hrefs into indexable identifiers and locators.

use std::fmt;

use crate::participant::ParticipantRegistry;

const INDEXABLE_SUFFIXES: [&str; 4] = [".htm", ".html", ".txt", ".xml"];
const FRAGMENT_MARKERS: [&str; 3] = [".htm#", ".html#", ".xml#"];

/// Maps a navigation href to the identifier of the document to index.
///
/// Known text formats are returned unchanged, fragments of known formats are
/// cut at the last `#`, and anything else is kept only if a registered
/// participant claims it.
#[must_use]
pub fn indexable_href(url: &str, participants: &ParticipantRegistry) -> Option<String> {
    let lowered = url.to_ascii_lowercase();
    if INDEXABLE_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix)) {
        return Some(url.to_string());
    }
    if FRAGMENT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return url.rfind('#').map(|cut| url[..cut].to_string());
    }
    participants.is_indexable(url).then(|| url.to_string())
}

/// Owning module of a `/plugin/path` identifier.
#[must_use]
pub fn plugin_id_of(href: &str) -> Option<&str> {
    let rest = href.strip_prefix('/')?;
    let end = rest.find('/')?;
    (end > 0).then(|| &rest[..end])
}

/// Everything a participant needs to fetch one document's content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentLocator {
    pub href: String,
    pub lang: String,
    pub id: Option<String>,
    pub participant_id: Option<String>,
}

impl DocumentLocator {
    #[must_use]
    pub fn new(href: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            lang: lang.into(),
            id: None,
            participant_id: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_participant(mut self, participant_id: impl Into<String>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }

    /// Parses the `href?lang=..&id=..&participantId=..` form.
    #[must_use]
    pub fn parse(url: &str) -> Self {
        let (href, query) = url.split_once('?').unwrap_or((url, ""));
        let mut locator = Self::new(href, "");
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "lang" => locator.lang = value.to_string(),
                "id" => locator.id = Some(value.to_string()),
                "participantId" => locator.participant_id = Some(value.to_string()),
                _ => {}
            }
        }
        locator
    }
}

impl fmt::Display for DocumentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?lang={}", self.href, self.lang)?;
        if let Some(id) = &self.id {
            write!(f, "&id={id}")?;
        }
        if let Some(participant_id) = &self.participant_id {
            write!(f, "&participantId={participant_id}")?;
        }
        Ok(())
    }
}

/// Builds the locator for `url` in `locale`, or `None` when it is not indexable.
///
/// With an explicit participant the href is taken as is; that participant
/// decides what it can read.
#[must_use]
pub fn indexable_locator(
    locale: &str,
    url: &str,
    id: Option<&str>,
    participant_id: Option<&str>,
    participants: &ParticipantRegistry,
) -> Option<DocumentLocator> {
    let href = match participant_id {
        Some(_) => url.to_string(),
        None => indexable_href(url, participants)?,
    };
    Some(DocumentLocator {
        href,
        lang: locale.to_string(),
        id: id.map(str::to_string),
        participant_id: participant_id.map(str::to_string),
    })
}
