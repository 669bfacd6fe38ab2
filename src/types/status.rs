//! Outcome of a single per-document operation.

use std::fmt;

use crate::error::IndexError;

/// Severity of a [`Status`]; only `Ok` means the document reached the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

/// Per-document result.
///
/// Document failures never abort a batch: the driver inspects the status, logs
/// it and moves on to the next document.
#[derive(Debug)]
pub struct Status {
    severity: Severity,
    message: String,
    source: Option<IndexError>,
}

impl Status {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            severity: Severity::Ok,
            message: String::new(),
            source: None,
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>, source: Option<IndexError>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            source,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn source(&self) -> Option<&IndexError> {
        self.source.as_ref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.severity, &self.source) {
            (Severity::Ok, _) => f.write_str("ok"),
            (severity, Some(source)) => write!(f, "{severity:?}: {} ({source})", self.message),
            (severity, None) => write!(f, "{severity:?}: {}", self.message),
        }
    }
}
