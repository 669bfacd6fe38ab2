//! Engine version detection and compatibility checks.

use once_cell::sync::Lazy;

static ENGINE_VERSION: Lazy<String> = Lazy::new(|| parse_version_banner(tantivy::version_string()));

/// `major.minor.patch` of the linked search engine.
#[must_use]
pub fn engine_version() -> &'static str {
    ENGINE_VERSION.as_str()
}

// "tantivy v0.24.2, index_format v6, store_compression: none" -> "0.24.2"
fn parse_version_banner(banner: &str) -> String {
    banner
        .split_whitespace()
        .nth(1)
        .map(|token| token.trim_start_matches('v').trim_end_matches(','))
        .filter(|token| !token.is_empty())
        .unwrap_or(banner)
        .to_string()
}

/// Numeric `major.minor.micro` triple; anything after the third component is a
/// build qualifier and never takes part in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub micro: u64,
}

impl Version {
    /// Lenient parse: missing or non-numeric components count as zero.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut parts = text.trim().splitn(4, '.').map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().unwrap_or(0)
        });
        Self {
            major: parts.next().unwrap_or(0),
            minor: parts.next().unwrap_or(0),
            micro: parts.next().unwrap_or(0),
        }
    }
}

/// Whether an index written by engine `recorded` can be used by engine `current`.
///
/// An absent record is never compatible.
#[must_use]
pub fn versions_compatible(recorded: Option<&str>, current: &str) -> bool {
    let Some(recorded) = recorded else {
        return false;
    };
    if recorded == current {
        return true;
    }
    Version::parse(recorded) == Version::parse(current)
}
