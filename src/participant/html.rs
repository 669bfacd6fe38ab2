use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DocumentRequest, SearchParticipant};
use crate::constants::SUMMARY_CHARS;
use crate::engine::DocumentRecord;
use crate::error::IndexError;
use crate::search_index::SearchIndex;
use crate::types::Status;

type Pattern = Lazy<std::result::Result<Regex, String>>;

static TITLE: Pattern = Lazy::new(|| compile(r"(?is)<title[^>]*>(.*?)</title>"));
static META: Pattern = Lazy::new(|| {
    compile(r#"(?is)<meta\s+name\s*=\s*["']([^"']+)["']\s+content\s*=\s*["']([^"']*)["']"#)
});
static SCRIPT: Pattern = Lazy::new(|| compile(r"(?is)<script\b.*?</script>"));
static STYLE: Pattern = Lazy::new(|| compile(r"(?is)<style\b.*?</style>"));
static HEAD: Pattern = Lazy::new(|| compile(r"(?is)<head\b.*?</head>"));
static TAG: Pattern = Lazy::new(|| compile(r"(?s)<[^>]*>"));
static SPACE: Pattern = Lazy::new(|| compile(r"\s+"));

fn compile(source: &str) -> std::result::Result<Regex, String> {
    Regex::new(source).map_err(|err| err.to_string())
}

fn pattern(cell: &'static Pattern) -> Option<&'static Regex> {
    match &**cell {
        Ok(regex) => Some(regex),
        Err(msg) => {
            tracing::error!(target = "helpindex::html", error = %msg, "html pattern init failed");
            None
        }
    }
}

/// Replaces every match of `cell` in `text`; leaves the text alone if the pattern is unusable.
fn replace(cell: &'static Pattern, text: &str, with: &str) -> String {
    match pattern(cell) {
        Some(regex) => regex.replace_all(text, with).into_owned(),
        None => text.to_string(),
    }
}

/// Default participant: reads `<content root>/<plugin>/<path>` and extracts
/// the title, visible text, description and filter metadata of an HTML page.
///
/// Plain text files pass through the same extraction unchanged.
#[derive(Debug, Clone)]
pub struct HtmlParticipant {
    content_root: PathBuf,
}

impl HtmlParticipant {
    #[must_use]
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    #[must_use]
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    fn resolve(&self, href: &str) -> PathBuf {
        let relative = href.split(['?', '#']).next().unwrap_or(href);
        self.content_root.join(relative.trim_start_matches('/'))
    }
}

impl SearchParticipant for HtmlParticipant {
    fn name(&self) -> &str {
        "html"
    }

    fn handles(&self, _plugin_id: &str, name: &str) -> bool {
        let lowered = name.to_ascii_lowercase();
        lowered.ends_with(".htm") || lowered.ends_with(".html")
    }

    fn add_document(
        &self,
        _index: &SearchIndex,
        request: &DocumentRequest<'_>,
        record: &mut DocumentRecord,
    ) -> Status {
        let path = self.resolve(&request.locator.href);
        let html = match fs_err::read_to_string(&path) {
            Ok(html) => html,
            Err(err) => {
                return Status::error(
                    format!("unable to read document {}", request.name),
                    Some(IndexError::Io(err)),
                );
            }
        };
        let page = HtmlPage::parse(&html);
        if let Some(title) = &page.title {
            record.add_title(title);
        }
        record.add_contents(&page.text);
        record.add_summary(&page.summary());
        if let Some(filters) = page.filters() {
            record.set_filters(&filters);
        }
        Status::ok()
    }
}

#[derive(Debug, Default)]
struct HtmlPage {
    title: Option<String>,
    description: Option<String>,
    filters: Vec<String>,
    text: String,
}

impl HtmlPage {
    fn parse(html: &str) -> Self {
        let title = pattern(&TITLE)
            .and_then(|regex| regex.captures(html))
            .and_then(|caps| caps.get(1))
            .map(|m| clean_text(m.as_str()))
            .filter(|title| !title.is_empty());

        let mut description = None;
        let mut filters = Vec::new();
        let metas = pattern(&META).into_iter().flat_map(|regex| regex.captures_iter(html));
        for caps in metas {
            let (Some(name), Some(content)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            match name.as_str().to_ascii_lowercase().as_str() {
                "description" => description = Some(clean_text(content.as_str())),
                "filter" => filters.push(decode_entities(content.as_str())),
                _ => {}
            }
        }

        let body = replace(&SCRIPT, html, " ");
        let body = replace(&STYLE, &body, " ");
        let body = replace(&HEAD, &body, " ");
        Self {
            title,
            description,
            filters,
            text: clean_text(&body),
        }
    }

    fn summary(&self) -> String {
        match &self.description {
            Some(description) if !description.is_empty() => description.clone(),
            _ => self.text.chars().take(SUMMARY_CHARS).collect(),
        }
    }

    fn filters(&self) -> Option<String> {
        (!self.filters.is_empty()).then(|| self.filters.join(","))
    }
}

fn clean_text(fragment: &str) -> String {
    let stripped = replace(&TAG, fragment, " ");
    let decoded = decode_entities(&stripped);
    replace(&SPACE, decoded.trim(), " ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
