use std::fmt;

use crate::sources::{SearchResult, SourceOutcome};
use crate::text::{sanitize_heading, truncate_chars};

/// Web results used for evidence and shown in the raw-evidence panel.
pub const WEB_RESULT_CAP: usize = 3;
pub const SNIPPET_MAX_CHARS: usize = 240;
pub const SECTION_MAX_CHARS: usize = 1500;

const EMPTY_SECTION: &str = "No results found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Web,
    Encyclopedia,
    Preprints,
}

impl Section {
    /// Fixed rendering order.
    pub const ALL: [Section; 3] = [Section::Web, Section::Encyclopedia, Section::Preprints];

    pub fn label(self) -> &'static str {
        match self {
            Section::Web => "DuckDuckGo",
            Section::Encyclopedia => "Wikipedia",
            Section::Preprints => "arXiv",
        }
    }

    /// Tag the model is asked to cite this section with, e.g. `[DDG]`.
    pub fn citation_tag(self) -> &'static str {
        match self {
            Section::Web => "DDG",
            Section::Encyclopedia => "Wikipedia",
            Section::Preprints => "arXiv",
        }
    }

    pub fn header(self) -> String {
        format!("== {} ==", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvidenceLimits {
    pub web_results: usize,
    pub snippet_chars: usize,
    pub section_chars: usize,
}

impl Default for EvidenceLimits {
    fn default() -> Self {
        Self {
            web_results: WEB_RESULT_CAP,
            snippet_chars: SNIPPET_MAX_CHARS,
            section_chars: SECTION_MAX_CHARS,
        }
    }
}

/// Three labeled sections (web, encyclopedia, preprints) separated by blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceBlock(String);

impl EvidenceBlock {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvidenceBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn compose(
    web: &SourceOutcome<Vec<SearchResult>>,
    encyclopedia: &SourceOutcome<String>,
    preprints: &SourceOutcome<String>,
) -> EvidenceBlock {
    compose_with(web, encyclopedia, preprints, &EvidenceLimits::default())
}

pub fn compose_with(
    web: &SourceOutcome<Vec<SearchResult>>,
    encyclopedia: &SourceOutcome<String>,
    preprints: &SourceOutcome<String>,
    limits: &EvidenceLimits,
) -> EvidenceBlock {
    let sections = Section::ALL.map(|section| {
        let body = match section {
            Section::Web => render_web(web, limits),
            Section::Encyclopedia => render_text(section, encyclopedia),
            Section::Preprints => render_text(section, preprints),
        };
        format!(
            "{}\n{}",
            section.header(),
            truncate_chars(&body, limits.section_chars)
        )
    });

    EvidenceBlock(sections.join("\n\n"))
}

/// The leading `cap` results; shared by evidence and the web panel.
pub fn top_results(results: &[SearchResult], cap: usize) -> &[SearchResult] {
    &results[..results.len().min(cap)]
}

fn render_web(web: &SourceOutcome<Vec<SearchResult>>, limits: &EvidenceLimits) -> String {
    match web {
        SourceOutcome::Success(results) if results.is_empty() => EMPTY_SECTION.to_string(),
        SourceOutcome::Success(results) => top_results(results, limits.web_results)
            .iter()
            .map(|r| render_entry(r, limits.snippet_chars))
            .collect::<Vec<_>>()
            .join("\n"),
        SourceOutcome::Failure(reason) => {
            let placeholder = SearchResult {
                title: format!("{} error", Section::Web.label()),
                url: None,
                snippet: reason.clone(),
            };
            render_entry(&placeholder, limits.snippet_chars)
        }
    }
}

fn render_entry(result: &SearchResult, snippet_chars: usize) -> String {
    let title = sanitize_heading(&result.title);
    let snippet = truncate_chars(&result.snippet, snippet_chars);
    format!(
        "- {title} — {}\n  {snippet}",
        result.url.as_deref().unwrap_or_default()
    )
}

fn render_text(section: Section, outcome: &SourceOutcome<String>) -> String {
    match outcome {
        SourceOutcome::Success(text) if text.trim().is_empty() => EMPTY_SECTION.to_string(),
        SourceOutcome::Success(text) => text.clone(),
        SourceOutcome::Failure(reason) => format!("{} error: {reason}", section.label()),
    }
}
