use serde::Deserialize;

/// DuckDuckGo Instant Answer API response (`format=json`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstantAnswer {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    pub abstract_url: String,
    #[serde(default)]
    pub results: Vec<Topic>,
    #[serde(default)]
    pub related_topics: Vec<Topic>,
}

/// A related topic, or a named group of topics when `topics` is non-empty.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Topic {
    pub text: Option<String>,
    #[serde(rename = "FirstURL")]
    pub first_url: Option<String>,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

/// MediaWiki action API response for `generator=search&prop=extracts`
/// with `formatversion=2`.
#[derive(Debug, Deserialize)]
pub struct WikiResponse {
    pub query: Option<WikiQuery>,
    pub error: Option<WikiError>,
}

#[derive(Debug, Deserialize)]
pub struct WikiQuery {
    #[serde(default)]
    pub pages: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
pub struct WikiPage {
    pub title: String,
    pub extract: Option<String>,
    /// Search rank assigned by the generator (1 = best).
    pub index: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WikiError {
    pub code: Option<String>,
    pub info: Option<String>,
}

/// The fields of an arXiv Atom `<entry>` that end up in evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivEntry {
    pub title: String,
    pub authors: Vec<String>,
    pub summary: String,
    pub published: String,
}
