//! Web lookups through the DuckDuckGo Instant Answer API.
//!
//! This is not a ranked web search. It answers entity-style queries ("Cristiano Ronaldo")
//! with an abstract and related topics, and often returns nothing for open-ended phrases
//! ("Ronaldo clubs"). An empty answer is `Ok(vec![])`, which the evidence block renders as
//! "No results found."

use percent_encoding::percent_decode_str;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::types::{InstantAnswer, Topic};
use super::{SearchResult, SourceError};
use crate::text::normalize_whitespace;

const API_BASE: &str = "https://api.duckduckgo.com/";

/// DuckDuckGo Instant Answer API client. No API key required.
#[derive(Clone)]
pub struct DuckDuckGoClient {
    http: Client,
    base_url: String,
}

impl DuckDuckGoClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SourceError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )?;

        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        // Served as application/x-javascript, so parse the text ourselves.
        let body = response.text().await?;
        let answer: InstantAnswer =
            serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.to_string()))?;

        let results = collect_results(&answer, max_results);
        debug!(results = results.len(), "duckduckgo search complete");
        Ok(results)
    }
}

/// Abstract first, then direct results, then related topics (groups flattened).
fn collect_results(answer: &InstantAnswer, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() {
        results.push(SearchResult {
            title: answer.heading.clone(),
            url: non_empty(&answer.abstract_url),
            snippet: normalize_whitespace(&answer.abstract_text),
        });
    }

    let mut topics = Vec::new();
    flatten_topics(&answer.results, &mut topics);
    flatten_topics(&answer.related_topics, &mut topics);

    for topic in topics {
        if results.len() >= max_results {
            break;
        }
        let Some(text) = topic.text.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        let url = topic.first_url.as_deref().and_then(non_empty);
        let title = url
            .as_deref()
            .and_then(title_from_url)
            .unwrap_or_else(|| title_from_text(text));
        results.push(SearchResult {
            title,
            url,
            snippet: normalize_whitespace(text),
        });
    }

    results.truncate(max_results);
    results
}

fn flatten_topics<'a>(topics: &'a [Topic], out: &mut Vec<&'a Topic>) {
    for topic in topics {
        if topic.topics.is_empty() {
            out.push(topic);
        } else {
            flatten_topics(&topic.topics, out);
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `https://duckduckgo.com/Sporting_CP` → `Sporting CP`.
fn title_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let title = decoded.replace('_', " ");
    (!title.trim().is_empty()).then(|| title.trim().to_string())
}

fn title_from_text(text: &str) -> String {
    let head = text.split(" - ").next().unwrap_or(text);
    head.split_whitespace().take(8).collect::<Vec<_>>().join(" ")
}
