//! Evidence sources: DuckDuckGo web search, Wikipedia, and arXiv.
//!
//! Every lookup is fail-soft. Transport, parse, and timeout errors become
//! [`SourceOutcome::Failure`] at this boundary so callers never handle `Err`.

pub(crate) mod arxiv;
pub(crate) mod duckduckgo;
mod types;
pub(crate) mod wikipedia;

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::text::truncate_chars;

pub use arxiv::ArxivClient;
pub use duckduckgo::DuckDuckGoClient;
pub use wikipedia::WikipediaClient;

/// Number of web results requested from the backend per turn.
pub const WEB_FETCH_RESULTS: usize = 5;
pub const ENCYCLOPEDIA_MAX_CHARS: usize = 800;
pub const PREPRINT_MAX_CHARS: usize = 1200;
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome<T> {
    Success(T),
    /// Human-readable reason, embedded verbatim in evidence.
    Failure(String),
}

impl<T> SourceOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Success(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: Option<String>,
    pub snippet: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend returned status {0}")]
    Status(u16),

    #[error("backend rejected request: {0}")]
    Rejected(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// The three lookups a turn runs before composing evidence.
/// Implemented by [`Sources`] for production; mock implementations used in tests.
pub trait EvidenceSources {
    async fn search_web(&self, query: &str, max_results: usize)
    -> SourceOutcome<Vec<SearchResult>>;

    async fn search_encyclopedia(&self, query: &str, max_chars: usize) -> SourceOutcome<String>;

    async fn search_preprints(&self, query: &str, max_chars: usize) -> SourceOutcome<String>;
}

#[derive(Clone)]
pub struct Sources {
    web: DuckDuckGoClient,
    encyclopedia: WikipediaClient,
    preprints: ArxivClient,
    timeout: Duration,
}

impl Sources {
    pub fn new(http: Client, timeout: Duration) -> Self {
        Self {
            web: DuckDuckGoClient::new(http.clone()),
            encyclopedia: WikipediaClient::new(http.clone()),
            preprints: ArxivClient::new(http),
            timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            web: DuckDuckGoClient::with_base_url(http.clone(), &format!("{base_url}/ddg/")),
            encyclopedia: WikipediaClient::with_base_url(
                http.clone(),
                &format!("{base_url}/w/api.php"),
            ),
            preprints: ArxivClient::with_base_url(http, &format!("{base_url}/api/query")),
            timeout,
        }
    }
}

impl EvidenceSources for Sources {
    async fn search_web(
        &self,
        query: &str,
        max_results: usize,
    ) -> SourceOutcome<Vec<SearchResult>> {
        fail_soft("duckduckgo", self.timeout, self.web.search(query, max_results)).await
    }

    async fn search_encyclopedia(&self, query: &str, max_chars: usize) -> SourceOutcome<String> {
        let outcome = fail_soft(
            "wikipedia",
            self.timeout,
            self.encyclopedia.search(query, max_chars),
        )
        .await;
        bound_text(outcome, max_chars)
    }

    async fn search_preprints(&self, query: &str, max_chars: usize) -> SourceOutcome<String> {
        let outcome = fail_soft("arxiv", self.timeout, self.preprints.search(query, max_chars)).await;
        bound_text(outcome, max_chars)
    }
}

/// Runs `lookup` under `timeout`, converting every error into a `Failure`.
async fn fail_soft<T>(
    source: &str,
    timeout: Duration,
    lookup: impl Future<Output = Result<T, SourceError>>,
) -> SourceOutcome<T> {
    let result = tokio::time::timeout(timeout, lookup)
        .await
        .unwrap_or(Err(SourceError::Timeout(timeout)));

    match result {
        Ok(value) => {
            debug!(source, "source lookup complete");
            SourceOutcome::Success(value)
        }
        Err(e) => {
            warn!(source, error = %e, "source unavailable");
            SourceOutcome::Failure(e.to_string())
        }
    }
}

fn bound_text(outcome: SourceOutcome<String>, max_chars: usize) -> SourceOutcome<String> {
    match outcome {
        SourceOutcome::Success(text) => {
            SourceOutcome::Success(truncate_chars(&text, max_chars).to_string())
        }
        SourceOutcome::Failure(reason) => {
            SourceOutcome::Failure(truncate_chars(&reason, max_chars).to_string())
        }
    }
}
