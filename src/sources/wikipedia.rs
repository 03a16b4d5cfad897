use reqwest::Client;
use tracing::debug;
use url::Url;

use super::SourceError;
use super::types::{WikiPage, WikiResponse};
use crate::text::truncate_chars;

const API_BASE: &str = "https://en.wikipedia.org/w/api.php";

pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    base_url: String,
}

impl WikipediaClient {
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

    /// Returns the intro of the top-ranked article as
    /// `Page: {title}\nSummary: {extract}`, truncated to `max_chars`.
    pub async fn search(&self, query: &str, max_chars: usize) -> Result<String, SourceError> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", "1"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
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

        let body: WikiResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        if let Some(err) = body.error {
            let code = err.code.unwrap_or_else(|| "unknown".to_string());
            let info = err.info.unwrap_or_default();
            return Err(SourceError::Rejected(format!("{code}: {info}")));
        }

        let pages = body.query.map(|q| q.pages).unwrap_or_default();
        let Some(page) = top_page(&pages) else {
            debug!("wikipedia returned no pages");
            return Ok(NO_RESULT.to_string());
        };

        debug!(title = %page.title, "wikipedia search complete");
        Ok(truncate_chars(&format_page(page), max_chars).to_string())
    }
}

fn top_page(pages: &[WikiPage]) -> Option<&WikiPage> {
    pages.iter().min_by_key(|p| p.index.unwrap_or(u32::MAX))
}

fn format_page(page: &WikiPage) -> String {
    let extract = page.extract.as_deref().unwrap_or_default().trim();
    format!("Page: {}\nSummary: {extract}", page.title)
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> WikipediaClient {
        WikipediaClient::with_base_url(Client::new(), &format!("{}/w/api.php", server.uri()))
    }

    #[tokio::test]
    async fn search_returns_formatted_top_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("gsrsearch", "Ronaldo clubs"))
            .and(query_param("gsrlimit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": true,
                "query": {"pages": [{
                    "pageid": 1,
                    "title": "Cristiano Ronaldo",
                    "index": 1,
                    "extract": "Cristiano Ronaldo is a Portuguese footballer."
                }]}
            })))
            .mount(&server)
            .await;

        let text = client(&server).search("Ronaldo clubs", 800).await.unwrap();
        assert_eq!(
            text,
            "Page: Cristiano Ronaldo\nSummary: Cristiano Ronaldo is a Portuguese footballer."
        );
    }

    #[tokio::test]
    async fn search_truncates_to_max_chars() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": {"pages": [{"title": "Long", "index": 1, "extract": "a".repeat(2000)}]}
            })))
            .mount(&server)
            .await;

        let text = client(&server).search("long", 50).await.unwrap();
        assert_eq!(text.chars().count(), 50);
        assert!(text.starts_with("Page: Long"));
    }

    #[tokio::test]
    async fn search_without_hits_returns_no_result_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": true
            })))
            .mount(&server)
            .await;

        let text = client(&server).search("zzzzqqq", 800).await.unwrap();
        assert_eq!(text, NO_RESULT);
    }

    #[tokio::test]
    async fn search_api_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": {"code": "missingparam", "info": "The gsrsearch parameter must be set."}
            })))
            .mount(&server)
            .await;

        let err = client(&server).search("", 800).await.unwrap_err();
        match err {
            SourceError::Rejected(msg) => assert!(msg.contains("missingparam"), "got: {msg}"),
            other => panic!("expected Rejected, got: {other:?}"),
        }
    }
}
