use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::credential::{AuthError, Credential};
use super::prompt::{SynthesisConfig, extract_answer};
use super::types::{ApiError, ChatResponse};
use crate::text::truncate_chars;

const API_BASE: &str = "https://api.groq.com/openai/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("API key rejected: {0}")]
    Unauthorized(String),

    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("model returned an empty answer")]
    EmptyAnswer,

    #[error("malformed response from the model API: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Turns a question plus composed evidence into a short cited answer.
/// Implemented by `GroqClient` for production; mock implementations used in tests.
pub trait Synthesizer {
    async fn synthesize(
        &self,
        credential: Option<&Credential>,
        question: &str,
        evidence: &str,
    ) -> Result<String, SynthesisError>;
}

/// Groq's OpenAI-compatible chat completions endpoint. One request per call, no retries.
#[derive(Clone)]
pub struct GroqClient {
    http: Client,
    config: SynthesisConfig,
    base_url: String,
}

impl GroqClient {
    pub fn new(http: Client, config: SynthesisConfig) -> Self {
        Self {
            http,
            config,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            config: SynthesisConfig::default(),
            base_url: base_url.to_string(),
        }
    }

    async fn complete(
        &self,
        credential: &Credential,
        question: &str,
        evidence: &str,
    ) -> Result<ChatResponse, SynthesisError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.config.build_request(question, evidence);

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Groq API rate limited");
            return Err(SynthesisError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ChatResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(status, err);
                warn!(error = %classified, "Groq API error");
                return Err(classified);
            }
            warn!(status = %status, "Groq API error (no structured body)");
            if status == StatusCode::UNAUTHORIZED {
                return Err(SynthesisError::Unauthorized(format!("HTTP {status}")));
            }
            return Err(SynthesisError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", truncate_chars(&text, 200)),
            });
        }

        let text = response.text().await?;
        let body: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, "Groq API returned an unparseable body");
            SynthesisError::Malformed(format!("{e}: {}", truncate_chars(&text, 200)))
        })?;
        debug!(model = %self.config.model, "synthesis complete");

        if let Some(err) = &body.error {
            let classified = classify_api_error(status, err);
            warn!(error = %classified, "Groq API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

impl Synthesizer for GroqClient {
    async fn synthesize(
        &self,
        credential: Option<&Credential>,
        question: &str,
        evidence: &str,
    ) -> Result<String, SynthesisError> {
        let credential = credential.ok_or(AuthError::Missing)?;
        let response = self.complete(credential, question, evidence).await?;
        extract_answer(&response).ok_or(SynthesisError::EmptyAnswer)
    }
}

fn classify_api_error(status: StatusCode, err: &ApiError) -> SynthesisError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    let invalid_key = err
        .code
        .as_ref()
        .and_then(|c| c.as_str())
        .is_some_and(|c| c == "invalid_api_key");

    match status.as_u16() {
        401 => SynthesisError::Unauthorized(message),
        _ if invalid_key => SynthesisError::Unauthorized(message),
        429 => SynthesisError::RateLimited,
        code => SynthesisError::Api { code, message },
    }
}
