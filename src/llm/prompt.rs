use tracing::warn;

use super::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::evidence::Section;

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Model parameters and the knobs that shape the system instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    pub model: String,
    pub temperature: f32,
    pub min_sentences: u8,
    pub max_sentences: u8,
    /// Inline tags the model may cite, rendered as `[tag]`.
    pub citation_tags: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            min_sentences: 4,
            max_sentences: 6,
            citation_tags: Section::ALL
                .iter()
                .map(|s| s.citation_tag().to_string())
                .collect(),
        }
    }
}

impl SynthesisConfig {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn system_instruction(&self) -> String {
        let tags = self
            .citation_tags
            .iter()
            .map(|t| format!("[{t}]"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "You are a precise research assistant. Use ONLY the provided evidence to answer.\n\
             If the evidence is insufficient, say you don't know. Keep it to {}–{} sentences.\n\
             Cite sources inline briefly (e.g., {tags}). Do not fabricate URLs.",
            self.min_sentences, self.max_sentences
        )
    }

    pub fn build_request<'a>(&'a self, question: &str, evidence: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::system(self.system_instruction()),
                ChatMessage::user(user_prompt(question, evidence)),
            ],
            temperature: self.temperature,
            stream: false,
        }
    }
}

pub fn user_prompt(question: &str, evidence: &str) -> String {
    format!("Question:\n{question}\n\nEvidence:\n{evidence}")
}

/// First choice's content, trimmed; `None` when absent or blank.
pub fn extract_answer(response: &ChatResponse) -> Option<String> {
    let answer = response
        .choices
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|choice| choice.message.as_ref())
        .and_then(|message| message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    if answer.is_none() {
        warn!("model returned empty answer");
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Choice;

    fn response_with(content: Option<&str>) -> ChatResponse {
        ChatResponse {
            choices: Some(vec![Choice {
                message: Some(ChatMessage {
                    role: "assistant".into(),
                    content: content.map(Into::into),
                }),
            }]),
            error: None,
        }
    }

    #[test]
    fn default_instruction_matches_contract() {
        let text = SynthesisConfig::default().system_instruction();
        assert!(text.contains("Use ONLY the provided evidence"));
        assert!(text.contains("say you don't know"));
        assert!(text.contains("4–6 sentences"));
        assert!(text.contains("[DDG], [Wikipedia], [arXiv]"));
    }

    #[test]
    fn instruction_follows_config() {
        let config = SynthesisConfig {
            min_sentences: 2,
            max_sentences: 3,
            citation_tags: vec!["Web".into()],
            ..SynthesisConfig::default()
        };
        let text = config.system_instruction();
        assert!(text.contains("2–3 sentences"));
        assert!(text.contains("(e.g., [Web])"));
    }

    #[test]
    fn request_is_non_streaming_with_two_messages() {
        let config = SynthesisConfig::default();
        let request = config.build_request("Ronaldo clubs", "== DuckDuckGo ==\n...");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["stream"], false);
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(
            json["messages"][1]["content"],
            "Question:\nRonaldo clubs\n\nEvidence:\n== DuckDuckGo ==\n..."
        );
    }

    #[test]
    fn with_model_overrides_only_model() {
        let config = SynthesisConfig::with_model("llama-3.3-70b-versatile");
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn extract_answer_trims() {
        let answer = extract_answer(&response_with(Some("  He played for Sporting [DDG].\n")));
        assert_eq!(answer.as_deref(), Some("He played for Sporting [DDG]."));
    }

    #[test]
    fn extract_answer_blank_or_missing_is_none() {
        assert!(extract_answer(&response_with(Some("   "))).is_none());
        assert!(extract_answer(&response_with(None)).is_none());
        assert!(
            extract_answer(&ChatResponse {
                choices: None,
                error: None
            })
            .is_none()
        );
    }
}
