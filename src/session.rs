use std::fmt;

use tracing::{info, warn};

use crate::evidence::{EvidenceBlock, compose};
use crate::llm::{Credential, Synthesizer};
use crate::sources::{
    ENCYCLOPEDIA_MAX_CHARS, EvidenceSources, PREPRINT_MAX_CHARS, SearchResult, SourceOutcome,
    WEB_FETCH_RESULTS,
};

pub const GREETING: &str =
    "Hi! Ask me about people, topics, or papers. I'll search and summarize.";

pub const MISSING_KEY_MESSAGE: &str =
    "Please enter your Groq API key: set GROQ_API_KEY or type /key <your-key>.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Processing,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a turn is already in progress")]
    Busy,

    #[error("input must not be empty")]
    EmptyInput,
}

/// Append-only transcript seeded with a greeting. Lives for one process.
#[derive(Debug)]
pub struct Session {
    transcript: Vec<Message>,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            transcript: vec![Message {
                role: Role::Assistant,
                content: GREETING.to_string(),
            }],
            state: SessionState::Idle,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn begin(&mut self, input: &str) -> Result<(), SessionError> {
        if self.state == SessionState::Processing {
            return Err(SessionError::Busy);
        }
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        self.transcript.push(Message {
            role: Role::User,
            content: input.to_string(),
        });
        self.state = SessionState::Processing;
        Ok(())
    }

    fn finish(&mut self, answer: &str) {
        debug_assert_eq!(self.state, SessionState::Processing);
        self.transcript.push(Message {
            role: Role::Assistant,
            content: answer.to_string(),
        });
        self.state = SessionState::Idle;
    }
}

/// Raw source outcomes plus the evidence block composed from them.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub web: SourceOutcome<Vec<SearchResult>>,
    pub encyclopedia: SourceOutcome<String>,
    pub preprints: SourceOutcome<String>,
    pub block: EvidenceBlock,
}

/// Runs all three lookups concurrently; resolves once every one has succeeded or failed.
pub async fn gather(sources: &impl EvidenceSources, query: &str) -> Evidence {
    let (web, encyclopedia, preprints) = tokio::join!(
        sources.search_web(query, WEB_FETCH_RESULTS),
        sources.search_encyclopedia(query, ENCYCLOPEDIA_MAX_CHARS),
        sources.search_preprints(query, PREPRINT_MAX_CHARS),
    );

    info!(
        web = web.is_success(),
        encyclopedia = encyclopedia.is_success(),
        preprints = preprints.is_success(),
        "evidence gathered"
    );

    let block = compose(&web, &encyclopedia, &preprints);
    Evidence {
        web,
        encyclopedia,
        preprints,
        block,
    }
}

/// Processes one user message, appends exactly one assistant message and returns it.
///
/// `on_evidence` is called after the searches resolve and before synthesis starts.
/// It is never called when the turn stops early for a missing credential.
/// Only an empty input or a turn already in flight is rejected; every other
/// failure becomes the assistant message.
pub async fn run_turn(
    session: &mut Session,
    input: &str,
    credential: Option<&Credential>,
    sources: &impl EvidenceSources,
    synthesizer: &impl Synthesizer,
    on_evidence: impl FnOnce(&Evidence),
) -> Result<String, SessionError> {
    session.begin(input)?;

    let Some(credential) = credential else {
        info!("no API key set, skipping search and synthesis");
        session.finish(MISSING_KEY_MESSAGE);
        return Ok(MISSING_KEY_MESSAGE.to_string());
    };

    info!(query = %input, "turn started");
    let evidence = gather(sources, input).await;
    on_evidence(&evidence);

    let answer = match synthesizer
        .synthesize(Some(credential), input, evidence.block.as_str())
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "synthesis failed");
            format!("Sorry, something went wrong with the LLM: {e}")
        }
    };

    session.finish(&answer);
    info!(transcript = session.transcript().len(), "turn complete");
    Ok(answer)
}
