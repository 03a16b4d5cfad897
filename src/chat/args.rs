use std::fmt;

use clap::Parser;

use crate::llm::DEFAULT_MODEL;
use crate::sources::DEFAULT_SOURCE_TIMEOUT;

#[derive(Parser)]
#[command(
    name = "sleuth",
    version,
    about = "Search DuckDuckGo, Wikipedia, and arXiv, then get a short cited answer from a Groq model"
)]
pub struct Args {
    /// Ask a single question and exit instead of starting the chat
    pub question: Option<String>,

    /// Groq API key (can also be set later with `/key` inside the chat)
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for answer synthesis
    #[arg(long, env = "SLEUTH_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Per-source wait before a search counts as failed
    #[arg(
        long,
        default_value_t = DEFAULT_SOURCE_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..=120)
    )]
    pub timeout_secs: u64,

    /// Do not print the raw evidence panels before each answer
    #[arg(long)]
    pub hide_evidence: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("question", &self.question)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("hide_evidence", &self.hide_evidence)
            .field("verbose", &self.verbose)
            .finish()
    }
}
