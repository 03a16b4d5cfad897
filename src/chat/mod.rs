mod args;
mod render;

pub use args::Args;

use std::io::{self, Write};
use std::time::Duration;

use reqwest::Client;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::llm::{Credential, GroqClient, SynthesisConfig, Synthesizer};
use crate::session::{self, Session, SessionError};
use crate::sources::{EvidenceSources, Sources};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout; per-source waits are enforced separately.
const HTTP_TIMEOUT: Duration = Duration::from_secs(90);
const MAX_REDIRECTS: usize = 5;
const PROMPT: &str = "> ";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Ask(&'a str),
    Key(&'a str),
    History,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line);
    };
    let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match name {
        "key" => Command::Key(arg.trim()),
        "history" => Command::History,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Chat front end: owns the session and the credential for one process.
pub struct Assistant<S, L> {
    sources: S,
    synthesizer: L,
    credential: Option<Credential>,
    session: Session,
    show_evidence: bool,
}

impl Assistant<Sources, GroqClient> {
    pub fn from_args(args: &Args) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(HTTP_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        let sources = Sources::new(http.clone(), Duration::from_secs(args.timeout_secs));
        let synthesizer = GroqClient::new(http, SynthesisConfig::with_model(args.model.as_str()));

        let credential = args.api_key.as_deref().and_then(|raw| {
            Credential::new(raw)
                .inspect_err(|e| warn!("ignoring configured API key: {e}"))
                .ok()
        });

        Ok(Self::new(sources, synthesizer, credential, !args.hide_evidence))
    }
}

impl<S: EvidenceSources, L: Synthesizer> Assistant<S, L> {
    pub fn new(
        sources: S,
        synthesizer: L,
        credential: Option<Credential>,
        show_evidence: bool,
    ) -> Self {
        Self {
            sources,
            synthesizer,
            credential,
            session: Session::new(),
            show_evidence,
        }
    }

    /// Interactive loop: renders the seeded transcript, then one turn per line until EOF or `/quit`.
    pub async fn run(
        &mut self,
        input: impl AsyncBufRead + Unpin,
        out: &mut impl Write,
    ) -> io::Result<()> {
        write!(out, "{}", render::render_transcript(self.session.transcript()))?;
        writeln!(out, "(type /help for commands)")?;

        let mut lines = input.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };
            if self.handle_line(&line, out).await? == Flow::Quit {
                break;
            }
        }

        info!(messages = self.session.transcript().len(), "chat ended");
        Ok(())
    }

    /// One-shot mode: a single turn, no greeting.
    pub async fn ask(&mut self, question: &str, out: &mut impl Write) -> io::Result<()> {
        self.turn(question, out).await
    }

    async fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        match parse_command(line) {
            Command::Empty => {}
            Command::Ask(question) => self.turn(question, out).await?,
            Command::Key(raw) => {
                let result = Credential::new(raw).map(|credential| {
                    self.credential = Some(credential);
                });
                writeln!(out, "{}", render::key_status(&result))?;
            }
            Command::History => {
                write!(out, "{}", render::render_transcript(self.session.transcript()))?
            }
            Command::Help => writeln!(out, "{}", render::HELP)?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(name) => {
                writeln!(out, "Unknown command /{name}. Type /help for commands.")?
            }
        }
        Ok(Flow::Continue)
    }

    async fn turn(&mut self, question: &str, out: &mut impl Write) -> io::Result<()> {
        let show_evidence = self.show_evidence;
        let mut panel_error = None;

        let result = session::run_turn(
            &mut self.session,
            question,
            self.credential.as_ref(),
            &self.sources,
            &self.synthesizer,
            |evidence| {
                if show_evidence {
                    panel_error = write!(out, "{}", render::render_panels(evidence))
                        .and_then(|()| out.flush())
                        .err();
                }
            },
        )
        .await;

        if let Some(e) = panel_error {
            return Err(e);
        }

        match result {
            Ok(answer) => writeln!(out, "assistant> {answer}"),
            Err(SessionError::EmptyInput) => Ok(()),
            Err(e) => writeln!(out, "{e}"),
        }
    }

    #[cfg(test)]
    fn session(&self) -> &Session {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::session::tests::{MockSources, MockSynthesizer};
    use crate::session::{GREETING, MISSING_KEY_MESSAGE};

    fn assistant(
        credential: Option<Credential>,
    ) -> Assistant<MockSources, MockSynthesizer> {
        Assistant::new(
            MockSources::succeeding(),
            MockSynthesizer::answering(),
            credential,
            true,
        )
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn parse_command_variants() {
        assert_eq!(parse_command("  "), Command::Empty);
        assert_eq!(parse_command(" Ronaldo clubs "), Command::Ask("Ronaldo clubs"));
        assert_eq!(parse_command("/key  gsk_abc "), Command::Key("gsk_abc"));
        assert_eq!(parse_command("/key"), Command::Key(""));
        assert_eq!(parse_command("/history"), Command::History);
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/nope x"), Command::Unknown("nope"));
    }

    #[tokio::test]
    async fn run_without_key_prompts_for_it() {
        let mut a = assistant(None);
        let mut out = Vec::new();

        a.run(&b"Ronaldo clubs\n"[..], &mut out).await.unwrap();

        let text = output(out);
        assert!(text.starts_with(&format!("assistant> {GREETING}\n")));
        assert!(text.contains(&format!("assistant> {MISSING_KEY_MESSAGE}\n")));
        assert!(!text.contains("▸ DuckDuckGo"));
        assert_eq!(a.session().transcript().len(), 3);
        assert_eq!(a.synthesizer.call_count(), 0);
    }

    #[tokio::test]
    async fn key_command_enables_synthesis() {
        let mut a = assistant(None);
        let mut out = Vec::new();

        a.run(&b"/key gsk_test\nRonaldo clubs\n/quit\nnever asked\n"[..], &mut out)
            .await
            .unwrap();

        let text = output(out);
        assert!(text.contains("API key set for this session."));
        assert!(text.contains("▸ DuckDuckGo (top results)"));
        assert!(text.contains("assistant> Answer about Ronaldo clubs [DDG]."));
        assert_eq!(a.synthesizer.call_count(), 1);
        assert_eq!(a.session().transcript().len(), 3);
    }

    #[tokio::test]
    async fn panels_are_printed_before_answer() {
        let mut a = assistant(Some(Credential::new("gsk_test").unwrap()));
        let mut out = Vec::new();

        a.ask("Ronaldo clubs", &mut out).await.unwrap();

        let text = output(out);
        let panels = text.find("▸ arXiv").unwrap();
        let answer = text.find("assistant> Answer about").unwrap();
        assert!(panels < answer);
    }

    #[tokio::test]
    async fn hidden_evidence_prints_only_answer() {
        let mut a = Assistant::new(
            MockSources::succeeding(),
            MockSynthesizer::answering(),
            Some(Credential::new("gsk_test").unwrap()),
            false,
        );
        let mut out = Vec::new();

        a.ask("Ronaldo clubs", &mut out).await.unwrap();

        assert_eq!(
            output(out),
            "assistant> Answer about Ronaldo clubs [DDG].\n"
        );
    }

    #[tokio::test]
    async fn malformed_key_is_not_stored() {
        let mut a = assistant(None);
        let mut out = Vec::new();

        a.run(&b"/key has space\nq\n"[..], &mut out).await.unwrap();

        let text = output(out);
        assert!(text.contains("malformed"));
        assert!(text.contains(MISSING_KEY_MESSAGE));
    }

    #[tokio::test]
    async fn history_and_blank_lines() {
        let mut a = assistant(Some(Credential::new("gsk_test").unwrap()));
        let mut out = Vec::new();

        a.run(&b"\n   \nfirst\n/history\n"[..], &mut out).await.unwrap();

        let text = output(out);
        assert_eq!(a.session().transcript().len(), 3);
        assert_eq!(text.matches("user> first\n").count(), 1);
        assert_eq!(text.matches(&format!("assistant> {GREETING}\n")).count(), 2);
    }

    #[tokio::test]
    async fn empty_configured_key_asks_for_one() {
        for raw in ["", "   "] {
            let args = Args::try_parse_from(["sleuth", "--api-key", raw]).unwrap();
            let mut a = Assistant::from_args(&args).unwrap();
            assert!(a.credential.is_none());

            let mut out = Vec::new();
            a.ask("Ronaldo clubs", &mut out).await.unwrap();

            assert_eq!(output(out), format!("assistant> {MISSING_KEY_MESSAGE}\n"));
            assert_eq!(a.session().transcript().len(), 3);
        }
    }

    #[tokio::test]
    async fn empty_key_command_keeps_existing_key() {
        let mut a = assistant(None);
        let mut out = Vec::new();

        a.run(&b"/key gsk_test\n/key \nRonaldo clubs\n"[..], &mut out)
            .await
            .unwrap();

        let text = output(out);
        assert!(text.contains("The key was not changed."));
        assert!(text.contains("assistant> Answer about Ronaldo clubs [DDG]."));
        assert!(!text.contains(MISSING_KEY_MESSAGE));
        assert_eq!(a.synthesizer.call_count(), 1);
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let mut a = assistant(None);
        let mut out = Vec::new();

        a.run(&b"/bogus\n"[..], &mut out).await.unwrap();

        assert!(output(out).contains("Unknown command /bogus."));
        assert_eq!(a.session().transcript().len(), 1);
    }
}
