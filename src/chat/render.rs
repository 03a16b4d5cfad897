use crate::evidence::{Section, WEB_RESULT_CAP, top_results};
use crate::llm::AuthError;
use crate::session::{Evidence, Message};
use crate::sources::SourceOutcome;
use crate::text::sanitize_heading;

pub(super) const HELP: &str = "\
Type a question to search and get a cited answer.
Commands:
  /key <value>  set the Groq API key for this session
  /history      show the conversation so far
  /help         show this help
  /quit         exit";

pub(super) fn render_message(message: &Message) -> String {
    format!("{}> {}\n", message.role, message.content)
}

pub(super) fn render_transcript(messages: &[Message]) -> String {
    messages.iter().map(render_message).collect()
}

/// Compact raw-evidence panels printed before the answer.
pub(super) fn render_panels(evidence: &Evidence) -> String {
    let mut output = String::new();

    output.push_str(&panel_header(Section::Web, " (top results)"));
    match &evidence.web {
        SourceOutcome::Success(results) if results.is_empty() => {
            output.push_str("  (no results)\n");
        }
        SourceOutcome::Success(results) => {
            for r in top_results(results, WEB_RESULT_CAP) {
                output.push_str(&format!(
                    "  - {} — {}\n    {}\n",
                    sanitize_heading(&r.title),
                    r.url.as_deref().unwrap_or("(no link)"),
                    r.snippet
                ));
            }
        }
        SourceOutcome::Failure(reason) => {
            output.push_str(&format!("  {} error: {reason}\n", Section::Web.label()));
        }
    }

    for (section, outcome) in [
        (Section::Encyclopedia, &evidence.encyclopedia),
        (Section::Preprints, &evidence.preprints),
    ] {
        output.push_str(&panel_header(section, ""));
        let text = match outcome {
            SourceOutcome::Success(text) => text.clone(),
            SourceOutcome::Failure(reason) => format!("{} error: {reason}", section.label()),
        };
        output.push_str(&indent(&text));
    }

    output
}

pub(super) fn key_status(result: &Result<(), AuthError>) -> String {
    match result {
        Ok(()) => "API key set for this session.".to_string(),
        Err(e) => format!("{e}. The key was not changed."),
    }
}

fn panel_header(section: Section, suffix: &str) -> String {
    format!("▸ {}{suffix}\n", section.label())
}

fn indent(text: &str) -> String {
    let mut out: String = text.lines().map(|l| format!("  {l}\n")).collect();
    if out.is_empty() {
        out.push_str("  (empty)\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::compose;
    use crate::session::Role;
    use crate::sources::SearchResult;

    fn evidence(
        web: SourceOutcome<Vec<SearchResult>>,
        encyclopedia: SourceOutcome<String>,
        preprints: SourceOutcome<String>,
    ) -> Evidence {
        let block = compose(&web, &encyclopedia, &preprints);
        Evidence {
            web,
            encyclopedia,
            preprints,
            block,
        }
    }

    fn result(n: usize) -> SearchResult {
        SearchResult {
            title: format!("R{n}"),
            url: Some(format!("https://r{n}.example")),
            snippet: format!("s{n}"),
        }
    }

    #[test]
    fn panels_show_three_sources_in_order() {
        let text = render_panels(&evidence(
            SourceOutcome::Success(vec![result(1)]),
            SourceOutcome::Success("Page: X\nSummary: Y".into()),
            SourceOutcome::Failure("timed out after 10s".into()),
        ));

        let web = text.find("▸ DuckDuckGo (top results)").unwrap();
        let wiki = text.find("▸ Wikipedia").unwrap();
        let arxiv = text.find("▸ arXiv").unwrap();
        assert!(web < wiki && wiki < arxiv);
        assert!(text.contains("  - R1 — https://r1.example\n    s1\n"));
        assert!(text.contains("  Page: X\n  Summary: Y\n"));
        assert!(text.contains("  arXiv error: timed out after 10s\n"));
    }

    #[test]
    fn web_panel_uses_shared_cap() {
        let text = render_panels(&evidence(
            SourceOutcome::Success((1..=5).map(result).collect()),
            SourceOutcome::Success("w".into()),
            SourceOutcome::Success("a".into()),
        ));
        assert_eq!(text.matches("  - R").count(), WEB_RESULT_CAP);
    }

    #[test]
    fn web_failure_panel() {
        let text = render_panels(&evidence(
            SourceOutcome::Failure("network error".into()),
            SourceOutcome::Success(String::new()),
            SourceOutcome::Success("a".into()),
        ));
        assert!(text.contains("  DuckDuckGo error: network error\n"));
        assert!(text.contains("▸ Wikipedia\n  (empty)\n"));
    }

    #[test]
    fn transcript_prefixes_roles() {
        let messages = [
            Message {
                role: Role::Assistant,
                content: "Hi".into(),
            },
            Message {
                role: Role::User,
                content: "Ronaldo clubs".into(),
            },
        ];
        assert_eq!(
            render_transcript(&messages),
            "assistant> Hi\nuser> Ronaldo clubs\n"
        );
    }

    #[test]
    fn key_status_messages() {
        assert!(key_status(&Ok(())).contains("set"));
        assert!(key_status(&Err(AuthError::Malformed)).contains("not changed"));
    }
}
