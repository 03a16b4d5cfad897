use reqwest::Client;
use tracing::debug;
use url::Url;

use super::SourceError;
use super::types::ArxivEntry;
use crate::text::{normalize_whitespace, truncate_chars};

const API_BASE: &str = "https://export.arxiv.org/api/query";

pub const NO_RESULT: &str = "No good Arxiv Result was found";

#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base_url: String,
}

impl ArxivClient {
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

    /// Returns the most relevant paper as labeled lines, truncated to `max_chars`.
    pub async fn search(&self, query: &str, max_chars: usize) -> Result<String, SourceError> {
        let search_query = format!("all:{query}");
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", "1"),
                ("sortBy", "relevance"),
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

        let xml = response.text().await?;
        if !xml.contains("<feed") {
            return Err(SourceError::Malformed("expected an Atom feed".into()));
        }

        let Some(entry) = first_entry(&xml).and_then(parse_entry) else {
            debug!("arxiv returned no entries");
            return Ok(NO_RESULT.to_string());
        };

        debug!(title = %entry.title, "arxiv search complete");
        Ok(truncate_chars(&format_entry(&entry), max_chars).to_string())
    }
}

fn format_entry(entry: &ArxivEntry) -> String {
    format!(
        "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
        entry.published,
        entry.title,
        entry.authors.join(", "),
        entry.summary
    )
}

fn first_entry(xml: &str) -> Option<&str> {
    let start = xml.find("<entry>")?;
    let end = xml[start..].find("</entry>")? + start + "</entry>".len();
    Some(&xml[start..end])
}

fn parse_entry(entry: &str) -> Option<ArxivEntry> {
    let title = normalize_whitespace(&unescape(&tag_text(entry, "title")?));
    let summary = normalize_whitespace(&unescape(&tag_text(entry, "summary").unwrap_or_default()));
    let published: String = tag_text(entry, "published")
        .map(|p| p.chars().take(10).collect())
        .unwrap_or_default();

    let mut authors = Vec::new();
    let mut rest = entry;
    while let Some(start) = rest.find("<author>") {
        let Some(len) = rest[start..].find("</author>") else {
            break;
        };
        let block = &rest[start..start + len];
        if let Some(name) = tag_text(block, "name") {
            authors.push(normalize_whitespace(&unescape(&name)));
        }
        rest = &rest[start + len..];
    }

    Some(ArxivEntry {
        title,
        authors,
        summary,
        published,
    })
}

/// Text content of the first `<tag ...>text</tag>`.
fn tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut search_from = 0;
    let start = loop {
        let pos = xml[search_from..].find(&open)? + search_from;
        // Skip longer tag names sharing the prefix, e.g. <published> vs <publisher>.
        match xml[pos + open.len()..].chars().next() {
            Some('>' | ' ' | '\n' | '\t' | '\r') => break pos,
            _ => search_from = pos + open.len(),
        }
    };
    let content_start = xml[start..].find('>')? + start + 1;
    let content_end = xml[content_start..].find(&close)? + content_start;

    Some(xml[content_start..content_end].trim().to_string())
}

/// Decodes the predefined XML entities and numeric character references in one pass.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
