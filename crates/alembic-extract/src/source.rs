//! Source classification
//!
//! Every dropped file is classified exactly once into a closed set of kinds;
//! the extractor then matches on the kind instead of re-inspecting the bytes.

use crate::error::{ExtractError, ExtractResult};
use crate::transcript::{self, Conversation};
use serde_json::Value;
use url::Url;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// What a dropped file turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Conversation export with a `mapping` tree per conversation
    Transcript(Vec<Conversation>),
    /// Any other JSON document
    Json(Value),
    /// A single bare URL to scrape
    Url(Url),
    /// Anything else
    PlainText(String),
}

impl SourceKind {
    /// Classify file contents.
    ///
    /// `.json` files must parse; everything else must be UTF-8.
    pub fn classify(extension: Option<&str>, bytes: &[u8]) -> ExtractResult<Self> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        if extension.is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            let value: Value = serde_json::from_slice(bytes)?;
            return Ok(if transcript::is_export(&value) {
                SourceKind::Transcript(transcript::parse_export(&value))
            } else {
                SourceKind::Json(value)
            });
        }

        let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::NotUtf8)?;
        Ok(match bare_url(text) {
            Some(url) => SourceKind::Url(url),
            None => SourceKind::PlainText(text.to_string()),
        })
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Transcript(_) => "transcript",
            SourceKind::Json(_) => "json",
            SourceKind::Url(_) => "url",
            SourceKind::PlainText(_) => "text",
        }
    }
}

/// The URL if `text` is nothing but one `http(s)` URL, ignoring surrounding
/// whitespace.
pub fn bare_url(text: &str) -> Option<Url> {
    let candidate = text.trim();
    if candidate.is_empty() || candidate.contains(char::is_whitespace) {
        return None;
    }
    if !(candidate.starts_with("https://") || candidate.starts_with("http://")) {
        return None;
    }

    Url::parse(candidate)
        .ok()
        .filter(|url| url.host_str().is_some())
}
