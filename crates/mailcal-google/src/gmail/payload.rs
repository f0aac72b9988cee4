//! Flattening of Gmail `format=full` payloads into sender, subject and text.

use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Deserialize;

/// Gmail emits URL-safe base64, usually without padding but not always.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const UNKNOWN_SENDER: &str = "Unknown sender";

/// One MIME part of a Gmail message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// MIME type, e.g. `text/plain` or `multipart/alternative`.
    #[serde(default)]
    pub mime_type: String,
    /// Part headers (only the top-level part carries From/Subject).
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Inline body, absent for container parts.
    #[serde(default)]
    pub body: Option<PartBody>,
    /// Child parts of a multipart container.
    #[serde(default)]
    pub parts: Vec<Self>,
}

/// A single header.
#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

/// Body of a part.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    /// URL-safe base64 content.
    #[serde(default)]
    pub data: Option<String>,
}

impl MessagePart {
    /// Looks up a header value, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Sender from the `From` header.
    #[must_use]
    pub fn sender(&self) -> String {
        self.header("From").unwrap_or(UNKNOWN_SENDER).to_string()
    }

    /// Subject, empty when missing.
    #[must_use]
    pub fn subject(&self) -> String {
        self.header("Subject").unwrap_or_default().to_string()
    }

    /// Extracts readable text, preferring `text/plain` over `text/html`
    /// anywhere in the part tree.
    ///
    /// Returns an empty string when the message has no text part.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the chosen part is not valid base64 UTF-8
    /// or its HTML cannot be converted.
    pub fn text(&self) -> Result<String> {
        if let Some(data) = self.find_body("text/plain") {
            return Ok(normalize_whitespace(&decode_body(data)?));
        }
        if let Some(data) = self.find_body("text/html") {
            return Ok(normalize_whitespace(&html_to_text(&decode_body(data)?)?));
        }
        Ok(String::new())
    }

    fn find_body(&self, mime_type: &str) -> Option<&str> {
        if self.mime_type.eq_ignore_ascii_case(mime_type)
            && let Some(data) = self.body.as_ref().and_then(|b| b.data.as_deref())
        {
            return Some(data);
        }
        self.parts.iter().find_map(|p| p.find_body(mime_type))
    }
}

/// Decodes a Gmail body into UTF-8 text.
///
/// # Errors
///
/// Returns [`Error::Decode`] for invalid base64 or non-UTF-8 content.
pub fn decode_body(data: &str) -> Result<String> {
    let bytes = BODY_ENGINE
        .decode(data.trim())
        .map_err(|e| Error::Decode(format!("base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| Error::Decode(format!("utf-8: {e}")))
}

fn html_to_text(html: &str) -> Result<String> {
    htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "head"])
        .build()
        .convert(html)
        .map_err(|e| Error::Decode(format!("html: {e}")))
}

/// Trims every line and drops the blank ones.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
