//! Correlation payload stored in calendar event descriptions.
//!
//! The description of every event this crate creates is a compact JSON
//! object:
//!
//! ```text
//! {"v":1,"email_id":"18c2f0a1b2c3d4e5","summary":"Quarterly planning"}
//! ```
//!
//! It is the only link between a calendar event and the e-mail that produced
//! it. Descriptions written by anyone else decode to `None`; decoding never
//! fails loudly.

use serde::{Deserialize, Serialize};

/// Current payload version.
pub const PAYLOAD_VERSION: u32 = 1;

/// Data embedded in an event description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationPayload {
    /// Format version, always [`PAYLOAD_VERSION`] when encoding.
    #[serde(rename = "v")]
    pub version: u32,
    /// Id of the source e-mail.
    pub email_id: String,
    /// Short event summary, kept human readable in the calendar UI.
    #[serde(default)]
    pub summary: String,
}

impl CorrelationPayload {
    /// Creates a current-version payload.
    #[must_use]
    pub fn new(email_id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            version: PAYLOAD_VERSION,
            email_id: email_id.into(),
            summary: summary.into(),
        }
    }

    /// Serializes the payload into description text.
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::json!({
            "v": self.version,
            "email_id": self.email_id,
            "summary": self.summary,
        })
        .to_string()
    }

    /// Parses description text.
    ///
    /// Returns `None` for anything that is not a current-version payload with
    /// a non-empty `email_id`.
    #[must_use]
    pub fn decode(description: &str) -> Option<Self> {
        let payload: Self = serde_json::from_str(description.trim()).ok()?;
        (payload.version == PAYLOAD_VERSION && !payload.email_id.trim().is_empty())
            .then_some(payload)
    }
}

/// The source e-mail id recorded in an event description, if any.
#[must_use]
pub fn email_id_of(description: Option<&str>) -> Option<String> {
    description
        .and_then(CorrelationPayload::decode)
        .map(|payload| payload.email_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_trip() {
        let encoded = CorrelationPayload::new("abc123", "s").encode();
        let decoded = CorrelationPayload::decode(&encoded).unwrap();
        assert_eq!(decoded.email_id, "abc123");
        assert_eq!(decoded.summary, "s");
        assert_eq!(email_id_of(Some(&encoded)).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_foreign_descriptions_have_no_id() {
        for description in [
            "",
            "   ",
            "Dial-in: +1 555 0100",
            "{}",
            "[1,2,3]",
            r#"{"v":1}"#,
            r#"{"v":1,"email_id":""}"#,
            r#"{"v":2,"email_id":"abc"}"#,
            r#"{"v":"1","email_id":"abc"}"#,
            r#"{'email_id': 'abc', 'summary': 's'}"#,
        ] {
            assert_eq!(email_id_of(Some(description)), None, "{description}");
        }
        assert_eq!(email_id_of(None), None);
    }

    #[test]
    fn test_summary_is_optional_and_whitespace_tolerated() {
        let decoded = CorrelationPayload::decode("\n {\"v\":1,\"email_id\":\"m9\"} \n").unwrap();
        assert_eq!(decoded.email_id, "m9");
        assert!(decoded.summary.is_empty());
    }

    #[test]
    fn test_summary_with_quotes_survives() {
        let payload = CorrelationPayload::new("m1", "Dinner at \"Luigi's\"\nbring {cake}");
        assert_eq!(CorrelationPayload::decode(&payload.encode()), Some(payload));
    }

    proptest! {
        #[test]
        fn decode_never_panics(description in ".*") {
            let _ = CorrelationPayload::decode(&description);
        }

        #[test]
        fn encoded_ids_round_trip(email_id in "[A-Za-z0-9]{1,24}", summary in ".*") {
            let encoded = CorrelationPayload::new(email_id.clone(), summary).encode();
            prop_assert_eq!(email_id_of(Some(&encoded)), Some(email_id));
        }
    }
}
