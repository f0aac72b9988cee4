//! Triage data models.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ValidationError;

/// Unique identifier for an application user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fetched message, already flattened to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Provider message id.
    pub id: String,
    /// Sender as shown in the `From` header.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Whitespace-normalized body text.
    pub text: String,
}

/// Message category assigned by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Anything that is not an event.
    #[default]
    General,
    /// Announces or invites to something with a date and time.
    Event,
}

impl Category {
    /// Parse the analyzer's label. Unknown labels are treated as general.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "event" => Self::Event,
            _ => Self::General,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Event => "event",
        }
    }
}

/// Importance and category of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether the message deserves attention.
    pub importance: bool,
    /// General or event.
    pub category: Category,
}

impl Classification {
    /// What a failed classification degrades to.
    #[must_use]
    pub const fn not_important() -> Self {
        Self {
            importance: false,
            category: Category::General,
        }
    }

    /// Important event.
    #[must_use]
    pub const fn is_event(&self) -> bool {
        self.importance && matches!(self.category, Category::Event)
    }
}

/// Summary of a general message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSummary {
    /// Summary text.
    pub email_summary: String,
}

/// Event fields as the analyzer produced them, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventExtraction {
    /// Event name.
    pub name: String,
    /// Event type.
    pub kind: String,
    /// Start, `YYYY-MM-DD HH:MM` in the user's calendar timezone.
    pub start: String,
    /// End in the same format, if the analyzer found one.
    pub end: Option<String>,
    /// Short summary.
    pub summary: String,
}

/// A validated event with minute-precision local times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Event name.
    #[serde(rename = "event_name")]
    pub name: String,
    /// Event type.
    #[serde(rename = "event_type")]
    pub kind: String,
    /// Local start.
    #[serde(rename = "event_start", with = "minute_format")]
    pub start: NaiveDateTime,
    /// Local end, strictly after `start`.
    #[serde(rename = "event_end", with = "minute_format")]
    pub end: NaiveDateTime,
    /// Short summary.
    #[serde(rename = "event_summary")]
    pub summary: String,
}

impl EventDetails {
    /// Length used when the analyzer gives no end time.
    pub const DEFAULT_DURATION: Duration = Duration::hours(1);

    /// Validates an extraction.
    ///
    /// A missing or blank end becomes `start + 1h`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name is blank, a time does not
    /// parse, or the end is not after the start.
    pub fn from_extraction(extraction: EventExtraction) -> Result<Self, ValidationError> {
        let name = extraction.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingEventName);
        }

        let start = parse_local_time(&extraction.start)?;
        let end = match extraction.end.as_deref().map(str::trim) {
            Some(end) if !end.is_empty() => parse_local_time(end)?,
            _ => start
                .checked_add_signed(Self::DEFAULT_DURATION)
                .ok_or(ValidationError::UnparseableTime)?,
        };
        if end <= start {
            return Err(ValidationError::EmptyTimeRange);
        }

        Ok(Self {
            name: name.to_string(),
            kind: extraction.kind.trim().to_string(),
            start,
            end,
            summary: extraction.summary,
        })
    }
}

/// Parses `YYYY-MM-DD HH:MM`, also accepting a `T` separator and seconds.
/// Seconds are truncated.
///
/// # Errors
///
/// Returns [`ValidationError::UnparseableTime`] for anything else.
pub fn parse_local_time(s: &str) -> Result<NaiveDateTime, ValidationError> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .ok_or(ValidationError::UnparseableTime)
}

mod minute_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_local_time(&s).map_err(serde::de::Error::custom)
    }
}

/// A calendar event as the pipeline sees it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalendarEvent {
    /// Provider event id.
    pub id: String,
    /// Title.
    pub summary: String,
    /// Description, which may carry a correlation payload.
    pub description: Option<String>,
    /// Link to the event in the calendar UI.
    pub link: Option<String>,
}

/// An important general message, summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedEmail {
    /// Random per-run id.
    pub id: Uuid,
    /// Source message id.
    pub email_id: String,
    /// Sender.
    pub sender: String,
    /// Subject.
    pub subject: String,
    /// Always [`Category::General`].
    pub category: Category,
    /// Summary.
    pub content: GeneralSummary,
}

impl SummarizedEmail {
    /// Wraps a summary for `message` with a fresh id.
    #[must_use]
    pub fn new(message: &RawMessage, content: GeneralSummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            email_id: message.id.clone(),
            sender: message.sender.clone(),
            subject: message.subject.clone(),
            category: Category::General,
            content,
        }
    }
}

/// An important event message not yet on the calendar and not dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    /// Random per-run id.
    pub id: Uuid,
    /// Source message id.
    pub email_id: String,
    /// Sender.
    pub sender: String,
    /// Subject.
    pub subject: String,
    /// Always [`Category::Event`].
    pub category: Category,
    /// Event fields.
    pub content: EventDetails,
}

impl PendingEvent {
    /// Wraps event details for `message` with a fresh id.
    #[must_use]
    pub fn new(message: &RawMessage, content: EventDetails) -> Self {
        Self {
            id: Uuid::new_v4(),
            email_id: message.id.clone(),
            sender: message.sender.clone(),
            subject: message.subject.clone(),
            category: Category::Event,
            content,
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Important general messages.
    pub summarized_emails: Vec<SummarizedEmail>,
    /// Important event messages still to be offered.
    pub pending_events: Vec<PendingEvent>,
    /// Messages fetched, including those that produced no output.
    pub total_emails_processed: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn extraction(start: &str, end: Option<&str>) -> EventExtraction {
        EventExtraction {
            name: "Design review".into(),
            kind: "meeting".into(),
            start: start.into(),
            end: end.map(Into::into),
            summary: "Review the new onboarding flow".into(),
        }
    }

    #[test]
    fn test_missing_end_defaults_to_one_hour() {
        let event = EventDetails::from_extraction(extraction("2025-07-29 14:30", None)).unwrap();
        assert_eq!(event.end.format("%Y-%m-%d %H:%M").to_string(), "2025-07-29 15:30");

        let blank = EventDetails::from_extraction(extraction("2025-07-29 14:30", Some("  "))).unwrap();
        assert_eq!(blank.end, event.end);
    }

    #[test]
    fn test_end_must_follow_start() {
        let err = EventDetails::from_extraction(extraction("2025-07-29 14:30", Some("2025-07-29 14:30")))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyTimeRange);

        let err = EventDetails::from_extraction(extraction("2025-07-29 14:30", Some("2025-07-29 09:00")))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyTimeRange);
    }

    #[test]
    fn test_default_end_past_calendar_range_rejected() {
        let last = NaiveDateTime::MAX.format("%Y-%m-%d %H:%M").to_string();
        assert!(EventDetails::from_extraction(extraction(&last, None)).is_err());
    }

    #[test]
    fn test_unparseable_times() {
        for bad in ["tomorrow at 3", "", "2025-13-01 10:00", "29/07/2025 10:00"] {
            assert_eq!(
                EventDetails::from_extraction(extraction(bad, None)).unwrap_err(),
                ValidationError::UnparseableTime,
                "{bad}"
            );
        }
        assert_eq!(
            EventDetails::from_extraction(extraction("2025-07-29 10:00", Some("later"))).unwrap_err(),
            ValidationError::UnparseableTime
        );
    }

    #[test]
    fn test_lenient_time_formats_truncate_to_minute() {
        let a = parse_local_time("2025-07-29T14:30:59").unwrap();
        let b = parse_local_time(" 2025-07-29 14:30 ").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut e = extraction("2025-07-29 14:30", None);
        e.name = "   ".into();
        assert_eq!(
            EventDetails::from_extraction(e).unwrap_err(),
            ValidationError::MissingEventName
        );
    }

    #[test]
    fn test_event_details_wire_format() {
        let event = EventDetails::from_extraction(extraction("2025-07-29 14:30", None)).unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_name"], "Design review");
        assert_eq!(json["event_start"], "2025-07-29 14:30");
        assert_eq!(json["event_end"], "2025-07-29 15:30");

        let back: EventDetails = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("event"), Category::Event);
        assert_eq!(Category::parse(" EVENT "), Category::Event);
        assert_eq!(Category::parse("general"), Category::General);
        assert_eq!(Category::parse("newsletter"), Category::General);
        assert_eq!(Category::Event.as_str(), "event");
    }

    #[test]
    fn test_classification_is_event() {
        let c = Classification {
            importance: true,
            category: Category::Event,
        };
        assert!(c.is_event());
        assert!(!Classification::not_important().is_event());
        assert!(
            !Classification {
                importance: false,
                category: Category::Event
            }
            .is_event()
        );
    }

    #[test]
    fn test_output_ids_are_fresh() {
        let message = RawMessage {
            id: "m1".into(),
            sender: "a@example.com".into(),
            subject: "s".into(),
            text: "t".into(),
        };
        let summary = GeneralSummary {
            email_summary: "x".into(),
        };
        let a = SummarizedEmail::new(&message, summary.clone());
        let b = SummarizedEmail::new(&message, summary);
        assert_ne!(a.id, b.id);
        assert_eq!(a.email_id, b.email_id);
    }
}
