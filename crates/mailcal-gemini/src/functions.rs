//! Function declarations offered to the model and their decoded arguments.

use crate::types::FunctionDeclaration;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub(crate) const CATEGORIZE: &str = "CategorizeEmails";
pub(crate) const EVENT_SUMMARY: &str = "EventSummary";
pub(crate) const GENERAL_SUMMARY: &str = "GeneralSummary";

/// Importance and category of one e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categorization {
    /// Whether the e-mail deserves the user's attention.
    #[serde(default)]
    pub importance: bool,
    /// `general` or `event`.
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

/// Event fields as written by the model, times as `YYYY-MM-DD HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Event title.
    pub event_name: String,
    /// Kind of event (meeting, party, deadline...).
    #[serde(default)]
    pub event_type: String,
    /// Start.
    pub event_start: String,
    /// End, frequently omitted.
    #[serde(default)]
    pub event_end: Option<String>,
    /// Short description of the event.
    #[serde(default)]
    pub event_summary: String,
}

/// Summary of a non-event e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSummary {
    /// Summary text.
    pub email_summary: String,
}

pub(crate) fn categorize_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: CATEGORIZE,
        description: "Categorize email importance and type",
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "importance": {
                    "type": "BOOLEAN",
                    "description": "True if the email needs the user's attention"
                },
                "category": {
                    "type": "STRING",
                    "format": "enum",
                    "enum": ["general", "event"],
                    "description": "event if the email announces or invites to something with a date and time"
                }
            },
            "required": ["importance", "category"]
        }),
    }
}

pub(crate) fn event_summary_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: EVENT_SUMMARY,
        description: "Extract detailed event information",
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "event_name": {"type": "STRING", "description": "Name of the event"},
                "event_type": {"type": "STRING", "description": "Type of the event"},
                "event_start": {
                    "type": "STRING",
                    "description": "Start date and time in the format YYYY-MM-DD HH:MM"
                },
                "event_end": {
                    "type": "STRING",
                    "description": "End date and time in the format YYYY-MM-DD HH:MM, omit if unknown"
                },
                "event_summary": {"type": "STRING", "description": "Short summary of the event"}
            },
            "required": ["event_name", "event_type", "event_start", "event_summary"]
        }),
    }
}

pub(crate) fn general_summary_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: GENERAL_SUMMARY,
        description: "Provide detailed email summary",
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "email_summary": {"type": "STRING", "description": "Summary of the email"}
            },
            "required": ["email_summary"]
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_categorization_defaults() {
        let c: Categorization = serde_json::from_value(json!({})).unwrap();
        assert!(!c.importance);
        assert_eq!(c.category, "general");
    }

    #[test]
    fn test_event_summary_without_end() {
        let e: EventSummary = serde_json::from_value(json!({
            "event_name": "Demo",
            "event_start": "2025-07-29 14:30",
            "event_summary": "Product demo"
        }))
        .unwrap();
        assert!(e.event_end.is_none());
        assert_eq!(e.event_type, "");
    }

    #[test]
    fn test_declarations_require_start() {
        let decl = event_summary_declaration();
        assert_eq!(decl.name, "EventSummary");
        let required = decl.parameters["required"].as_array().unwrap();
        assert!(required.iter().any(|r| r == "event_start"));
        assert!(!required.iter().any(|r| r == "event_end"));
    }
}
