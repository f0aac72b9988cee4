//! Collaborators the reconciliation pipeline depends on.
//!
//! The pipeline only talks to these traits. [`google`] and [`gemini`] bind
//! them to the real APIs; tests substitute in-memory fakes.

pub mod gemini;
pub mod google;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use mailcal_oauth::Token;

use crate::Result;
use crate::correlation::CorrelationPayload;
use crate::triage::{
    CalendarEvent, Classification, EventDetails, EventExtraction, GeneralSummary, RawMessage,
    UserId,
};
use crate::window::FetchWindow;

pub use gemini::GeminiAnalyzer;
pub use google::{GmailSource, GoogleCalendar};

/// Source of unread primary-inbox mail.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Up to `cap` unread messages received within `window`.
    ///
    /// Messages that cannot be decoded are skipped by the implementation.
    async fn list_unread(
        &self,
        credentials: &Token,
        window: FetchWindow,
        cap: u32,
    ) -> Result<Vec<RawMessage>>;
}

/// The user's primary calendar.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// IANA name of the calendar's timezone.
    async fn timezone(&self, credentials: &Token) -> Result<String>;

    /// Events overlapping the local day `day` in `timezone`, at most `limit`.
    async fn list_day(
        &self,
        credentials: &Token,
        day: NaiveDate,
        timezone: Tz,
        limit: u32,
    ) -> Result<Vec<CalendarEvent>>;

    /// Creates an event whose description carries `payload`.
    async fn insert(
        &self,
        credentials: &Token,
        event: &EventDetails,
        timezone: Tz,
        payload: &CorrelationPayload,
    ) -> Result<CalendarEvent>;
}

/// Language-model classification and extraction.
#[async_trait]
pub trait EmailAnalyzer: Send + Sync {
    /// Importance and category.
    async fn categorize(&self, text: &str) -> Result<Classification>;

    /// Event fields. `reference` is the current local time, used to resolve
    /// relative dates.
    async fn extract_event(&self, text: &str, reference: NaiveDateTime) -> Result<EventExtraction>;

    /// Summary of a general message.
    async fn extract_general(&self, text: &str) -> Result<GeneralSummary>;
}

/// Per-user set of dismissed e-mail ids.
#[async_trait]
pub trait DismissalStore: Send + Sync {
    /// All dismissed ids.
    async fn list(&self, user: UserId) -> Result<HashSet<String>>;

    /// Dismisses `email_id`. Already dismissed is not an error.
    async fn add(&self, user: UserId, email_id: &str) -> Result<()>;

    /// Un-dismisses `email_id`. Not dismissed is not an error.
    async fn remove(&self, user: UserId, email_id: &str) -> Result<()>;

    /// Whether `email_id` is dismissed.
    async fn contains(&self, user: UserId, email_id: &str) -> Result<bool>;
}
