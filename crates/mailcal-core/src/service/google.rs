//! Gmail and Google Calendar adapters.

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use mailcal_google::{CalendarClient, Event, GmailClient, MessageQuery, NewEvent};
use mailcal_oauth::Token;

use super::{CalendarService, MailSource};
use crate::correlation::CorrelationPayload;
use crate::error::{CredentialError, Error, Result};
use crate::triage::{CalendarEvent, EventDetails, RawMessage};
use crate::window::{FetchWindow, day_bounds};

fn map_error(service: &'static str, err: mailcal_google::Error) -> Error {
    if err.is_unauthorized() {
        return Error::Credential(CredentialError::Rejected(err.to_string()));
    }
    Error::upstream(service, err)
}

impl From<Event> for CalendarEvent {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            summary: event.summary.unwrap_or_default(),
            description: event.description,
            link: event.html_link,
        }
    }
}

/// [`MailSource`] backed by the Gmail API.
#[derive(Debug, Clone, Default)]
pub struct GmailSource {
    client: GmailClient,
}

impl GmailSource {
    /// Wraps a client.
    #[must_use]
    pub const fn new(client: GmailClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MailSource for GmailSource {
    async fn list_unread(
        &self,
        credentials: &Token,
        window: FetchWindow,
        cap: u32,
    ) -> Result<Vec<RawMessage>> {
        let query = MessageQuery {
            after: window.after,
            before: window.before,
            max_results: cap,
        };
        let messages = self
            .client
            .list_unread(&credentials.access_token, &query)
            .await
            .map_err(|e| map_error("gmail", e))?;

        Ok(messages
            .into_iter()
            .map(|m| RawMessage {
                id: m.id,
                sender: m.sender,
                subject: m.subject,
                text: m.text,
            })
            .collect())
    }
}

/// [`CalendarService`] backed by the primary Google calendar.
#[derive(Debug, Clone, Default)]
pub struct GoogleCalendar {
    client: CalendarClient,
}

impl GoogleCalendar {
    /// Wraps a client.
    #[must_use]
    pub const fn new(client: CalendarClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn timezone(&self, credentials: &Token) -> Result<String> {
        let tz = self
            .client
            .timezone(&credentials.access_token)
            .await
            .map_err(|e| map_error("calendar", e))?;
        Ok(tz.unwrap_or_else(|| "UTC".to_string()))
    }

    async fn list_day(
        &self,
        credentials: &Token,
        day: NaiveDate,
        timezone: Tz,
        limit: u32,
    ) -> Result<Vec<CalendarEvent>> {
        let Some((start, end)) = day_bounds(day, timezone) else {
            tracing::debug!(%day, "Day outside calendar range, no events");
            return Ok(Vec::new());
        };
        let events = self
            .client
            .list_events(
                &credentials.access_token,
                start.fixed_offset(),
                end.fixed_offset(),
                limit,
            )
            .await
            .map_err(|e| map_error("calendar", e))?;

        if events.len() >= limit as usize {
            tracing::debug!(%day, limit, "Calendar day listing hit the page limit");
        }
        Ok(events.into_iter().map(CalendarEvent::from).collect())
    }

    async fn insert(
        &self,
        credentials: &Token,
        event: &EventDetails,
        timezone: Tz,
        payload: &CorrelationPayload,
    ) -> Result<CalendarEvent> {
        let body = NewEvent::timed(
            event.name.clone(),
            payload.encode(),
            event.start,
            event.end,
            timezone.name(),
        );
        let created = self
            .client
            .insert_event(&credentials.access_token, &body)
            .await
            .map_err(|e| map_error("calendar", e))?;
        Ok(created.into())
    }
}
