//! Google Calendar API v3 client, limited to the primary calendar.

use crate::error::{Result, check_status};
use crate::retry::{RetryPolicy, send_with_retry};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Start or end of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// Timed events: local date-time, optionally with offset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day events: `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// IANA zone the `date_time` is expressed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// A wall-clock time in a named zone.
    #[must_use]
    pub fn local(at: NaiveDateTime, time_zone: &str) -> Self {
        Self {
            date_time: Some(at.format("%Y-%m-%dT%H:%M:%S").to_string()),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }
}

/// An event as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event id.
    pub id: String,
    /// Title.
    #[serde(default)]
    pub summary: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Link to the event in the Calendar UI.
    #[serde(default)]
    pub html_link: Option<String>,
    /// Start.
    #[serde(default)]
    pub start: Option<EventTime>,
    /// End.
    #[serde(default)]
    pub end: Option<EventTime>,
}

/// Body of an `events.insert` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    /// Title.
    pub summary: String,
    /// Description.
    pub description: String,
    /// Start.
    pub start: EventTime,
    /// End.
    pub end: EventTime,
}

impl NewEvent {
    /// Builds a timed event whose wall-clock times are in `time_zone`.
    #[must_use]
    pub fn timed(
        summary: impl Into<String>,
        description: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        time_zone: &str,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            start: EventTime::local(start, time_zone),
            end: EventTime::local(end, time_zone),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarResource {
    #[serde(default)]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

/// Calendar REST client.
#[derive(Debug, Clone)]
pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Default for CalendarClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarClient {
    /// Creates a client for the public Calendar endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: crate::http_client(crate::DEFAULT_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Points the client at another base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = crate::http_client(timeout);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the primary calendar's IANA timezone, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn timezone(&self, access_token: &str) -> Result<Option<String>> {
        let request = self
            .http
            .get(format!("{}/calendars/primary", self.base_url))
            .bearer_auth(access_token);
        let response = check_status(send_with_retry(request, &self.retry).await?).await?;
        let calendar: CalendarResource = response.json().await?;
        Ok(calendar.time_zone.filter(|tz| !tz.is_empty()))
    }

    /// Lists single (expanded) events overlapping `[time_min, time_max)`,
    /// ordered by start time and capped at `max_results`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<FixedOffset>,
        time_max: DateTime<FixedOffset>,
        max_results: u32,
    ) -> Result<Vec<Event>> {
        let request = self
            .http
            .get(format!("{}/calendars/primary/events", self.base_url))
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ]);
        let response = check_status(send_with_retry(request, &self.retry).await?).await?;
        let list: EventList = response.json().await?;
        Ok(list.items)
    }

    /// Inserts an event into the primary calendar.
    ///
    /// Inserts are not retried: a timed-out insert may still have landed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn insert_event(&self, access_token: &str, event: &NewEvent) -> Result<Event> {
        let response = self
            .http
            .post(format!("{}/calendars/primary/events", self.base_url))
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_new_event_body() {
        let start = NaiveDate::from_ymd_opt(2025, 7, 29)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let end = start + chrono::Duration::hours(1);
        let event = NewEvent::timed("Review", "{}", start, end, "Europe/Berlin");

        let body = serde_json::to_value(&event).unwrap();
        assert_eq!(body["start"]["dateTime"], "2025-07-29T14:30:00");
        assert_eq!(body["end"]["dateTime"], "2025-07-29T15:30:00");
        assert_eq!(body["end"]["timeZone"], "Europe/Berlin");
        assert!(body["start"].get("date").is_none());
    }

    #[test]
    fn test_event_without_description() {
        let event: Event = serde_json::from_str(r#"{"id":"e1","summary":"Lunch"}"#).unwrap();
        assert_eq!(event.id, "e1");
        assert!(event.description.is_none());
    }
}
