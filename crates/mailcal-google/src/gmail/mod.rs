//! Gmail API v1 client.

mod payload;

pub use payload::{Header, MessagePart, PartBody, decode_body, normalize_whitespace};

use crate::error::{Result, check_status};
use crate::retry::{RetryPolicy, send_with_retry};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// A message flattened to what the triage pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Provider message id, stable within the mailbox.
    pub id: String,
    /// Raw `From` header.
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body with blank lines removed.
    pub text: String,
}

/// Search parameters for unread primary-inbox mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQuery {
    /// Passed as Gmail's `after:` operator.
    pub after: NaiveDate,
    /// Passed as Gmail's `before:` operator.
    pub before: NaiveDate,
    /// Maximum number of messages to list.
    pub max_results: u32,
}

impl MessageQuery {
    /// Renders the Gmail search expression.
    #[must_use]
    pub fn search(&self) -> String {
        format!(
            "category:primary before:{} after:{} is:unread",
            self.before.format("%Y/%m/%d"),
            self.after.format("%Y/%m/%d"),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FullMessage {
    id: String,
    #[serde(default)]
    payload: MessagePart,
}

/// Gmail REST client.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Default for GmailClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GmailClient {
    /// Creates a client for the public Gmail endpoint.
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

    /// Lists unread primary-inbox messages matching `query` and fetches each one.
    ///
    /// A message that cannot be fetched or decoded is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the listing call itself fails.
    pub async fn list_unread(&self, access_token: &str, query: &MessageQuery) -> Result<Vec<Message>> {
        let request = self
            .http
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(access_token)
            .query(&[
                ("labelIds", "INBOX".to_string()),
                ("q", query.search()),
                ("maxResults", query.max_results.to_string()),
            ]);
        let response = check_status(send_with_retry(request, &self.retry).await?).await?;
        let listing: ListResponse = response.json().await?;

        tracing::debug!(count = listing.messages.len(), "Listed unread messages");

        let mut messages = Vec::with_capacity(listing.messages.len());
        for reference in listing.messages {
            match self.get_message(access_token, &reference.id).await {
                Ok(message) => messages.push(message),
                Err(e) => {
                    tracing::warn!(message_id = %reference.id, error = %e, "Skipping undecodable message");
                }
            }
        }
        Ok(messages)
    }

    /// Fetches one message in `full` format and flattens it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn get_message(&self, access_token: &str, id: &str) -> Result<Message> {
        let request = self
            .http
            .get(format!("{}/users/me/messages/{id}", self.base_url))
            .bearer_auth(access_token)
            .query(&[("format", "full")]);
        let response = check_status(send_with_retry(request, &self.retry).await?).await?;
        let full: FullMessage = response.json().await?;

        Ok(Message {
            sender: full.payload.sender(),
            subject: full.payload.subject(),
            text: full.payload.text()?,
            id: full.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_expression() {
        let query = MessageQuery {
            after: NaiveDate::from_ymd_opt(2025, 7, 28).unwrap_or_default(),
            before: NaiveDate::from_ymd_opt(2025, 7, 30).unwrap_or_default(),
            max_results: 10,
        };
        assert_eq!(
            query.search(),
            "category:primary before:2025/07/30 after:2025/07/28 is:unread"
        );
    }
}
