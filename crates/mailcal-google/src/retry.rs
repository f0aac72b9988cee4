//! Bounded retry for idempotent-enough Google API requests.

use crate::error::{Error, Result};
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Upper bound for a server supplied `Retry-After`.
const MAX_RETRY_AFTER_SECS: u64 = 30;

/// Retry settings for Google API calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    pub initial_backoff: Duration,
    /// Cap for the exponential backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that sends each request exactly once.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32, retry_after: Option<&HeaderValue>) -> Duration {
        if let Some(secs) = retry_after
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            return Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS));
        }

        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Sends `request`, retrying transient failures according to `policy`.
///
/// The final response is returned as-is, so callers still check its status.
///
/// # Errors
///
/// Returns [`Error::Http`] if the last attempt fails at the transport level.
pub(crate) async fn send_with_retry(request: RequestBuilder, policy: &RetryPolicy) -> Result<Response> {
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..attempts {
        // Streaming bodies cannot be cloned; send those once.
        let Some(cloned) = request.try_clone() else {
            break;
        };

        match cloned.send().await {
            Ok(response) if is_retryable(response.status()) => {
                let delay = policy.delay(attempt, response.headers().get(RETRY_AFTER));
                tracing::warn!(
                    attempt,
                    attempts,
                    status = %response.status(),
                    ?delay,
                    "Google API returned a transient status, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Ok(response) => return Ok(response),
            Err(err) if err.is_timeout() || err.is_connect() => {
                let delay = policy.delay(attempt, None);
                tracing::warn!(attempt, attempts, error = %err, ?delay, "Google API transport error, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(Error::Http(err)),
        }
    }

    request.send().await.map_err(Error::Http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1, None), Duration::from_millis(250));
        assert_eq!(policy.delay(2, None), Duration::from_millis(500));
        assert_eq!(policy.delay(10, None), Duration::from_secs(2));
    }

    #[test]
    fn test_retry_after_is_honoured_and_capped() {
        let policy = RetryPolicy::default();
        let header = HeaderValue::from_static("3");
        assert_eq!(policy.delay(1, Some(&header)), Duration::from_secs(3));

        let header = HeaderValue::from_static("3600");
        assert_eq!(policy.delay(1, Some(&header)), Duration::from_secs(30));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
    }
}
