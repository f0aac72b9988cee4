//! Error types for Google API calls.

use serde::Deserialize;

/// Result type alias for Google API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Google API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport error, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The access token was rejected (HTTP 401/403).
    #[error("access token rejected ({status}): {message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Message from the API.
        message: String,
    },

    /// Any other non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the API.
        message: String,
    },

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A message body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Returns true if the failure means the credentials are unusable.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Turns a non-success response into an [`Error`], passing successes through.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Err(Error::Unauthorized {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}
