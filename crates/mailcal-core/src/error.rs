//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Credentials are missing, expired or were rejected.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// A mail, calendar or analyzer call failed after its own retries.
    #[error("{service} error: {message}")]
    Upstream {
        /// Which collaborator failed (`gmail`, `calendar`, `gemini`).
        service: &'static str,
        /// Collaborator error text.
        message: String,
    },

    /// The requested e-mail is not in the fetch window or no longer qualifies.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input or extracted data failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Builds an [`Error::Upstream`].
    pub fn upstream(service: &'static str, message: impl ToString) -> Self {
        Self::Upstream {
            service,
            message: message.to_string(),
        }
    }
}

/// Credential failures. Fatal to a run and never retried by the pipeline.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The user has not linked a Google account.
    #[error("Google account not connected")]
    NotConnected,

    /// The access token is expired and could not be renewed.
    #[error("Access token expired")]
    Expired,

    /// A Google API refused the token.
    #[error("Access token rejected: {0}")]
    Rejected(String),

    /// The token endpoint refused to refresh.
    #[error("Token refresh failed: {0}")]
    Refresh(String),

    /// The granted scopes do not cover mail and calendar access.
    #[error("Google account is missing required access: {0}")]
    MissingScope(String),
}

/// Validation failures for run inputs and extracted event data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Fetch cap must be positive.
    InvalidCap,
    /// Window start is after its end.
    InvalidWindow,
    /// An extracted time is not `YYYY-MM-DD HH:MM`.
    UnparseableTime,
    /// Event end is not after its start.
    EmptyTimeRange,
    /// Extracted event has no name.
    MissingEventName,
    /// E-mail id is empty.
    EmptyEmailId,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidCap => "Email count must be greater than zero",
            Self::InvalidWindow => "Fetch window starts after it ends",
            Self::UnparseableTime => "Event time is not in YYYY-MM-DD HH:MM format",
            Self::EmptyTimeRange => "Event must end after it starts",
            Self::MissingEventName => "Event name is required",
            Self::EmptyEmailId => "Email id is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidCap => "email_count",
            Self::InvalidWindow => "window",
            Self::UnparseableTime => "event_start",
            Self::EmptyTimeRange => "event_end",
            Self::MissingEventName => "event_name",
            Self::EmptyEmailId => "email_id",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
