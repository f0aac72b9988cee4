//! Error types for Gemini calls.

/// Result type alias for Gemini operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Gemini error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport error, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API key was rejected.
    #[error("authentication failed ({0})")]
    Authentication(u16),

    /// Quota or rate limit hit.
    #[error("rate limited")]
    RateLimit,

    /// Any other non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The response body was not a valid `generateContent` response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The model answered without calling the expected function.
    #[error("model did not call {0}")]
    NoFunctionCall(&'static str),

    /// The function arguments did not match the declared schema.
    #[error("invalid arguments for {function}: {source}")]
    InvalidArguments {
        /// Function name.
        function: &'static str,
        /// Decoding error.
        source: serde_json::Error,
    },
}
