//! Error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mailcal_core::{CredentialError, Error};
use serde_json::json;

/// A failed request. Rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or unknown bearer token.
    Unauthorized,
    /// A pipeline or credential failure.
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::Core(error)
    }
}

impl ApiError {
    /// Status code and client-facing message.
    pub fn status(&self) -> (StatusCode, String) {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Invalid authentication credentials".to_string(),
            ),
            Self::Core(error) => match error {
                Error::Credential(CredentialError::NotConnected) => {
                    (StatusCode::BAD_REQUEST, error.to_string())
                }
                Error::Credential(_) => (StatusCode::UNAUTHORIZED, error.to_string()),
                Error::NotFound(_) => (StatusCode::NOT_FOUND, error.to_string()),
                Error::Validation(v) => (StatusCode::UNPROCESSABLE_ENTITY, v.message().to_string()),
                Error::Upstream { .. } => (StatusCode::BAD_GATEWAY, error.to_string()),
                Error::Database(_) | Error::Serde(_) | Error::Config(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status();
        if status.is_server_error() {
            if let Self::Core(error) = &self {
                tracing::error!(%status, error = %error, "Request failed");
            }
        } else {
            tracing::debug!(%status, %detail, "Request rejected");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
