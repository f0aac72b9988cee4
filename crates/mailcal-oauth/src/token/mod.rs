//! `OAuth2` token types.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before the real expiry at which a token is already treated as stale.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Google access token with refresh metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Access token sent as `Authorization: Bearer`.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Expiration time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token for obtaining new access tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Space separated scopes granted by the authorization server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Token {
    /// Creates a bearer token with no expiry information.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            refresh_token: None,
            scope: None,
        }
    }

    /// Creates a token from a token endpoint response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response carries an empty access token.
    pub fn from_response(response: TokenResponse) -> Result<Self> {
        if response.access_token.is_empty() {
            return Err(Error::InvalidResponse("empty access_token".into()));
        }

        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        Ok(Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            refresh_token: response.refresh_token,
            scope: response.scope,
        })
    }

    /// Checks if the token is expired, counting the last minute as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= exp)
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the refresh token if available.
    ///
    /// # Errors
    ///
    /// Returns an error if no refresh token is available.
    pub fn refresh_token(&self) -> Result<&str> {
        self.refresh_token.as_deref().ok_or(Error::NoRefreshToken)
    }

    /// Returns true if every scope in `required` was granted.
    ///
    /// Tokens without scope information are assumed to carry what was requested.
    #[must_use]
    pub fn has_scopes(&self, required: &[String]) -> bool {
        self.scope.as_deref().is_none_or(|granted| {
            required
                .iter()
                .all(|scope| granted.split_whitespace().any(|g| g == scope))
        })
    }
}

/// Token response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
    /// Refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Error response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,
    /// Error description.
    #[serde(default)]
    pub error_description: String,
}

impl ErrorResponse {
    /// Converts to an Error.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::oauth_error(self.error, self.error_description)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        let token = Token::bearer("access123");
        assert_eq!(token.access_token, "access123");
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expires_at.is_none());
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_expiration_skew() {
        let expired = Token::bearer("a").with_expires_at(Utc::now() - Duration::seconds(120));
        assert!(expired.is_expired());

        // Inside the skew window counts as expired.
        let nearly = Token::bearer("a").with_expires_at(Utc::now() + Duration::seconds(30));
        assert!(nearly.is_expired());

        let valid = Token::bearer("a").with_expires_at(Utc::now() + Duration::seconds(3600));
        assert!(!valid.is_expired());
    }

    #[test]
    fn test_token_from_response() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.x","expires_in":3599,"refresh_token":"1//r","scope":"openid email"}"#,
        )
        .unwrap();

        let token = Token::from_response(response).unwrap();
        assert_eq!(token.access_token, "ya29.x");
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.refresh_token.as_deref(), Some("1//r"));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_token_from_response_rejects_empty() {
        let response = TokenResponse {
            access_token: String::new(),
            token_type: "Bearer".into(),
            expires_in: None,
            refresh_token: None,
            scope: None,
        };
        assert!(matches!(
            Token::from_response(response),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_missing_refresh_token() {
        assert!(matches!(
            Token::bearer("a").refresh_token(),
            Err(Error::NoRefreshToken)
        ));
    }

    #[test]
    fn test_has_scopes() {
        let mut token = Token::bearer("a");
        let wanted = vec!["openid".to_string(), "email".to_string()];
        assert!(token.has_scopes(&wanted));

        token.scope = Some("email openid profile".into());
        assert!(token.has_scopes(&wanted));

        token.scope = Some("email".into());
        assert!(!token.has_scopes(&wanted));
    }
}
