//! Google `OAuth2` userinfo endpoint.

use std::time::Duration;

use crate::error::{Result, check_status};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/oauth2/v2";

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

/// Resolves the e-mail address of the account behind an access token.
#[derive(Debug, Clone)]
pub struct UserInfoClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for UserInfoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UserInfoClient {
    /// Creates a client for the public endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: crate::http_client(crate::DEFAULT_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
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

    /// Returns the account e-mail, if the token carries the `email` scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn email(&self, access_token: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(format!("{}/userinfo", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;
        let info: UserInfo = check_status(response).await?.json().await?;
        Ok(info.email)
    }
}
