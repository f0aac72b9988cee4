//! `OAuth2` provider configuration.

use crate::error::{Error, Result};
use url::Url;

/// Read-only Gmail access.
pub const SCOPE_GMAIL_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";
/// Full calendar access (list and insert events).
pub const SCOPE_CALENDAR: &str = "https://www.googleapis.com/auth/calendar";
/// Account e-mail address.
pub const SCOPE_USERINFO_EMAIL: &str = "https://www.googleapis.com/auth/userinfo.email";
/// Account profile.
pub const SCOPE_USERINFO_PROFILE: &str = "https://www.googleapis.com/auth/userinfo.profile";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Overrides the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_token_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.token_url = Url::parse(url.as_ref())?;
        Ok(self)
    }

    /// Google `OAuth2` provider configuration.
    ///
    /// Scopes:
    /// - `gmail.readonly` - read unread primary mail
    /// - `calendar` - list and insert events
    /// - `openid`, `userinfo.email`, `userinfo.profile` - identify the linked account
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new(
            "Google",
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
        )?
        .with_default_scopes(
            [
                SCOPE_GMAIL_READONLY,
                SCOPE_CALENDAR,
                "openid",
                SCOPE_USERINFO_EMAIL,
                SCOPE_USERINFO_PROFILE,
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        ))
    }

    /// Returns true for the Google provider, which needs offline access parameters.
    #[must_use]
    pub fn is_google(&self) -> bool {
        self.name == "Google"
    }

    /// Validates that required URLs are set.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.auth_url.as_str().is_empty() {
            return Err(Error::InvalidConfig("auth_url is empty".into()));
        }
        if self.token_url.as_str().is_empty() {
            return Err(Error::InvalidConfig("token_url is empty".into()));
        }
        if self.default_scopes.is_empty() {
            return Err(Error::InvalidConfig("no scopes configured".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert!(provider.is_google());
        assert_eq!(provider.default_scopes.len(), 5);
        assert!(
            provider
                .default_scopes
                .iter()
                .any(|s| s == SCOPE_GMAIL_READONLY)
        );
        assert!(provider.default_scopes.iter().any(|s| s == SCOPE_CALENDAR));
        provider.validate().unwrap();
    }

    #[test]
    fn test_custom_provider_needs_scopes() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
        .unwrap();
        assert!(!provider.is_google());
        assert!(provider.validate().is_err());

        let provider = provider.with_default_scopes(vec!["email".to_string()]);
        provider.validate().unwrap();
    }

    #[test]
    fn test_token_url_override() {
        let provider = Provider::google()
            .unwrap()
            .with_token_url("http://127.0.0.1:9999/token")
            .unwrap();
        assert_eq!(provider.token_url.as_str(), "http://127.0.0.1:9999/token");
        assert!(Provider::google().unwrap().with_token_url("not a url").is_err());
    }
}
