//! Token lifecycle for linked Google accounts.

use mailcal_google::UserInfoClient;
use mailcal_oauth::{AuthorizationCodeFlow, Token};
use tracing::{debug, info, warn};

use super::repository::CredentialRepository;
use crate::error::{CredentialError, Error, Result};
use crate::triage::UserId;

/// Links Google accounts and hands out usable access tokens.
#[derive(Debug, Clone)]
pub struct CredentialManager {
    repository: CredentialRepository,
    flow: AuthorizationCodeFlow,
    userinfo: UserInfoClient,
}

impl CredentialManager {
    /// Creates a manager.
    #[must_use]
    pub const fn new(
        repository: CredentialRepository,
        flow: AuthorizationCodeFlow,
        userinfo: UserInfoClient,
    ) -> Self {
        Self {
            repository,
            flow,
            userinfo,
        }
    }

    /// Consent URL for `user`. The user id travels as the OAuth `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL cannot be built.
    pub fn authorization_url(&self, user: UserId) -> Result<String> {
        self.flow
            .authorization_url(None, Some(&user.to_string()))
            .map(|url| url.to_string())
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Completes the consent redirect: exchanges `code`, looks up the account
    /// address and stores both. Returns the address if Google disclosed it.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Rejected`] if the code exchange fails, or a
    /// database error.
    pub async fn connect(&self, user: UserId, code: &str) -> Result<Option<String>> {
        let token = self
            .flow
            .exchange_code(code, None)
            .await
            .map_err(|e| CredentialError::Rejected(e.to_string()))?;

        let google_email = match self.userinfo.email(&token.access_token).await {
            Ok(email) => email,
            Err(e) => {
                warn!(%user, error = %e, "Could not look up linked account address");
                None
            }
        };

        self.repository
            .save(user, &token, google_email.as_deref())
            .await?;
        info!(%user, email = ?google_email, "Linked Google account");
        Ok(google_email)
    }

    /// A token that is not expired, refreshing and persisting it if needed.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotConnected`] if the user never linked an account
    /// - [`CredentialError::Expired`] if it expired and there is no refresh
    ///   token, or Google revoked the grant
    /// - [`CredentialError::Refresh`] if the refresh fails for another reason
    pub async fn valid_token(&self, user: UserId) -> Result<Token> {
        let stored = self
            .repository
            .load(user)
            .await?
            .ok_or(CredentialError::NotConnected)?;

        if !stored.token.is_expired() {
            return Ok(stored.token);
        }
        if stored.token.refresh_token.is_none() {
            return Err(CredentialError::Expired.into());
        }

        debug!(%user, "Access token expired, refreshing");
        let renewed = self
            .flow
            .client()
            .refresh_token(&stored.token)
            .await
            .map_err(|e| {
                if e.is_grant_revoked() {
                    warn!(%user, error = %e, "Refresh grant revoked, account must be linked again");
                    CredentialError::Expired
                } else {
                    warn!(%user, error = %e, "Token refresh failed");
                    CredentialError::Refresh(e.to_string())
                }
            })?;

        self.repository.update_token(user, &renewed).await?;
        Ok(renewed)
    }

    /// Whether the user has credentials that are usable right now.
    ///
    /// # Errors
    ///
    /// Returns an error only for storage failures.
    pub async fn is_connected(&self, user: UserId) -> Result<bool> {
        match self.valid_token(user).await {
            Ok(_) => Ok(true),
            Err(Error::Credential(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Address of the linked account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn google_email(&self, user: UserId) -> Result<Option<String>> {
        Ok(self
            .repository
            .load(user)
            .await?
            .and_then(|stored| stored.google_email))
    }

    /// Forgets the linked account. Returns whether one was linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unlink(&self, user: UserId) -> Result<bool> {
        let removed = self.repository.delete(user).await?;
        if removed {
            info!(%user, "Unlinked Google account");
        }
        Ok(removed)
    }
}
