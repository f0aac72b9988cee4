//! `SQLite` storage for Google tokens.

use chrono::{DateTime, Utc};
use mailcal_oauth::Token;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use crate::Result;
use crate::triage::UserId;

/// Tokens and account address stored for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    /// Owner.
    pub user_id: UserId,
    /// Current token.
    pub token: Token,
    /// Address of the linked Google account.
    pub google_email: Option<String>,
}

/// Repository for Google credentials.
#[derive(Debug, Clone)]
pub struct CredentialRepository {
    pool: SqlitePool,
}

impl CredentialRepository {
    /// Create a new repository with the given database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        Self::with_pool(pool).await
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool, creating the table if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS google_credentials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                token_expiry TEXT,
                scope TEXT,
                google_email TEXT,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store the token and account address for a user, replacing any previous link.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn save(&self, user: UserId, token: &Token, google_email: Option<&str>) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO google_credentials
                (user_id, access_token, refresh_token, token_expiry, scope, google_email)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_expiry = excluded.token_expiry,
                scope = excluded.scope,
                google_email = excluded.google_email,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(user.0)
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at.map(|t| t.to_rfc3339()))
        .bind(&token.scope)
        .bind(google_email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace only the token, keeping the account address.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update_token(&self, user: UserId, token: &Token) -> Result<()> {
        sqlx::query(
            r"
            UPDATE google_credentials
            SET access_token = ?, refresh_token = ?, token_expiry = ?, scope = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = ?
            ",
        )
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at.map(|t| t.to_rfc3339()))
        .bind(&token.scope)
        .bind(user.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load a user's credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn load(&self, user: UserId) -> Result<Option<StoredCredentials>> {
        let row = sqlx::query(
            r"
            SELECT user_id, access_token, refresh_token, token_expiry, scope, google_email
            FROM google_credentials
            WHERE user_id = ?
            ",
        )
        .bind(user.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Self::row_to_credentials(&r)))
    }

    /// Remove a user's credentials. Returns whether anything was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, user: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM google_credentials WHERE user_id = ?")
            .bind(user.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_credentials(row: &SqliteRow) -> StoredCredentials {
        let expires_at = row
            .get::<Option<String>, _>("token_expiry")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc));

        StoredCredentials {
            user_id: UserId(row.get("user_id")),
            token: Token {
                access_token: row.get("access_token"),
                token_type: "Bearer".to_string(),
                expires_at,
                refresh_token: row.get("refresh_token"),
                scope: row.get("scope"),
            },
            google_email: row.get("google_email"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};

    fn token() -> Token {
        Token::bearer("ya29.a")
            .with_refresh_token("1//r")
            .with_expires_at((Utc::now() + Duration::hours(1)).trunc_subsecs(0))
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let repo = CredentialRepository::in_memory().await.unwrap();
        let user = UserId::new(1);
        assert!(repo.load(user).await.unwrap().is_none());

        let token = token();
        repo.save(user, &token, Some("me@example.com")).await.unwrap();
        let stored = repo.load(user).await.unwrap().unwrap();

        assert_eq!(stored.user_id, user);
        assert_eq!(stored.token, token);
        assert_eq!(stored.google_email.as_deref(), Some("me@example.com"));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_link() {
        let repo = CredentialRepository::in_memory().await.unwrap();
        let user = UserId::new(1);

        repo.save(user, &token(), Some("old@example.com")).await.unwrap();
        repo.save(user, &Token::bearer("ya29.b"), Some("new@example.com"))
            .await
            .unwrap();

        let stored = repo.load(user).await.unwrap().unwrap();
        assert_eq!(stored.token.access_token, "ya29.b");
        assert!(stored.token.refresh_token.is_none());
        assert_eq!(stored.google_email.as_deref(), Some("new@example.com"));
    }

    #[tokio::test]
    async fn test_update_token_keeps_email() {
        let repo = CredentialRepository::in_memory().await.unwrap();
        let user = UserId::new(1);

        repo.save(user, &token(), Some("me@example.com")).await.unwrap();
        let renewed = Token::bearer("ya29.new").with_refresh_token("1//r");
        repo.update_token(user, &renewed).await.unwrap();

        let stored = repo.load(user).await.unwrap().unwrap();
        assert_eq!(stored.token.access_token, "ya29.new");
        assert!(stored.token.expires_at.is_none());
        assert_eq!(stored.google_email.as_deref(), Some("me@example.com"));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = CredentialRepository::in_memory().await.unwrap();
        let user = UserId::new(1);

        repo.save(user, &token(), None).await.unwrap();
        assert!(repo.delete(user).await.unwrap());
        assert!(!repo.delete(user).await.unwrap());
        assert!(repo.load(user).await.unwrap().is_none());
    }
}
