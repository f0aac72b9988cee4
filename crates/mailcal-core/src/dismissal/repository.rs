//! `SQLite` storage for dismissals.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::Result;
use crate::service::DismissalStore;
use crate::triage::UserId;

/// Repository for dismissed e-mail ids.
#[derive(Debug, Clone)]
pub struct DismissalRepository {
    pool: SqlitePool,
}

impl DismissalRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
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
            CREATE TABLE IF NOT EXISTS ignored_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                email_id TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, email_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Dismissed ids for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, user: UserId) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT email_id FROM ignored_events WHERE user_id = ?")
            .bind(user.0)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("email_id")).collect())
    }

    /// Dismiss an id. Dismissing twice keeps a single row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn add(&self, user: UserId, email_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO ignored_events (user_id, email_id) VALUES (?, ?)")
            .bind(user.0)
            .bind(email_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove a dismissal. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn remove(&self, user: UserId, email_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ignored_events WHERE user_id = ? AND email_id = ?")
            .bind(user.0)
            .bind(email_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether an id is dismissed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn contains(&self, user: UserId, email_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM ignored_events WHERE user_id = ? AND email_id = ?")
            .bind(user.0)
            .bind(email_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl DismissalStore for DismissalRepository {
    async fn list(&self, user: UserId) -> Result<HashSet<String>> {
        Self::list(self, user).await
    }

    async fn add(&self, user: UserId, email_id: &str) -> Result<()> {
        Self::add(self, user, email_id).await
    }

    async fn remove(&self, user: UserId, email_id: &str) -> Result<()> {
        Self::remove(self, user, email_id).await.map(|_| ())
    }

    async fn contains(&self, user: UserId, email_id: &str) -> Result<bool> {
        Self::contains(self, user, email_id).await
    }
}
