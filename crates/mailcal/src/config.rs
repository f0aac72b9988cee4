//! Service configuration.
//!
//! Read from a JSON file, then overridden from the environment. Every field
//! has a default, so a missing file is not an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use mailcal_core::{ReconcileOptions, UserId};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "MAILCAL_CONFIG";

/// Google OAuth client registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Where Google sends the user back to after consent.
    pub redirect_uri: String,
}

/// Gemini access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: mailcal_gemini::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address.
    pub bind_address: String,
    /// `SQLite` database file.
    pub database_path: PathBuf,
    /// Client application the OAuth callback redirects to.
    pub frontend_url: String,
    /// Google OAuth client.
    pub google: GoogleConfig,
    /// Gemini access.
    pub gemini: GeminiConfig,
    /// Bearer token to user id.
    pub api_tokens: HashMap<String, i64>,
    /// Messages fetched by a dashboard refresh or a request without a count.
    pub default_email_count: u32,
    /// Messages fetched when adding an event to the calendar.
    pub commit_fetch_cap: u32,
    /// Messages analyzed concurrently.
    pub concurrency: usize,
    /// Calendar events read per day when checking for duplicates.
    pub day_lookup_limit: u32,
    /// Timeout for every outbound HTTP request.
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let options = ReconcileOptions::default();
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            database_path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mailcal")
                .join("mailcal.db"),
            frontend_url: "http://localhost:3000".to_string(),
            google: GoogleConfig::default(),
            gemini: GeminiConfig::default(),
            api_tokens: HashMap::new(),
            default_email_count: 10,
            commit_fetch_cap: options.commit_fetch_cap,
            concurrency: options.concurrency,
            day_lookup_limit: options.day_lookup_limit,
            http_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Loads the file named by `MAILCAL_CONFIG` (or the default location),
    /// applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if validation fails.
    pub async fn load() -> anyhow::Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let path = config_path(lookup);
        let mut config = Self::from_file(&path).await?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Overrides fields from environment variables, read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };
        set(&mut self.google.client_id, "GOOGLE_CLIENT_ID");
        set(&mut self.google.client_secret, "GOOGLE_CLIENT_SECRET");
        set(&mut self.google.redirect_uri, "GOOGLE_REDIRECT_URI");
        set(&mut self.gemini.api_key, "GEMINI_API_KEY");
        set(&mut self.gemini.model, "GEMINI_MODEL");
        set(&mut self.bind_address, "MAILCAL_BIND");
        if let Some(path) = lookup("MAILCAL_DATABASE").filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
    }

    /// Rejects settings the service cannot run with.
    ///
    /// Missing Google or Gemini credentials only produce warnings: the
    /// service still starts and reports upstream failures per request.
    ///
    /// # Errors
    ///
    /// Returns an error if a count or the concurrency is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrency == 0 {
            bail!("concurrency must be greater than zero");
        }
        if self.default_email_count == 0 {
            bail!("default_email_count must be greater than zero");
        }
        if self.commit_fetch_cap == 0 {
            bail!("commit_fetch_cap must be greater than zero");
        }
        if self.google.client_id.is_empty() {
            tracing::warn!("GOOGLE_CLIENT_ID is not set, account linking will fail");
        }
        if self.gemini.api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY is not set, analysis will fail");
        }
        if self.api_tokens.is_empty() {
            tracing::warn!("No api_tokens configured, every request will be unauthorized");
        }
        Ok(())
    }

    /// Pipeline tunables.
    #[must_use]
    pub const fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            concurrency: self.concurrency,
            day_lookup_limit: self.day_lookup_limit,
            commit_fetch_cap: self.commit_fetch_cap,
        }
    }

    /// Outbound request timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Bearer token table keyed by token.
    #[must_use]
    pub fn users(&self) -> HashMap<String, UserId> {
        self.api_tokens
            .iter()
            .map(|(token, id)| (token.clone(), UserId::new(*id)))
            .collect()
    }
}

/// `$MAILCAL_CONFIG`, or `config.json` under the user config directory.
pub fn config_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(
            || {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("mailcal")
                    .join("config.json")
            },
            PathBuf::from,
        )
}
