//! `mailcal` - e-mail triage and calendar reconciliation service
//!
//! Reads unread Gmail, asks Gemini what matters, and offers detected events
//! for the user's Google Calendar over a small HTTP API.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod api;
mod config;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use mailcal_core::{
    CredentialManager, CredentialRepository, DismissalRepository, GeminiAnalyzer, GmailSource,
    GoogleCalendar, Reconciler,
};
use mailcal_gemini::GeminiClient;
use mailcal_google::{CalendarClient, GmailClient, UserInfoClient};
use mailcal_oauth::{AuthorizationCodeFlow, OAuthClient, Provider};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AppState;
use config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mailcal=info,mailcal_core=info,mailcal_google=info,mailcal_gemini=info,mailcal_oauth=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting mailcal");

    let config = AppConfig::load().await?;
    let state = build_state(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    info!(bind = %config.bind_address, "HTTP server started");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("mailcal stopped");
    Ok(())
}

/// Opens the database and wires every collaborator.
async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    if let Some(dir) = config.database_path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let url = format!("sqlite:{}?mode=rwc", config.database_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    info!(path = %config.database_path.display(), "Database ready");

    let credentials = CredentialRepository::with_pool(pool.clone()).await?;
    let dismissals = DismissalRepository::with_pool(pool).await?;

    let timeout = config.http_timeout();
    let oauth = OAuthClient::new(&config.google.client_id, Provider::google()?)
        .with_client_secret(&config.google.client_secret)
        .with_redirect_uri(&config.google.redirect_uri);
    let credentials = CredentialManager::new(
        credentials,
        AuthorizationCodeFlow::new(oauth),
        UserInfoClient::new().with_timeout(timeout),
    );

    let gemini = GeminiClient::new(&config.gemini.api_key)
        .with_model(&config.gemini.model)
        .with_timeout(timeout);
    info!(model = gemini.model(), "Using Gemini model");

    let reconciler = Reconciler::new(
        Arc::new(GmailSource::new(GmailClient::new().with_timeout(timeout))),
        Arc::new(GoogleCalendar::new(CalendarClient::new().with_timeout(timeout))),
        Arc::new(GeminiAnalyzer::new(gemini)),
        Arc::new(dismissals),
    )
    .with_options(config.reconcile_options());

    let users: HashMap<_, _> = config.users();
    info!(users = users.len(), "API tokens loaded");

    Ok(AppState {
        reconciler,
        credentials,
        users: Arc::new(users),
        frontend_url: Arc::from(config.frontend_url.trim_end_matches('/')),
        default_email_count: config.default_email_count,
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
