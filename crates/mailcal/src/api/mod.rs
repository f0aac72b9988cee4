//! HTTP API.
//!
//! A thin layer over [`Reconciler`] and [`CredentialManager`]. Every route
//! except `/` and the OAuth callback needs a bearer token from the
//! configured token table.

mod auth;
mod error;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mailcal_core::{
    CredentialManager, Error, FetchWindow, Reconciler, RunReport, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

pub use auth::CurrentUser;
pub use error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// The pipeline.
    pub reconciler: Reconciler,
    /// Linked Google accounts.
    pub credentials: CredentialManager,
    /// Bearer token to user.
    pub users: Arc<HashMap<String, UserId>>,
    /// Client application base URL.
    pub frontend_url: Arc<str>,
    /// Count used when a request names none.
    pub default_email_count: u32,
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/auth/google", get(google_auth))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/google/unlink", delete(google_unlink))
        .route("/google/status", get(google_status))
        .route("/fetch-emails", post(fetch_emails))
        .route("/dashboard-data", get(dashboard_data))
        .route("/add-to-calendar/{email_id}", post(add_to_calendar))
        .route("/ignore-event/{email_id}", delete(ignore_event))
        .route("/ignored-events", get(ignored_events))
        .route("/ignored-events/{email_id}", delete(restore_event))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "mailcal is running" }))
}

async fn google_auth(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let url = state.credentials.authorization_url(user)?;
    Ok(Json(json!({ "authorization_url": url })))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Google's consent redirect. The user comes from the OAuth `state`, so this
/// route is not behind the bearer token.
// TODO: sign the state value; a bare user id lets a third party complete a
// link for someone else's account.
async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match link_account(&state, params).await {
        Ok(user) => {
            info!(%user, "Google account linked");
            Redirect::to(&format!("{}/?google_auth=success", state.frontend_url))
        }
        Err(message) => {
            warn!(error = %message, "Google account linking failed");
            Redirect::to(&callback_error_url(&state.frontend_url, &message))
        }
    }
}

async fn link_account(state: &AppState, params: CallbackParams) -> Result<UserId, String> {
    if let Some(error) = params.error {
        return Err(error);
    }
    let code = params.code.ok_or("missing authorization code")?;
    let user = params
        .state
        .and_then(|s| s.parse::<i64>().ok())
        .map(UserId::new)
        .ok_or("missing or invalid state")?;

    state
        .credentials
        .connect(user, &code)
        .await
        .map_err(|e| e.to_string())?;
    Ok(user)
}

fn callback_error_url(frontend_url: &str, message: &str) -> String {
    url::Url::parse_with_params(
        &format!("{frontend_url}/dashboard"),
        &[("google_auth", "error"), ("message", message)],
    )
    .map_or_else(|_| frontend_url.to_string(), String::from)
}

async fn google_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let connected = state.credentials.is_connected(user).await?;
    let google_email = if connected {
        state.credentials.google_email(user).await?
    } else {
        None
    };
    Ok(Json(json!({ "connected": connected, "google_email": google_email })))
}

async fn google_unlink(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    state.credentials.unlink(user).await?;
    Ok(Json(json!({ "message": "Google account unlinked successfully" })))
}

#[derive(Debug, Default, Deserialize)]
struct FetchRequest {
    #[serde(default)]
    email_count: Option<u32>,
}

async fn fetch_emails(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<FetchRequest>,
) -> ApiResult<Json<RunReport>> {
    let count = request.email_count.unwrap_or(state.default_email_count);
    let token = state.credentials.valid_token(user).await?;
    let report = state
        .reconciler
        .run(user, &token, FetchWindow::around_now(), count)
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Serialize)]
struct DashboardData {
    #[serde(flatten)]
    report: RunReport,
    google_connected: bool,
}

/// Same as `/fetch-emails` with the default count. A user without usable
/// credentials gets an empty dashboard instead of an error.
async fn dashboard_data(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<DashboardData>> {
    let report = match dashboard_report(&state, user).await {
        Ok(report) => report,
        Err(Error::Credential(e)) => {
            info!(%user, reason = %e, "Dashboard requested without usable credentials");
            return Ok(Json(DashboardData {
                report: RunReport::default(),
                google_connected: false,
            }));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(DashboardData {
        report,
        google_connected: true,
    }))
}

async fn dashboard_report(state: &AppState, user: UserId) -> mailcal_core::Result<RunReport> {
    let token = state.credentials.valid_token(user).await?;
    state
        .reconciler
        .run(user, &token, FetchWindow::around_now(), state.default_email_count)
        .await
}

async fn add_to_calendar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(email_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let token = state.credentials.valid_token(user).await?;
    let event = state
        .reconciler
        .commit(&token, FetchWindow::around_now(), &email_id)
        .await?;
    Ok(Json(json!({
        "message": "Event added to calendar successfully",
        "calendar_link": event.link,
        "event_id": event.id,
    })))
}

async fn ignore_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(email_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.reconciler.dismiss(user, &email_id).await?;
    Ok(Json(json!({ "message": "Event ignored successfully" })))
}

async fn ignored_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Value>> {
    let mut ids: Vec<String> = state
        .reconciler
        .list_dismissed(user)
        .await?
        .into_iter()
        .collect();
    ids.sort_unstable();
    Ok(Json(json!({ "ignored_event_ids": ids })))
}

async fn restore_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(email_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.reconciler.undismiss(user, &email_id).await?;
    Ok(Json(json!({ "message": "Event removed from ignored list" })))
}
