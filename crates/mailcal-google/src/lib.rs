//! # mailcal-google
//!
//! Thin REST clients for the three Google surfaces the reconciliation
//! pipeline talks to:
//!
//! - [`GmailClient`]: unread primary-inbox listing with MIME payload
//!   flattening to plain text
//! - [`CalendarClient`]: primary calendar timezone, per-window event listing
//!   and event insertion
//! - [`UserInfoClient`]: e-mail address of the linked account
//!
//! Every client takes a bearer access token per call, so one client can be
//! shared across users. Transient failures (408, 429, 5xx, connect errors)
//! are retried with bounded exponential backoff; see [`RetryPolicy`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod calendar;
mod error;
pub mod gmail;
mod retry;
mod userinfo;

pub use calendar::{CalendarClient, Event, EventTime, NewEvent};
pub use error::{Error, Result};
pub use gmail::{GmailClient, Message, MessageQuery};
pub use retry::RetryPolicy;
pub use userinfo::UserInfoClient;

use std::time::Duration;

/// Default per-request timeout for Google API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}
