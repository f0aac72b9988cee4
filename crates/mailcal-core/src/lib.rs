//! # mailcal-core
//!
//! E-mail triage and e-mail to calendar reconciliation.
//!
//! The crate is organized around [`Reconciler`], which pulls unread mail
//! through a [`MailSource`], asks an [`EmailAnalyzer`] what each message is,
//! and checks a [`CalendarService`] plus a [`DismissalStore`] so that events
//! already handled are not offered again.
//!
//! ## Modules
//!
//! - [`triage`]: domain model (classification, event details, run report)
//! - [`correlation`]: the payload stored in calendar event descriptions that
//!   links an event back to its source e-mail
//! - [`window`]: fetch windows and timezone-aware day bounds
//! - [`service`]: collaborator traits and their Google/Gemini bindings
//! - [`reconcile`]: the pipeline itself
//! - [`credentials`]: per-user Google token storage and renewal
//! - [`dismissal`]: `SQLite`-backed dismissal store

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod correlation;
pub mod credentials;
pub mod dismissal;
mod error;
pub mod reconcile;
pub mod service;
pub mod triage;
pub mod window;

pub use correlation::CorrelationPayload;
pub use credentials::{CredentialManager, CredentialRepository, StoredCredentials};
pub use dismissal::DismissalRepository;
pub use error::{CredentialError, Error, Result, ValidationError};
pub use reconcile::{ReconcileOptions, Reconciler};
pub use service::{
    CalendarService, DismissalStore, EmailAnalyzer, GeminiAnalyzer, GmailSource, GoogleCalendar,
    MailSource,
};
pub use triage::{
    CalendarEvent, Category, Classification, EventDetails, EventExtraction, GeneralSummary,
    PendingEvent, RawMessage, RunReport, SummarizedEmail, UserId,
};
pub use window::FetchWindow;
