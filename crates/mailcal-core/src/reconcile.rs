//! E-mail to calendar reconciliation.
//!
//! [`Reconciler::run`] turns a batch of unread mail into summarized general
//! messages and pending events. No state of its own is kept between runs:
//! an event counts as already handled only if its source e-mail id can be
//! recovered from a calendar event description on the event's day, or if
//! the user dismissed it. Re-running therefore converges on the calendar as
//! the source of truth, even across restarts.
//!
//! Failure containment:
//!
//! | Failure | Effect |
//! |---|---|
//! | expired/missing token | run fails immediately |
//! | token without mail or calendar scope | run fails immediately |
//! | timezone lookup | UTC is used |
//! | mail listing | run fails |
//! | dismissal store | run fails |
//! | classification of one message | message treated as not important |
//! | extraction of one message | message dropped, logged |
//! | calendar day lookup | day treated as empty, so the event may be offered again |

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use mailcal_oauth::Token;
use mailcal_oauth::provider::{SCOPE_CALENDAR, SCOPE_GMAIL_READONLY};
use tracing::{debug, info, warn};

use crate::correlation::{CorrelationPayload, email_id_of};
use crate::error::{CredentialError, Error, Result, ValidationError};
use crate::service::{CalendarService, DismissalStore, EmailAnalyzer, MailSource};
use crate::triage::{
    CalendarEvent, Category, Classification, EventDetails, PendingEvent, RawMessage, RunReport,
    SummarizedEmail, UserId,
};
use crate::window::{FetchWindow, resolve_timezone};

/// Scopes a token must carry for both mail reads and calendar writes.
const REQUIRED_SCOPES: [&str; 2] = [SCOPE_GMAIL_READONLY, SCOPE_CALENDAR];

/// Tunables for [`Reconciler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Messages analyzed concurrently within one run.
    pub concurrency: usize,
    /// Page size for a calendar day lookup. Busier days are truncated.
    pub day_lookup_limit: u32,
    /// Messages fetched when re-deriving an event for [`Reconciler::commit`].
    pub commit_fetch_cap: u32,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            day_lookup_limit: 10,
            commit_fetch_cap: 50,
        }
    }
}

/// Per-message result of the fan-out phase.
enum Outcome {
    Dropped,
    Summarized(SummarizedEmail),
    Event(PendingEvent),
}

/// The reconciliation pipeline.
#[derive(Clone)]
pub struct Reconciler {
    mail: Arc<dyn MailSource>,
    calendar: Arc<dyn CalendarService>,
    analyzer: Arc<dyn EmailAnalyzer>,
    dismissals: Arc<dyn DismissalStore>,
    options: ReconcileOptions,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a pipeline with default options.
    #[must_use]
    pub fn new(
        mail: Arc<dyn MailSource>,
        calendar: Arc<dyn CalendarService>,
        analyzer: Arc<dyn EmailAnalyzer>,
        dismissals: Arc<dyn DismissalStore>,
    ) -> Self {
        Self {
            mail,
            calendar,
            analyzer,
            dismissals,
            options: ReconcileOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub const fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Fetches up to `cap` unread messages in `window` and sorts them into
    /// summarized messages and pending events.
    ///
    /// `total_emails_processed` is the number of messages fetched, whether or
    /// not they produced output.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidCap`] / [`ValidationError::InvalidWindow`] for bad input
    /// - [`Error::Credential`] if the token is unusable or rejected
    /// - [`Error::Upstream`] if the mail listing fails
    /// - storage errors from the dismissal store
    ///
    /// Failures for individual messages never fail the run.
    pub async fn run(
        &self,
        user: UserId,
        credentials: &Token,
        window: FetchWindow,
        cap: u32,
    ) -> Result<RunReport> {
        if cap == 0 {
            return Err(ValidationError::InvalidCap.into());
        }
        window.validate()?;
        ensure_usable(credentials)?;

        let timezone = self.timezone(credentials).await;
        let messages = self.mail.list_unread(credentials, window, cap).await?;
        let total = messages.len();
        info!(
            %user,
            total,
            %timezone,
            after = %window.after,
            before = %window.before,
            "Fetched unread messages"
        );

        if messages.is_empty() {
            return Ok(RunReport::default());
        }

        let dismissed = self.dismissals.list(user).await?;
        let reference = local_now(timezone);

        let triage: Vec<_> = messages
            .iter()
            .map(|message| self.triage(message, reference))
            .collect();
        let outcomes: Vec<Outcome> = stream::iter(triage)
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await;

        let days: BTreeSet<NaiveDate> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Event(event) => Some(event.content.start.date()),
                _ => None,
            })
            .collect();
        let lookups: Vec<_> = days
            .into_iter()
            .map(|day| self.day_ids(credentials, day, timezone))
            .collect();
        let calendared: HashMap<NaiveDate, HashSet<String>> = stream::iter(lookups)
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        let mut report = RunReport {
            total_emails_processed: total,
            ..RunReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Dropped => {}
                Outcome::Summarized(summary) => report.summarized_emails.push(summary),
                Outcome::Event(event) => {
                    let on_calendar = calendared
                        .get(&event.content.start.date())
                        .is_some_and(|ids| ids.contains(&event.email_id));
                    if on_calendar || dismissed.contains(&event.email_id) {
                        debug!(
                            email_id = %event.email_id,
                            on_calendar,
                            "Event already handled"
                        );
                        continue;
                    }
                    report.pending_events.push(event);
                }
            }
        }

        info!(
            %user,
            total,
            summarized = report.summarized_emails.len(),
            pending = report.pending_events.len(),
            "Reconciliation run complete"
        );
        Ok(report)
    }

    /// Source e-mail ids recovered from events on the local `day`.
    ///
    /// Events without a decodable payload are ignored. A failed lookup yields
    /// an empty set.
    pub async fn existing_ids_for_day(
        &self,
        credentials: &Token,
        day: NaiveDate,
        timezone: Tz,
    ) -> HashSet<String> {
        match self.day_events(credentials, day, timezone).await {
            Some(events) => events
                .iter()
                .filter_map(|event| email_id_of(event.description.as_deref()))
                .collect(),
            None => HashSet::new(),
        }
    }

    /// Re-derives the event for `email_id` from the current mail and puts it
    /// on the calendar.
    ///
    /// If an event for this e-mail already exists on that day (for example a
    /// concurrent commit won), that event is returned instead.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the e-mail is not in `window` or is no longer
    ///   an important event
    /// - [`Error::Validation`] if the extracted times are unusable
    /// - [`Error::Upstream`] if the analyzer or the calendar insert fails
    /// - [`Error::Credential`] if the token is unusable or rejected
    pub async fn commit(
        &self,
        credentials: &Token,
        window: FetchWindow,
        email_id: &str,
    ) -> Result<CalendarEvent> {
        if email_id.trim().is_empty() {
            return Err(ValidationError::EmptyEmailId.into());
        }
        window.validate()?;
        ensure_usable(credentials)?;

        let timezone = self.timezone(credentials).await;
        let message = self
            .mail
            .list_unread(credentials, window, self.options.commit_fetch_cap)
            .await?
            .into_iter()
            .find(|message| message.id == email_id)
            .ok_or_else(|| {
                Error::NotFound(format!("email {email_id} is not in the current window"))
            })?;

        let classification = self.analyzer.categorize(&message.text).await?;
        if !classification.is_event() {
            return Err(Error::NotFound(format!(
                "email {email_id} is no longer an important event"
            )));
        }

        let details = self.event_details(&message, local_now(timezone)).await?;

        if let Some(existing) = self
            .day_events(credentials, details.start.date(), timezone)
            .await
            .and_then(|events| {
                events.into_iter().find(|event| {
                    email_id_of(event.description.as_deref()).as_deref() == Some(email_id)
                })
            })
        {
            info!(email_id, event_id = %existing.id, "Event already on calendar");
            return Ok(existing);
        }

        let payload = CorrelationPayload::new(email_id, details.summary.clone());
        let created = self
            .calendar
            .insert(credentials, &details, timezone, &payload)
            .await?;
        info!(email_id, event_id = %created.id, start = %details.start, "Added event to calendar");
        Ok(created)
    }

    /// Never offer `email_id` again. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or the store fails.
    pub async fn dismiss(&self, user: UserId, email_id: &str) -> Result<()> {
        if email_id.trim().is_empty() {
            return Err(ValidationError::EmptyEmailId.into());
        }
        self.dismissals.add(user, email_id).await?;
        debug!(%user, email_id, "Dismissed event");
        Ok(())
    }

    /// Offer `email_id` again. Removing an id that is not dismissed is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn undismiss(&self, user: UserId, email_id: &str) -> Result<()> {
        self.dismissals.remove(user, email_id).await?;
        debug!(%user, email_id, "Restored dismissed event");
        Ok(())
    }

    /// Dismissed ids for `user`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_dismissed(&self, user: UserId) -> Result<HashSet<String>> {
        self.dismissals.list(user).await
    }

    async fn day_ids(
        &self,
        credentials: &Token,
        day: NaiveDate,
        timezone: Tz,
    ) -> (NaiveDate, HashSet<String>) {
        (
            day,
            self.existing_ids_for_day(credentials, day, timezone).await,
        )
    }

    async fn timezone(&self, credentials: &Token) -> Tz {
        match self.calendar.timezone(credentials).await {
            Ok(name) => resolve_timezone(&name),
            Err(e) => {
                warn!(error = %e, "Calendar timezone unavailable, using UTC");
                Tz::UTC
            }
        }
    }

    async fn day_events(
        &self,
        credentials: &Token,
        day: NaiveDate,
        timezone: Tz,
    ) -> Option<Vec<CalendarEvent>> {
        match self
            .calendar
            .list_day(credentials, day, timezone, self.options.day_lookup_limit)
            .await
        {
            Ok(events) => Some(events),
            Err(e) => {
                warn!(%day, error = %e, "Calendar lookup failed, treating day as empty");
                None
            }
        }
    }

    async fn triage(&self, message: &RawMessage, reference: NaiveDateTime) -> Outcome {
        let classification = match self.analyzer.categorize(&message.text).await {
            Ok(classification) => classification,
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Classification failed, treating as not important");
                Classification::not_important()
            }
        };

        if !classification.importance {
            return Outcome::Dropped;
        }

        match classification.category {
            Category::General => match self.analyzer.extract_general(&message.text).await {
                Ok(summary) => Outcome::Summarized(SummarizedEmail::new(message, summary)),
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "Summary failed, dropping message");
                    Outcome::Dropped
                }
            },
            Category::Event => match self.event_details(message, reference).await {
                Ok(details) => Outcome::Event(PendingEvent::new(message, details)),
                Err(e) => {
                    warn!(message_id = %message.id, error = %e, "Event extraction failed, dropping message");
                    Outcome::Dropped
                }
            },
        }
    }

    async fn event_details(
        &self,
        message: &RawMessage,
        reference: NaiveDateTime,
    ) -> Result<EventDetails> {
        let extraction = self
            .analyzer
            .extract_event(&message.text, reference)
            .await?;
        Ok(EventDetails::from_extraction(extraction)?)
    }
}

fn ensure_usable(credentials: &Token) -> Result<()> {
    if credentials.access_token.is_empty() {
        return Err(CredentialError::NotConnected.into());
    }
    if credentials.is_expired() {
        return Err(CredentialError::Expired.into());
    }
    let required = REQUIRED_SCOPES.map(String::from);
    if !credentials.has_scopes(&required) {
        let missing: Vec<&str> = REQUIRED_SCOPES
            .into_iter()
            .filter(|scope| !credentials.has_scopes(&[(*scope).to_string()]))
            .collect();
        return Err(CredentialError::MissingScope(missing.join(" ")).into());
    }
    Ok(())
}

fn local_now(timezone: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&timezone).naive_local()
}
