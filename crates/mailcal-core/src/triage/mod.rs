//! Triage domain model: what the analyzer says about a message and what a
//! run hands back to its caller.
//!
//! A run sorts every fetched message into one of three outcomes:
//!
//! 1. not important: dropped without output
//! 2. important and general: a [`SummarizedEmail`]
//! 3. important and event: a [`PendingEvent`], unless the event is already
//!    on the calendar or the user dismissed it
//!
//! Output items carry a fresh random `id` per run. The `email_id` is the
//! stable key clients use for `commit` and `dismiss`.

mod model;

pub use model::{
    CalendarEvent, Category, Classification, EventDetails, EventExtraction, GeneralSummary,
    PendingEvent, RawMessage, RunReport, SummarizedEmail, UserId, parse_local_time,
};
