//! Dismissed event e-mails.
//!
//! A dismissal is a bare `(user, email_id)` pair. It never expires; it goes
//! away only when the user un-dismisses it.

mod repository;

pub use repository::DismissalRepository;
