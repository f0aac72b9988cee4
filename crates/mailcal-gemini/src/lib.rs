//! # mailcal-gemini
//!
//! Gemini `generateContent` client that turns e-mail text into typed
//! results by forcing a single function call and decoding its arguments.
//!
//! Three calls are exposed:
//!
//! - [`GeminiClient::categorize`]: importance flag plus `general`/`event`
//! - [`GeminiClient::summarize_event`]: event name, type, start, end, summary
//! - [`GeminiClient::summarize_general`]: free-text summary
//!
//! ```ignore
//! let client = GeminiClient::new(api_key).with_model("gemini-2.5-flash");
//! let verdict = client.categorize(&email_text).await?;
//! if verdict.importance && verdict.category == "event" {
//!     let event = client.summarize_event(&email_text, chrono::Local::now().naive_local()).await?;
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod functions;
mod types;

pub use client::{DEFAULT_MODEL, GeminiClient};
pub use error::{Error, Result};
pub use functions::{Categorization, EventSummary, GeneralSummary};
