//! # mailcal-oauth
//!
//! `OAuth2` support for the Google account that backs mail triage and
//! calendar reconciliation.
//!
//! ## Features
//!
//! - **Authorization Code Flow**: consent URL building and code exchange
//! - **Token management**: refresh with refresh-token preservation, expiry checks
//! - **Provider configuration**: Google with Gmail read-only and Calendar scopes
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailcal_oauth::{AuthorizationCodeFlow, OAuthClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OAuthClient::new("your_client_id", Provider::google()?)
//!         .with_client_secret("your_secret")
//!         .with_redirect_uri("http://localhost:8000/auth/google/callback");
//!
//!     let flow = AuthorizationCodeFlow::new(client);
//!     let auth_url = flow.authorization_url(None, Some("user-42"))?;
//!     println!("Visit: {auth_url}");
//!
//!     let token = flow.exchange_code("code_from_redirect", None).await?;
//!     if token.is_expired() {
//!         let token = flow.client().refresh_token(&token).await?;
//!         println!("Refreshed: {}", token.access_token);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient};
pub use provider::Provider;
pub use token::Token;
