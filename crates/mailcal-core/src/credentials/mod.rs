//! Linked Google accounts.
//!
//! Each user links one Google account through the authorization code flow.
//! The resulting tokens are stored in `SQLite` and renewed on demand by
//! [`CredentialManager::valid_token`], so callers of the pipeline always
//! hold a token that was valid when handed out.

mod manager;
mod repository;

pub use manager::CredentialManager;
pub use repository::{CredentialRepository, StoredCredentials};
