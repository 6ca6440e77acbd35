//! Errors raised across the identity provider seam.
//!
//! Sync-cycle failures (`SyncError`) and configuration failures
//! (`ConfigError`) live in their own crates; this module only covers what a
//! provider implementation can report back.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not produce an ID token (or its extended claims).
    #[error("{0}")]
    Token(String),

    /// Signing the user out of the provider failed.
    #[error("sign-out failed: {0}")]
    SignOut(String),

    #[error("{0}")]
    Other(String),
}
