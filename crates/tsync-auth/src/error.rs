use std::fmt;

use thiserror::Error;
use tsync_core::ProviderError;

use crate::transport::TransportError;

/// Which built-in endpoint a request went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Logout,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::Logout => f.write_str("logout"),
        }
    }
}

/// Failure of one sync cycle. Returned to whoever delivered the change.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The provider's token-result accessor failed.
    #[error("failed to resolve token claims: {0}")]
    Claims(#[source] ProviderError),

    /// The user's ID token could not be fetched for the login request.
    #[error("failed to get ID token: {0}")]
    Token(#[source] ProviderError),

    /// The endpoint answered with a non-success status.
    #[error("Received {status} response from {endpoint} API endpoint: {body}")]
    Endpoint {
        endpoint: Endpoint,
        status: u16,
        /// Parsed response body, `{}` when it was not JSON.
        body: serde_json::Value,
    },

    /// No response at all; carries the transport's error unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The custom token-changed handler failed.
    #[error(transparent)]
    Handler(anyhow::Error),
}
