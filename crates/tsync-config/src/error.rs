//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// One or more validation rules failed. Every violation is listed.
    #[error("Invalid tokensync options: {}", errors.join(" "))]
    Invalid { errors: Vec<String> },
}

impl ConfigError {
    /// Individual violation messages (empty for figment errors).
    #[must_use]
    pub fn violations(&self) -> &[String] {
        match self {
            Self::Invalid { errors } => errors,
            Self::Figment(_) => &[],
        }
    }
}
