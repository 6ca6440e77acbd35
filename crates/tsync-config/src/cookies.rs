//! Auth cookie policy.
//!
//! The cookies themselves are written by the server; this crate only carries
//! and validates their options. Defaults are the strict end of every knob.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Default cookie lifetime, in milliseconds.
pub const ONE_WEEK_MS: u64 = 7 * MILLIS_PER_DAY;

/// Longest cookie lifetime accepted on the server, in milliseconds.
/// Matches the identity provider's limit for session cookies.
pub const TWO_WEEKS_MS: u64 = 14 * MILLIS_PER_DAY;

pub const ONE_WEEK: Duration = Duration::from_millis(ONE_WEEK_MS);
pub const TWO_WEEKS: Duration = Duration::from_millis(TWO_WEEKS_MS);

const fn default_true() -> bool {
    true
}

const fn default_max_age_ms() -> u64 {
    ONE_WEEK_MS
}

fn default_path() -> String {
    String::from("/")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CookieConfig {
    /// Base name for the auth cookies. Required on the server.
    #[serde(default)]
    pub name: Option<String>,

    /// Signing keys. Server-only; must never reach the browser.
    #[serde(default)]
    pub keys: Vec<String>,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default = "default_true")]
    pub http_only: bool,

    /// Cookie lifetime in milliseconds.
    #[serde(default = "default_max_age_ms")]
    pub max_age_ms: u64,

    #[serde(default = "default_true")]
    pub overwrite: bool,

    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default)]
    pub same_site: SameSite,

    #[serde(default = "default_true")]
    pub secure: bool,

    #[serde(default = "default_true")]
    pub signed: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: None,
            keys: Vec::new(),
            domain: None,
            http_only: default_true(),
            max_age_ms: default_max_age_ms(),
            overwrite: default_true(),
            path: default_path(),
            same_site: SameSite::default(),
            secure: default_true(),
            signed: default_true(),
        }
    }
}

impl CookieConfig {
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    /// Whether at least one non-empty signing key is configured.
    #[must_use]
    pub fn keys_defined(&self) -> bool {
        self.keys.iter().any(|key| !key.is_empty())
    }

    #[must_use]
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }
}
