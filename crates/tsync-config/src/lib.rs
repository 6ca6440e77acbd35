//! # tsync-config
//!
//! Layered configuration loading and validation for tokensync using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`TSYNC_*` prefix, `__` as separator)
//! 2. External overrides passed to [`AuthConfig::load_with_env_overrides`]
//! 3. Project-level `.tokensync/config.toml`
//! 4. User-level `~/.config/tokensync/config.toml`
//! 5. Built-in defaults
//!
//! A loaded [`AuthConfig`] is inert until it passes [`AuthConfig::validate`],
//! which yields the immutable [`ValidatedConfig`] the synchronizer consumes.
//!
//! # Usage
//!
//! ```no_run
//! use tsync_config::{AuthConfig, ValidationEnv};
//!
//! let config = AuthConfig::load_with_dotenv().expect("config");
//! let validated = config
//!     .validate(&ValidationEnv::server_from_process())
//!     .expect("valid config");
//! println!("debug logging: {}", validated.config().debug);
//! ```

mod client;
mod cookies;
mod error;
mod validate;

pub use client::{AdminCredential, AdminInitConfig, ClientInitConfig};
pub use cookies::{CookieConfig, ONE_WEEK, ONE_WEEK_MS, SameSite, TWO_WEEKS, TWO_WEEKS_MS};
pub use error::ConfigError;
pub use validate::{
    AUTH_EMULATOR_HOST_ENV, ExecutionContext, SyncMode, ValidatedConfig, ValidationEnv,
    ValidationReport, validate,
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tsync_core::{TokenChangedHandler, TokenChangedHandlerRef};

const ENV_PREFIX: &str = "TSYNC_";
const REDACTED: &str = "hidden";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Forward debug lines to the log sink.
    #[serde(default)]
    pub debug: bool,

    /// Endpoint called on every token change for a signed-in user.
    #[serde(default)]
    pub login_api_endpoint: Option<String>,

    /// Endpoint called on every token change for a signed-out user.
    #[serde(default)]
    pub logout_api_endpoint: Option<String>,

    /// Replaces both endpoints. Code-only; never loaded from files or env.
    #[serde(skip)]
    pub token_changed_handler: Option<TokenChangedHandlerRef>,

    /// Where to send users who need to sign in.
    #[serde(default)]
    pub auth_page_url: Option<String>,

    /// Where to send signed-in users who land on an auth page.
    #[serde(default)]
    pub app_page_url: Option<String>,

    #[serde(default)]
    pub client: ClientInitConfig,

    #[serde(default)]
    pub admin: Option<AdminInitConfig>,

    /// Auth emulator address without scheme, e.g. `localhost:9099`.
    #[serde(default)]
    pub auth_emulator_host: Option<String>,

    #[serde(default)]
    pub cookies: CookieConfig,
}

impl AuthConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load configuration with externally supplied `TSYNC_*` pairs (for
    /// example from a secrets manager) layered beneath the process env.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_env_overrides(overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let mut figment = Self::file_figment();
        for (key, value) in overrides {
            let Some(path) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let path = path.to_ascii_lowercase().replace("__", ".");
            let Ok(value) = value.parse::<figment::value::Value>();
            figment = figment.merge(Serialized::default(&path, value));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        Self::file_figment().merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn file_figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".tokensync/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tokensync").join("config.toml"))
    }

    /// Install a token-changed handler in place of the login/logout endpoints.
    #[must_use]
    pub fn with_token_changed_handler(mut self, handler: impl TokenChangedHandler + 'static) -> Self {
        self.token_changed_handler = Some(TokenChangedHandlerRef::new(handler));
        self
    }

    /// Copy with signing keys and private credential material replaced by a
    /// placeholder, safe to log.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        redacted.cookies.keys = vec![REDACTED.to_string()];
        if let Some(admin) = redacted.admin.as_mut() {
            admin.credential.private_key = REDACTED.to_string();
            admin.credential.client_email = REDACTED.to_string();
        }
        redacted
    }

    pub(crate) fn login_endpoint(&self) -> Option<&str> {
        non_empty(self.login_api_endpoint.as_deref())
    }

    pub(crate) fn logout_endpoint(&self) -> Option<&str> {
        non_empty(self.logout_api_endpoint.as_deref())
    }

    pub(crate) fn emulator_host(&self) -> Option<&str> {
        non_empty(self.auth_emulator_host.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
