//! Configuration validation.
//!
//! Every rule is evaluated; all violations are collected in order so a
//! misconfigured app sees the full list at once. The browser and server
//! contexts are passed in explicitly through [`ValidationEnv`].

use std::time::Duration;

use serde::Serialize;
use tsync_core::{DebugLog, TokenChangedHandlerRef};

use crate::AuthConfig;
use crate::cookies::TWO_WEEKS;
use crate::error::ConfigError;

/// Server-side mirror of the emulator host setting, read by the admin SDK.
pub const AUTH_EMULATOR_HOST_ENV: &str = "AUTH_EMULATOR_HOST";

/// Where the validated configuration will run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    Browser,
    Server,
}

/// Inputs to validation that do not come from the config itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationEnv {
    pub context: ExecutionContext,
    /// Value of [`AUTH_EMULATOR_HOST_ENV`] as seen by the server.
    pub auth_emulator_host_env: Option<String>,
    /// Upper bound for `cookies.max_age_ms`, enforced on the server.
    pub max_cookie_age: Duration,
}

impl ValidationEnv {
    #[must_use]
    pub const fn browser() -> Self {
        Self {
            context: ExecutionContext::Browser,
            auth_emulator_host_env: None,
            max_cookie_age: TWO_WEEKS,
        }
    }

    #[must_use]
    pub const fn server(auth_emulator_host_env: Option<String>) -> Self {
        Self {
            context: ExecutionContext::Server,
            auth_emulator_host_env,
            max_cookie_age: TWO_WEEKS,
        }
    }

    /// Server context with the emulator mirror read from the process env.
    #[must_use]
    pub fn server_from_process() -> Self {
        Self::server(std::env::var(AUTH_EMULATOR_HOST_ENV).ok())
    }

    #[must_use]
    pub const fn with_max_cookie_age(mut self, max_cookie_age: Duration) -> Self {
        self.max_cookie_age = max_cookie_age;
        self
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// How each token change is pushed to the server.
#[derive(Debug, Clone)]
pub enum SyncMode {
    Endpoints { login: String, logout: String },
    Handler(TokenChangedHandlerRef),
}

impl SyncMode {
    fn from_config(config: &AuthConfig) -> Option<Self> {
        if let Some(handler) = &config.token_changed_handler {
            return Some(Self::Handler(handler.clone()));
        }
        Some(Self::Endpoints {
            login: config.login_endpoint()?.to_string(),
            logout: config.logout_endpoint()?.to_string(),
        })
    }
}

/// A configuration that passed validation for one execution context.
///
/// Immutable; pass it (or clones of it) to whatever needs it.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    config: AuthConfig,
    context: ExecutionContext,
    sync_mode: SyncMode,
}

impl ValidatedConfig {
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub const fn context(&self) -> ExecutionContext {
        self.context
    }

    #[must_use]
    pub const fn sync_mode(&self) -> &SyncMode {
        &self.sync_mode
    }

    /// Debug log honoring the `debug` flag.
    #[must_use]
    pub fn debug_log(&self) -> DebugLog {
        DebugLog::new(self.config.debug)
    }
}

impl AuthConfig {
    /// Validate for the given environment and freeze the result.
    ///
    /// The redacted configuration is sent to the debug log first.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` listing every violated rule.
    pub fn validate(self, env: &ValidationEnv) -> Result<ValidatedConfig, ConfigError> {
        let debug_log = DebugLog::new(self.debug);
        self.validate_with_log(env, &debug_log)
    }

    /// [`Self::validate`] with an explicit debug log.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` listing every violated rule.
    pub fn validate_with_log(
        self,
        env: &ValidationEnv,
        debug_log: &DebugLog,
    ) -> Result<ValidatedConfig, ConfigError> {
        debug_log.log_with("Setting config with provided value:", &self.redacted());

        let report = validate(&self, env);
        if !report.is_valid {
            return Err(ConfigError::Invalid {
                errors: report.errors,
            });
        }
        let Some(sync_mode) = SyncMode::from_config(&self) else {
            return Err(ConfigError::Invalid {
                errors: vec!["No sync mode could be derived from the configuration.".into()],
            });
        };
        Ok(ValidatedConfig {
            config: self,
            context: env.context,
            sync_mode,
        })
    }
}

/// Check `config` against every rule for `env`.
#[must_use]
pub fn validate(config: &AuthConfig, env: &ValidationEnv) -> ValidationReport {
    let mut errors = Vec::new();

    if config.token_changed_handler.is_some() {
        if config.login_endpoint().is_some() {
            errors.push(
                r#"The "login_api_endpoint" setting should not be set if you are using a "token_changed_handler"."#
                    .to_string(),
            );
        }
        if config.logout_endpoint().is_some() {
            errors.push(
                r#"The "logout_api_endpoint" setting should not be set if you are using a "token_changed_handler"."#
                    .to_string(),
            );
        }
    } else {
        if config.login_endpoint().is_none() {
            errors.push(r#"The "login_api_endpoint" setting is required."#.to_string());
        }
        if config.logout_endpoint().is_none() {
            errors.push(r#"The "logout_api_endpoint" setting is required."#.to_string());
        }
    }

    if !config.client.has_api_key() {
        errors.push(r#"The "client.api_key" value is required."#.to_string());
    }

    if config
        .emulator_host()
        .is_some_and(|host| host.starts_with("http"))
    {
        errors.push(
            r#"The "auth_emulator_host" setting should be set without a prefix (e.g., localhost:9099)."#
                .to_string(),
        );
    }

    match env.context {
        ExecutionContext::Browser => check_browser(config, &mut errors),
        ExecutionContext::Server => check_server(config, env, &mut errors),
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn check_browser(config: &AuthConfig, errors: &mut Vec<String>) {
    if config
        .admin
        .as_ref()
        .is_some_and(crate::AdminInitConfig::has_private_key)
    {
        errors.push(
            r#"The "admin.credential.private_key" setting should not be available on the client side."#
                .to_string(),
        );
    }
    if config.cookies.keys_defined() {
        errors.push(
            r#"The "cookies.keys" setting should not be available on the client side."#.to_string(),
        );
    }
}

fn check_server(config: &AuthConfig, env: &ValidationEnv, errors: &mut Vec<String>) {
    if !config.cookies.has_name() {
        errors.push(r#"The "cookies.name" setting is required on the server side."#.to_string());
    }
    if config.cookies.signed && !config.cookies.keys_defined() {
        errors.push(
            r#"The "cookies.keys" setting must be set if "cookies.signed" is true."#.to_string(),
        );
    }

    if let Some(host) = config.emulator_host() {
        match env.auth_emulator_host_env.as_deref() {
            None | Some("") => errors.push(format!(
                r#"The "{AUTH_EMULATOR_HOST_ENV}" environment variable should be set if you are using the "auth_emulator_host" option."#
            )),
            Some(mirror) if mirror != host => errors.push(format!(
                r#"The "{AUTH_EMULATOR_HOST_ENV}" environment variable should be the same as the host set in the config."#
            )),
            Some(_) => {}
        }
    }

    if u128::from(config.cookies.max_age_ms) > env.max_cookie_age.as_millis() {
        errors.push(format!(
            r#"The "cookies.max_age_ms" setting must not exceed {} ms."#,
            env.max_cookie_age.as_millis()
        ));
    }
}
