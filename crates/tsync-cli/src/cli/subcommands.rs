use clap::{Args, Subcommand};

use crate::cli::global::ContextArg;

/// Configuration commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ConfigCommands {
    /// Load and validate, print the report. Exits non-zero when invalid.
    Check(ContextArgs),
    /// Print the merged configuration with secrets redacted.
    Show,
}

/// Session sync commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SessionCommands {
    /// POST an ID token to the login endpoint.
    Login(SessionLoginArgs),
    /// POST to the logout endpoint.
    Logout(ContextArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ContextArgs {
    #[arg(long, value_enum, default_value_t = ContextArg::Browser)]
    pub context: ContextArg,
}

#[derive(Clone, Debug, Args)]
pub struct SessionLoginArgs {
    /// ID token sent verbatim in the Authorization header.
    #[arg(long)]
    pub token: String,
    /// User ID reported in debug output.
    #[arg(long, default_value = "cli")]
    pub uid: String,
    #[command(flatten)]
    pub context: ContextArgs,
}
