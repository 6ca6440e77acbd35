use anyhow::Context;
use tsync_config::{AuthConfig, validate};

use crate::cli::{ConfigCommands, GlobalFlags};
use crate::output::output;

pub fn handle(action: &ConfigCommands, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = AuthConfig::load_with_dotenv().context("failed to load tokensync configuration")?;

    match action {
        ConfigCommands::Check(args) => {
            let report = validate(&config, &args.context.validation_env());
            tracing::debug!(valid = report.is_valid, errors = report.errors.len(), "config checked");
            output(&report, flags.format)?;
            if !report.is_valid {
                anyhow::bail!("configuration is invalid ({} problems)", report.errors.len());
            }
            Ok(())
        }
        ConfigCommands::Show => output(&config.redacted(), flags.format),
    }
}
