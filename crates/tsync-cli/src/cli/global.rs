use clap::ValueEnum;
use tsync_config::ValidationEnv;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Raw,
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
}

/// Execution context to validate the configuration for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum ContextArg {
    #[default]
    Browser,
    Server,
}

impl ContextArg {
    /// Server validation reads the emulator host mirror from the process env.
    #[must_use]
    pub fn validation_env(self) -> ValidationEnv {
        match self {
            Self::Browser => ValidationEnv::browser(),
            Self::Server => ValidationEnv::server_from_process(),
        }
    }
}
