use clap::{Parser, Subcommand};

pub mod global;
pub mod subcommands;

pub use global::{ContextArg, GlobalFlags, OutputFormat};
pub use subcommands::{ConfigCommands, SessionCommands};

/// Top-level CLI parser for the `tsync` binary.
#[derive(Debug, Parser)]
#[command(name = "tsync", version, about = "tokensync - keep server sessions in step with ID tokens")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only in the log)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Inspect and validate the merged configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Run a single login or logout request against the configured endpoints.
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, Commands, ConfigCommands, ContextArg, OutputFormat, SessionCommands};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_check_defaults_to_browser_context() {
        let cli = Cli::try_parse_from(["tsync", "config", "check"]).expect("cli should parse");
        match cli.command {
            Commands::Config {
                action: ConfigCommands::Check(args),
            } => assert_eq!(args.context, ContextArg::Browser),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_check_accepts_server_context() {
        let cli = Cli::try_parse_from(["tsync", "config", "check", "--context", "server"])
            .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigCommands::Check(ref args)
            } if args.context == ContextArg::Server
        ));
    }

    #[test]
    fn session_login_requires_token() {
        assert!(Cli::try_parse_from(["tsync", "session", "login"]).is_err());

        let cli = Cli::try_parse_from(["tsync", "session", "login", "--token", "abc"])
            .expect("cli should parse");
        match cli.command {
            Commands::Session {
                action: SessionCommands::Login(args),
            } => {
                assert_eq!(args.token, "abc");
                assert_eq!(args.uid, "cli");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["tsync", "session", "logout", "--format", "raw", "--quiet"])
            .expect("cli should parse");
        let flags = cli.global_flags();
        assert_eq!(flags.format, OutputFormat::Raw);
        assert!(flags.quiet);
        assert!(!flags.verbose);
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        assert!(Cli::try_parse_from(["tsync", "--format", "xml", "config", "show"]).is_err());
    }
}
