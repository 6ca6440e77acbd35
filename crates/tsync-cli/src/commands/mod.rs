mod config;
mod session;

use crate::cli::{Commands, GlobalFlags};

/// Route a parsed command to its handler.
pub async fn dispatch(command: Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => config::handle(&action, flags),
        Commands::Session { action } => session::handle(action, flags).await,
    }
}
