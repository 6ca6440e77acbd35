use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tsync_auth::{Endpoint, ReqwestTransport, SyncProtocol};
use tsync_config::{AuthConfig, SyncMode, ValidatedConfig};
use tsync_core::{Claims, ProviderUser};

use crate::cli::{ContextArg, GlobalFlags, SessionCommands};
use crate::output::output;

#[derive(Serialize)]
struct SessionResponse {
    endpoint: String,
    url: String,
    completed: bool,
}

pub async fn handle(action: SessionCommands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        SessionCommands::Login(args) => {
            let validated = load_validated(args.context.context)?;
            let url = endpoint_url(&validated, Endpoint::Login)?;
            let user = ProviderUser::with_static_token(args.uid, args.token);
            sync(&validated, Some(&user)).await?;
            output(
                &SessionResponse {
                    endpoint: Endpoint::Login.to_string(),
                    url,
                    completed: true,
                },
                flags.format,
            )
        }
        SessionCommands::Logout(args) => {
            let validated = load_validated(args.context)?;
            let url = endpoint_url(&validated, Endpoint::Logout)?;
            sync(&validated, None).await?;
            output(
                &SessionResponse {
                    endpoint: Endpoint::Logout.to_string(),
                    url,
                    completed: true,
                },
                flags.format,
            )
        }
    }
}

fn load_validated(context: ContextArg) -> anyhow::Result<ValidatedConfig> {
    let config = AuthConfig::load_with_dotenv().context("failed to load tokensync configuration")?;
    Ok(config.validate(&context.validation_env())?)
}

fn endpoint_url(validated: &ValidatedConfig, endpoint: Endpoint) -> anyhow::Result<String> {
    match validated.sync_mode() {
        SyncMode::Endpoints { login, logout } => Ok(match endpoint {
            Endpoint::Login => login.clone(),
            Endpoint::Logout => logout.clone(),
        }),
        SyncMode::Handler(_) => {
            anyhow::bail!("a token_changed_handler is configured; there are no endpoints to call")
        }
    }
}

async fn sync(validated: &ValidatedConfig, user: Option<&ProviderUser>) -> anyhow::Result<()> {
    let transport = Arc::new(ReqwestTransport::new()?);
    let protocol =
        SyncProtocol::new(validated.sync_mode(), transport).with_debug_log(validated.debug_log());
    protocol.run(user, &Claims::new()).await?;
    Ok(())
}
