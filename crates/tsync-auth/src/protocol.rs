//! One outbound sync action per token change.

use std::fmt;
use std::sync::Arc;

use tsync_config::SyncMode;
use tsync_core::{AuthUser, Claims, DebugLog, ProviderUser, TokenChangedHandlerRef};

use crate::error::{Endpoint, SyncError};
use crate::transport::{HttpTransport, SyncRequest, TransportResponse};

enum Action {
    Endpoints {
        login: String,
        logout: String,
        transport: Arc<dyn HttpTransport>,
    },
    Handler(TokenChangedHandlerRef),
}

/// Performs the session-sync side effect for a sync cycle.
///
/// Never retries; the first failure is the cycle's failure.
pub struct SyncProtocol {
    action: Action,
    debug_log: DebugLog,
}

impl SyncProtocol {
    /// Build the protocol for a validated sync mode. `transport` is unused in
    /// handler mode.
    pub fn new(mode: &SyncMode, transport: Arc<dyn HttpTransport>) -> Self {
        let action = match mode {
            SyncMode::Endpoints { login, logout } => Action::Endpoints {
                login: login.clone(),
                logout: logout.clone(),
                transport,
            },
            SyncMode::Handler(handler) => Action::Handler(handler.clone()),
        };
        Self {
            action,
            debug_log: DebugLog::disabled(),
        }
    }

    #[must_use]
    pub fn with_debug_log(mut self, debug_log: DebugLog) -> Self {
        self.debug_log = debug_log;
        self
    }

    #[must_use]
    pub const fn uses_handler(&self) -> bool {
        matches!(self.action, Action::Handler(_))
    }

    /// Sync the session for `user` (`None` = signed out).
    ///
    /// # Errors
    ///
    /// `SyncError::Token` / `Endpoint` / `Transport` on the HTTP paths,
    /// `SyncError::Handler` when the custom handler fails.
    pub async fn run(&self, user: Option<&ProviderUser>, claims: &Claims) -> Result<(), SyncError> {
        self.debug_log.log("[tokensync] starting auth API request");

        match &self.action {
            Action::Handler(handler) => {
                let auth_user = AuthUser::from_provider_user(user, claims);
                handler.call(auth_user).await.map_err(SyncError::Handler)?;
            }
            Action::Endpoints {
                login: login_url,
                logout: logout_url,
                transport,
            } => match user {
                Some(user) => login(transport.as_ref(), login_url, user).await?,
                None => logout(transport.as_ref(), logout_url).await?,
            },
        }

        self.debug_log.log("[tokensync] completed auth API request");
        Ok(())
    }
}

impl fmt::Debug for SyncProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.action {
            Action::Endpoints { login, logout, .. } => format!("endpoints({login}, {logout})"),
            Action::Handler(_) => "handler".to_string(),
        };
        f.debug_struct("SyncProtocol")
            .field("mode", &mode)
            .field("debug_log", &self.debug_log)
            .finish()
    }
}

/// POST to the login endpoint with the user's current ID token.
///
/// # Errors
///
/// `SyncError::Token` if the token cannot be fetched, `SyncError::Transport`
/// if no response arrives, `SyncError::Endpoint` on a non-success status.
pub async fn login(
    transport: &dyn HttpTransport,
    endpoint: &str,
    user: &ProviderUser,
) -> Result<(), SyncError> {
    let token = user.id_token(false).await.map_err(SyncError::Token)?;
    let response = transport.post(SyncRequest::login(endpoint, token)).await?;
    ensure_success(Endpoint::Login, &response)
}

/// POST to the logout endpoint.
///
/// # Errors
///
/// `SyncError::Transport` if no response arrives, `SyncError::Endpoint` on a
/// non-success status.
pub async fn logout(transport: &dyn HttpTransport, endpoint: &str) -> Result<(), SyncError> {
    let response = transport.post(SyncRequest::logout(endpoint)).await?;
    ensure_success(Endpoint::Logout, &response)
}

fn ensure_success(endpoint: Endpoint, response: &TransportResponse) -> Result<(), SyncError> {
    if response.is_success() {
        return Ok(());
    }
    Err(SyncError::Endpoint {
        endpoint,
        status: response.status,
        body: response.json_or_empty(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::transport::TransportError;

    struct CannedTransport {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<SyncRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<SyncRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn post(&self, request: SyncRequest) -> Result<TransportResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(TransportResponse::new(self.status, self.body))
        }
    }

    fn endpoints() -> SyncMode {
        SyncMode::Endpoints {
            login: "https://example.com/api/login".into(),
            logout: "https://example.com/api/logout".into(),
        }
    }

    #[tokio::test]
    async fn signed_in_user_posts_token_to_login() {
        let transport = CannedTransport::new(200, "");
        let protocol = SyncProtocol::new(&endpoints(), transport.clone());
        let user = ProviderUser::with_static_token("user_1", "my-id-token");

        protocol.run(Some(&user), &Claims::new()).await.unwrap();

        assert_eq!(
            transport.seen(),
            vec![SyncRequest::login("https://example.com/api/login", "my-id-token")]
        );
    }

    #[tokio::test]
    async fn signed_out_posts_to_logout() {
        let transport = CannedTransport::new(200, "");
        let protocol = SyncProtocol::new(&endpoints(), transport.clone());

        protocol.run(None, &Claims::new()).await.unwrap();

        assert_eq!(
            transport.seen(),
            vec![SyncRequest::logout("https://example.com/api/logout")]
        );
    }

    #[tokio::test]
    async fn non_success_status_becomes_endpoint_error() {
        let transport = CannedTransport::new(401, r#"{"error":"expired"}"#);
        let protocol = SyncProtocol::new(&endpoints(), transport);
        let user = ProviderUser::with_static_token("user_1", "tok");

        let error = protocol.run(Some(&user), &Claims::new()).await.unwrap_err();
        match error {
            SyncError::Endpoint {
                endpoint,
                status,
                body,
            } => {
                assert_eq!(endpoint, Endpoint::Login);
                assert_eq!(status, 401);
                assert_eq!(body, json!({"error": "expired"}));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn handler_mode_skips_http() {
        let transport = CannedTransport::new(200, "");
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let handler = TokenChangedHandlerRef::new(move |user: AuthUser| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(user);
                anyhow::Ok(())
            }
        });
        let protocol = SyncProtocol::new(&SyncMode::Handler(handler), transport.clone());
        assert!(protocol.uses_handler());

        let mut claims = Claims::new();
        claims.insert("role".into(), json!("admin"));
        let user = ProviderUser::with_static_token("user_1", "tok").with_email("a@example.com", true);
        protocol.run(Some(&user), &claims).await.unwrap();

        assert!(transport.seen().is_empty());
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].id.as_deref(), Some("user_1"));
        assert_eq!(received[0].email.as_deref(), Some("a@example.com"));
        assert_eq!(received[0].claims, claims);
    }

    #[tokio::test]
    async fn handler_failure_is_reported() {
        let handler = TokenChangedHandlerRef::new(|_user: AuthUser| async {
            Err::<(), _>(anyhow::anyhow!("session store offline"))
        });
        let protocol = SyncProtocol::new(&SyncMode::Handler(handler), CannedTransport::new(200, ""));

        let error = protocol.run(None, &Claims::new()).await.unwrap_err();
        assert!(matches!(error, SyncError::Handler(_)));
        assert_eq!(error.to_string(), "session store offline");
    }
}
