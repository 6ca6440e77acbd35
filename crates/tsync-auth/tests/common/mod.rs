//! Shared fakes for the synchronizer integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tsync_auth::{
    ChangeEmitter, HttpTransport, IdentityProvider, Subscription, SyncRequest, TokenChange,
    TransportError, TransportResponse, UnsubscribeGuard, change_channel,
};
use tsync_config::{AuthConfig, ClientInitConfig, ValidatedConfig, ValidationEnv};
use tsync_core::{
    AuthState, AuthUser, Claims, IdTokenResult, LogSink, ProviderError, ProviderUser,
};

pub const LOGIN_URL: &str = "https://example.com/api/login";
pub const LOGOUT_URL: &str = "https://example.com/api/logout";

pub fn endpoint_config() -> ValidatedConfig {
    AuthConfig {
        login_api_endpoint: Some(LOGIN_URL.into()),
        logout_api_endpoint: Some(LOGOUT_URL.into()),
        client: ClientInitConfig {
            api_key: "AIza-test".into(),
            ..ClientInitConfig::default()
        },
        ..AuthConfig::default()
    }
    .validate(&ValidationEnv::browser())
    .expect("endpoint config is valid")
}

/// A handler config whose handler records every `AuthUser` it receives.
pub fn recording_handler_config() -> (ValidatedConfig, Arc<Mutex<Vec<AuthUser>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let config = AuthConfig {
        client: ClientInitConfig {
            api_key: "AIza-test".into(),
            ..ClientInitConfig::default()
        },
        ..AuthConfig::default()
    }
    .with_token_changed_handler(move |user: AuthUser| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(user);
            anyhow::Ok(())
        }
    })
    .validate(&ValidationEnv::browser())
    .expect("handler config is valid");
    (config, received)
}

pub fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        other => panic!("claims must be an object, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// Identity provider
// ---------------------------------------------------------------------------

pub struct FakeProvider {
    emitter: ChangeEmitter,
    events: Mutex<Option<mpsc::UnboundedReceiver<TokenChange>>>,
    unsubscribed: Arc<AtomicBool>,
    noop_unsubscribe: bool,
    claims: Mutex<HashMap<String, Result<Claims, ProviderError>>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Self::build(false)
    }

    /// A provider whose unsubscribe hook does nothing.
    pub fn with_noop_unsubscribe() -> Arc<Self> {
        Self::build(true)
    }

    fn build(noop_unsubscribe: bool) -> Arc<Self> {
        let (emitter, events) = change_channel();
        Arc::new(Self {
            emitter,
            events: Mutex::new(Some(events)),
            unsubscribed: Arc::new(AtomicBool::new(false)),
            noop_unsubscribe,
            claims: Mutex::new(HashMap::new()),
        })
    }

    pub fn emitter(&self) -> ChangeEmitter {
        self.emitter.clone()
    }

    pub fn set_claims(&self, uid: &str, claims: Claims) {
        self.claims
            .lock()
            .unwrap()
            .insert(uid.to_string(), Ok(claims));
    }

    pub fn fail_claims(&self, uid: &str, error: ProviderError) {
        self.claims
            .lock()
            .unwrap()
            .insert(uid.to_string(), Err(error));
    }

    pub fn unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn subscribe(&self) -> Subscription {
        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .expect("fake provider supports a single subscription");
        if self.noop_unsubscribe {
            return Subscription::new(events, UnsubscribeGuard::noop());
        }
        let flag = Arc::clone(&self.unsubscribed);
        Subscription::new(
            events,
            UnsubscribeGuard::new(move || flag.store(true, Ordering::SeqCst)),
        )
    }

    async fn id_token_result(&self, user: &ProviderUser) -> Result<IdTokenResult, ProviderError> {
        let claims = match self.claims.lock().unwrap().get(&user.uid) {
            Some(Ok(claims)) => Some(claims.clone()),
            Some(Err(error)) => return Err(error.clone()),
            None => None,
        };
        Ok(IdTokenResult {
            token: "provider-token".into(),
            claims,
        })
    }
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

type Reply = Result<TransportResponse, TransportError>;

enum Queued {
    Now(Reply),
    Gated(oneshot::Receiver<Reply>),
}

/// Records requests and answers them from a queue; 200 once the queue is
/// empty.
pub struct FakeTransport {
    requests: Mutex<Vec<SyncRequest>>,
    replies: Mutex<VecDeque<Queued>>,
    seen_tx: mpsc::UnboundedSender<SyncRequest>,
    seen_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<SyncRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        let (seen_tx, seen_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            seen_tx,
            seen_rx: tokio::sync::Mutex::new(seen_rx),
        })
    }

    pub fn reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(Queued::Now(reply));
    }

    pub fn reply_status(&self, status: u16, body: &str) {
        self.reply(Ok(TransportResponse::new(status, body)));
    }

    /// Queue a reply that is held back until the returned sender fires.
    pub fn reply_later(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Queued::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<SyncRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until the next request reaches the transport.
    pub async fn next_request(&self) -> SyncRequest {
        tokio::time::timeout(Duration::from_secs(5), self.seen_rx.lock().await.recv())
            .await
            .expect("request within 5s")
            .expect("transport alive")
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn post(&self, request: SyncRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let queued = self.replies.lock().unwrap().pop_front();
        let _ = self.seen_tx.send(request);
        match queued {
            None => Ok(TransportResponse::new(200, "")),
            Some(Queued::Now(reply)) => reply,
            Some(Queued::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::Other("reply dropped".into()))),
        }
    }
}

pub fn ok() -> Reply {
    Ok(TransportResponse::new(200, ""))
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// Collects every state the synchronizer publishes.
#[derive(Clone, Default)]
pub struct StateLog(Arc<Mutex<Vec<AuthState>>>);

impl StateLog {
    pub fn listener(&self) -> impl Fn(&AuthState) + Send + Sync + 'static {
        let states = Arc::clone(&self.0);
        move |state: &AuthState| states.lock().unwrap().push(state.clone())
    }

    pub fn all(&self) -> Vec<AuthState> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<AuthState> {
        self.0.lock().unwrap().last().cloned()
    }
}

#[derive(Default)]
pub struct LogRecorder(Mutex<Vec<(String, Option<Value>)>>);

impl LogRecorder {
    pub fn messages(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    pub fn entries(&self) -> Vec<(String, Option<Value>)> {
        self.0.lock().unwrap().clone()
    }
}

impl LogSink for LogRecorder {
    fn log(&self, message: &str, payload: Option<&Value>) {
        self.0
            .lock()
            .unwrap()
            .push((message.to_string(), payload.cloned()));
    }
}
