//! The identity provider seam.
//!
//! A provider hands out a [`Subscription`]: a stream of [`TokenChange`]s plus
//! an [`UnsubscribeGuard`] that detaches the stream when dropped. Provider
//! implementations usually build both halves with [`change_channel`].

use std::fmt;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tsync_core::{IdTokenResult, ProviderError, ProviderUser};

use crate::error::SyncError;

/// Receives the outcome of one delivered change.
pub type Completion = oneshot::Receiver<Result<(), SyncError>>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Start delivering token changes, in the order they occur, until the
    /// returned subscription is dropped.
    fn subscribe(&self) -> Subscription;

    /// Resolve the extended claims (and token) for `user`.
    async fn id_token_result(&self, user: &ProviderUser) -> Result<IdTokenResult, ProviderError>;
}

/// One token-change notification. `None` means the user signed out.
pub struct TokenChange {
    user: Option<ProviderUser>,
    completion: Option<oneshot::Sender<Result<(), SyncError>>>,
}

impl TokenChange {
    #[must_use]
    pub const fn new(user: Option<ProviderUser>) -> Self {
        Self {
            user,
            completion: None,
        }
    }

    /// A change whose sync outcome is reported on the returned receiver.
    #[must_use]
    pub fn with_completion(user: Option<ProviderUser>) -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                user,
                completion: Some(tx),
            },
            rx,
        )
    }

    #[must_use]
    pub const fn user(&self) -> Option<&ProviderUser> {
        self.user.as_ref()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Option<ProviderUser>,
        Option<oneshot::Sender<Result<(), SyncError>>>,
    ) {
        (self.user, self.completion)
    }
}

impl fmt::Debug for TokenChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenChange")
            .field("user", &self.user)
            .field("awaited", &self.completion.is_some())
            .finish()
    }
}

/// Runs the provider's unsubscribe hook exactly once, on drop or on
/// [`UnsubscribeGuard::unsubscribe`].
pub struct UnsubscribeGuard(Option<Box<dyn FnOnce() + Send>>);

impl UnsubscribeGuard {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(unsubscribe)))
    }

    /// A guard for providers with nothing to detach.
    #[must_use]
    pub const fn noop() -> Self {
        Self(None)
    }

    pub fn unsubscribe(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(unsubscribe) = self.0.take() {
            unsubscribe();
        }
    }
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for UnsubscribeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnsubscribeGuard")
            .field(&self.0.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<TokenChange>,
    guard: UnsubscribeGuard,
}

impl Subscription {
    #[must_use]
    pub const fn new(events: mpsc::UnboundedReceiver<TokenChange>, guard: UnsubscribeGuard) -> Self {
        Self { events, guard }
    }

    /// Next change, or `None` once the provider side is gone.
    pub async fn recv(&mut self) -> Option<TokenChange> {
        self.events.recv().await
    }

    #[must_use]
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<TokenChange>, UnsubscribeGuard) {
        (self.events, self.guard)
    }
}

/// Provider-side sender of token changes.
#[derive(Debug, Clone)]
pub struct ChangeEmitter {
    tx: mpsc::UnboundedSender<TokenChange>,
}

impl ChangeEmitter {
    /// Deliver a change without waiting for its outcome.
    ///
    /// Returns `false` if nobody is subscribed anymore.
    pub fn notify(&self, user: Option<ProviderUser>) -> bool {
        self.tx.send(TokenChange::new(user)).is_ok()
    }

    /// Deliver a change and get a receiver for its sync outcome.
    ///
    /// If nobody is subscribed the receiver resolves with a `RecvError`.
    #[must_use]
    pub fn emit(&self, user: Option<ProviderUser>) -> Completion {
        let (change, completion) = TokenChange::with_completion(user);
        let _ = self.tx.send(change);
        completion
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a connected emitter/receiver pair for a provider implementation.
#[must_use]
pub fn change_channel() -> (ChangeEmitter, mpsc::UnboundedReceiver<TokenChange>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChangeEmitter { tx }, rx)
}
