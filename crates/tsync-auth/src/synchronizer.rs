//! Token-change synchronizer.
//!
//! Each delivered change starts a sync cycle:
//!
//! 1. a new generation is allocated the moment the change is delivered
//! 2. claims are resolved (signed-in users only)
//! 3. `initialized`, `user` and `claims` are written, `auth_request_completed` cleared
//! 4. the [`SyncProtocol`] action runs
//! 5. on success `auth_request_completed` is set
//!
//! A signed-out change skips step 2 and has step 3 applied during delivery.
//! Steps 3 and 5 only happen while the cycle's generation is still the latest
//! and the handle has not been disposed. A superseded cycle still finishes
//! its side effect, it just no longer touches state.
//!
//! Listeners are called with no lock held, one at a time, in commit order.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tsync_config::ValidatedConfig;
use tsync_core::{AuthState, Claims, DebugLog, ProviderUser};

use crate::error::SyncError;
use crate::protocol::SyncProtocol;
use crate::provider::{IdentityProvider, TokenChange, UnsubscribeGuard};
use crate::transport::HttpTransport;

type StateListener = Box<dyn Fn(&AuthState) + Send + Sync>;

struct Cell {
    state: AuthState,
    generation: u64,
    disposed: bool,
    /// Snapshots waiting for the listener, oldest first.
    pending: VecDeque<AuthState>,
    delivering: bool,
}

struct Shared {
    provider: Arc<dyn IdentityProvider>,
    protocol: SyncProtocol,
    debug_log: DebugLog,
    listener: StateListener,
    cell: Mutex<Cell>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Cell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the current state for the listener and deliver it outside the
    /// lock.
    ///
    /// Only one caller delivers at a time and it drains the whole queue, so
    /// notifications keep their order and a listener may call back into the
    /// handle.
    fn publish<'a>(&'a self, mut cell: MutexGuard<'a, Cell>) {
        let snapshot = cell.state.clone();
        cell.pending.push_back(snapshot);
        if cell.delivering {
            return;
        }
        cell.delivering = true;
        loop {
            let next = if cell.disposed {
                cell.pending.clear();
                None
            } else {
                cell.pending.pop_front()
            };
            let Some(state) = next else {
                cell.delivering = false;
                return;
            };
            drop(cell);
            (self.listener)(&state);
            cell = self.lock();
        }
    }

    /// Allocate the generation for a newly delivered change.
    ///
    /// A signed-out change has nothing to resolve, so its user and claims are
    /// recorded right away. `None` once disposed.
    fn begin_cycle(&self, user: Option<&ProviderUser>) -> Option<u64> {
        let mut cell = self.lock();
        if cell.disposed {
            return None;
        }
        cell.generation += 1;
        let generation = cell.generation;
        if user.is_none() {
            record_user(&mut cell.state, None, Claims::new());
            self.publish(cell);
        } else if cell.state.auth_request_completed {
            cell.state.auth_request_completed = false;
            self.publish(cell);
        }
        Some(generation)
    }

    /// Apply `update` and notify, unless `generation` was superseded or the
    /// synchronizer was disposed.
    fn commit(&self, generation: u64, update: impl FnOnce(&mut AuthState)) -> bool {
        let mut cell = self.lock();
        if cell.disposed || cell.generation != generation {
            tracing::trace!(
                generation,
                current = cell.generation,
                disposed = cell.disposed,
                "dropping stale auth state write"
            );
            return false;
        }
        update(&mut cell.state);
        self.publish(cell);
        true
    }

    fn mark_disposed(&self) -> bool {
        let mut cell = self.lock();
        cell.pending.clear();
        !std::mem::replace(&mut cell.disposed, true)
    }

    async fn run_cycle(&self, generation: u64, user: Option<ProviderUser>) -> Result<(), SyncError> {
        let claims = match &user {
            Some(provider_user) => {
                let resolved = self.provider.id_token_result(provider_user).await;
                self.debug_log.log_with("token changed", provider_user);
                let claims = match resolved {
                    Ok(result) => result.claims.unwrap_or_default(),
                    Err(error) => {
                        self.commit(generation, |state| {
                            record_user(state, user.clone(), Claims::new());
                        });
                        return Err(SyncError::Claims(error));
                    }
                };
                self.commit(generation, |state| {
                    record_user(state, user.clone(), claims.clone());
                });
                claims
            }
            // Recorded by `begin_cycle`.
            None => Claims::new(),
        };

        self.protocol.run(user.as_ref(), &claims).await?;

        self.commit(generation, |state| state.auth_request_completed = true);
        Ok(())
    }
}

fn record_user(state: &mut AuthState, user: Option<ProviderUser>, claims: Claims) {
    state.initialized = true;
    state.user = user;
    state.claims = claims;
    state.auth_request_completed = false;
}

/// Hand a cycle's outcome to whoever delivered the change, or log it when
/// nobody is waiting.
fn report(
    result: Result<(), SyncError>,
    completion: Option<oneshot::Sender<Result<(), SyncError>>>,
) {
    let unobserved = match completion {
        Some(tx) => tx.send(result).err(),
        None => Some(result),
    };
    if let Some(Err(error)) = unobserved {
        tracing::warn!(%error, "token change sync failed");
    }
}

async fn drive(shared: Arc<Shared>, mut events: mpsc::UnboundedReceiver<TokenChange>) {
    while let Some(change) = events.recv().await {
        let (user, completion) = change.into_parts();
        let Some(generation) = shared.begin_cycle(user.as_ref()) else {
            break;
        };
        tracing::debug!(generation, signed_in = user.is_some(), "token change delivered");

        let cycle = Arc::clone(&shared);
        tokio::spawn(async move {
            let result = cycle.run_cycle(generation, user).await;
            report(result, completion);
        });
    }
}

/// Bridges an identity provider's token-change stream to an [`AuthState`].
pub struct TokenChangeSynchronizer {
    provider: Arc<dyn IdentityProvider>,
    protocol: SyncProtocol,
    debug_log: DebugLog,
}

impl TokenChangeSynchronizer {
    pub fn new(
        config: &ValidatedConfig,
        provider: Arc<dyn IdentityProvider>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            provider,
            protocol: SyncProtocol::new(config.sync_mode(), transport),
            debug_log: config.debug_log(),
        }
    }

    /// Replace the debug log derived from the config's `debug` flag.
    #[must_use]
    pub fn with_debug_log(mut self, debug_log: DebugLog) -> Self {
        self.debug_log = debug_log;
        self
    }

    /// Subscribe to the provider and start syncing.
    ///
    /// `on_state_change` runs for every state change, in order, without any
    /// internal lock held; it may read the handle's state.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start<F>(self, on_state_change: F) -> SyncHandle
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let (events, guard) = self.provider.subscribe().into_parts();
        let shared = Arc::new(Shared {
            provider: self.provider,
            protocol: self.protocol.with_debug_log(self.debug_log.clone()),
            debug_log: self.debug_log,
            listener: Box::new(on_state_change),
            cell: Mutex::new(Cell {
                state: AuthState::default(),
                generation: 0,
                disposed: false,
                pending: VecDeque::new(),
                delivering: false,
            }),
        });
        let driver = tokio::spawn(drive(Arc::clone(&shared), events));

        SyncHandle {
            shared,
            guard: Some(guard),
            driver: Some(driver),
        }
    }
}

impl fmt::Debug for TokenChangeSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenChangeSynchronizer")
            .field("protocol", &self.protocol)
            .field("debug_log", &self.debug_log)
            .finish_non_exhaustive()
    }
}

/// A running synchronizer. Disposes itself on drop.
pub struct SyncHandle {
    shared: Arc<Shared>,
    guard: Option<UnsubscribeGuard>,
    driver: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.shared.lock().state.clone()
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    /// Run a cycle for a change delivered directly rather than through the
    /// subscription.
    ///
    /// The generation is taken when this is called, so a later call
    /// supersedes this one even if its future is polled first. A signed-out
    /// change is already recorded when this returns. After disposal the future resolves to `Ok(())` without doing anything.
    pub fn process(
        &self,
        user: Option<ProviderUser>,
    ) -> impl Future<Output = Result<(), SyncError>> + Send + 'static {
        let shared = Arc::clone(&self.shared);
        let generation = shared.begin_cycle(user.as_ref());
        async move {
            match generation {
                Some(generation) => shared.run_cycle(generation, user).await,
                None => Ok(()),
            }
        }
    }

    /// Stop syncing: no further state writes or notifications, the provider
    /// subscription is released and the event driver stops. Cycles already
    /// in flight still finish their side effect.
    pub fn dispose(&mut self) {
        if self.shared.mark_disposed() {
            tracing::debug!("token change synchronizer disposed");
        }
        if let Some(guard) = self.guard.take() {
            guard.unsubscribe();
        }
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHandle")
            .field("state", &self.state())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
