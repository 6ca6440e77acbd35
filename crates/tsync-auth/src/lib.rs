//! # tsync-auth
//!
//! Keeps the server-side session in step with the identity provider.
//!
//! The [`TokenChangeSynchronizer`] subscribes to the provider's token-change
//! stream, tracks an [`AuthState`](tsync_core::AuthState) and runs exactly
//! one [`SyncProtocol`] action per change: a POST to the login or logout
//! endpoint through an [`HttpTransport`], or a caller-supplied
//! [`TokenChangedHandler`](tsync_core::TokenChangedHandler).
//!
//! Overlapping changes are resolved with a generation counter: only the most
//! recent change may write state, and nothing is written once the returned
//! [`SyncHandle`] has been disposed.

pub mod error;
pub mod protocol;
pub mod provider;
pub mod synchronizer;
pub mod transport;

pub use error::{Endpoint, SyncError};
pub use protocol::SyncProtocol;
pub use provider::{
    ChangeEmitter, Completion, IdentityProvider, Subscription, TokenChange, UnsubscribeGuard,
    change_channel,
};
pub use synchronizer::{SyncHandle, TokenChangeSynchronizer};
pub use transport::{HttpTransport, ReqwestTransport, SyncRequest, TransportError, TransportResponse};
