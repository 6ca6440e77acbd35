//! # tsync-core
//!
//! Core types shared across all tokensync crates.
//!
//! - [`AuthState`]: the signed-in state tracked by the synchronizer
//! - [`ProviderUser`] / [`UserSession`]: the identity provider's user and its token accessor
//! - [`AuthUser`]: the fully-formed identity handed to custom token-change handlers
//! - [`TokenChangedHandler`]: caller-supplied replacement for the login/logout endpoints
//! - [`DebugLog`]: on/off debug side channel
//! - [`ProviderError`]: failures raised by the identity provider seam

pub mod auth_user;
pub mod debug_log;
pub mod errors;
pub mod handler;
pub mod provider;
pub mod state;

pub use auth_user::AuthUser;
pub use debug_log::{DebugLog, LogSink, TracingSink};
pub use errors::ProviderError;
pub use handler::{TokenChangedHandler, TokenChangedHandlerRef};
pub use provider::{IdTokenResult, ProviderUser, StaticSession, UserSession};
pub use state::{AuthState, Claims};
