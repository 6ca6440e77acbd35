use serde::Serialize;

use crate::provider::ProviderUser;

/// Extended token attributes beyond the core identity fields.
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// The signed-in state tracked by one synchronizer.
///
/// Created as [`AuthState::default`] when the synchronizer starts and mutated
/// only by it. Observers see it through the state-change callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthState {
    /// `None` means signed out.
    pub user: Option<ProviderUser>,
    /// Empty when signed out or when the provider returned no claims.
    pub claims: Claims,
    /// Set by the first delivered change event, including a signed-out one.
    pub initialized: bool,
    /// True once the current cycle's sync action resolved successfully.
    pub auth_request_completed: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// UID of the signed-in user, if any.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.uid.as_str())
    }
}
