//! Fully-formed identity value handed to token-change handlers.
//!
//! An [`AuthUser`] always exists, also for a signed-out user: its fields are
//! then empty, `get_id_token` yields `None` and `sign_out` does nothing.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::provider::{ProviderUser, UserSession};
use crate::state::Claims;

#[derive(Clone)]
enum TokenAccess {
    Session(Arc<dyn UserSession>),
    Serialized(Option<String>),
    SignedOut,
}

#[derive(Clone)]
pub struct AuthUser {
    pub id: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub claims: Claims,
    /// Whether the value was built after the client SDK reported a user state.
    pub client_initialized: bool,
    access: TokenAccess,
}

/// Wire form produced by [`AuthUser::serialize`].
#[derive(Debug, Serialize, Deserialize)]
struct SerializedAuthUser {
    id: Option<String>,
    claims: Claims,
    email: Option<String>,
    email_verified: bool,
    phone_number: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    client_initialized: bool,
    #[serde(default)]
    token: Option<String>,
}

impl AuthUser {
    /// Build the identity for a provider user plus its resolved claims.
    ///
    /// `None` produces the signed-out identity.
    #[must_use]
    pub fn from_provider_user(user: Option<&ProviderUser>, claims: &Claims) -> Self {
        let Some(user) = user else {
            return Self::signed_out(true);
        };
        Self {
            id: Some(user.uid.clone()),
            email: user.email.clone(),
            email_verified: user.email_verified,
            phone_number: user.phone_number.clone(),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
            claims: claims.clone(),
            client_initialized: true,
            access: TokenAccess::Session(user.session()),
        }
    }

    #[must_use]
    pub fn signed_out(client_initialized: bool) -> Self {
        Self {
            id: None,
            email: None,
            email_verified: false,
            phone_number: None,
            display_name: None,
            photo_url: None,
            claims: Claims::new(),
            client_initialized,
            access: TokenAccess::SignedOut,
        }
    }

    /// Rebuild a value produced by [`AuthUser::serialize`].
    ///
    /// The result has no live session: `get_id_token` returns the serialized
    /// token and `sign_out` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if `serialized` is not a serialized user.
    pub fn from_serialized(serialized: &str) -> Result<Self, serde_json::Error> {
        let wire: SerializedAuthUser = serde_json::from_str(serialized)?;
        Ok(Self {
            id: wire.id,
            email: wire.email,
            email_verified: wire.email_verified,
            phone_number: wire.phone_number,
            display_name: wire.display_name,
            photo_url: wire.photo_url,
            claims: wire.claims,
            client_initialized: wire.client_initialized,
            access: TokenAccess::Serialized(wire.token),
        })
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.id.is_some()
    }

    /// Current ID token, or `None` for a signed-out user.
    ///
    /// # Errors
    ///
    /// Propagates the provider session's token error.
    pub async fn get_id_token(&self) -> Result<Option<String>, ProviderError> {
        match &self.access {
            TokenAccess::Session(session) => session.id_token(false).await.map(Some),
            TokenAccess::Serialized(token) => Ok(token.clone()),
            TokenAccess::SignedOut => Ok(None),
        }
    }

    /// Sign the user out of the identity provider.
    ///
    /// # Errors
    ///
    /// Propagates the provider session's sign-out error.
    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        match &self.access {
            TokenAccess::Session(session) => session.sign_out().await,
            TokenAccess::Serialized(_) | TokenAccess::SignedOut => Ok(()),
        }
    }

    /// Serialize to a JSON string.
    ///
    /// A token is only embedded when the value itself came from a serialized
    /// form that carried one; live sessions are never written out.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if a claim value fails to serialize.
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        let token = match &self.access {
            TokenAccess::Serialized(token) => token.clone(),
            TokenAccess::Session(_) | TokenAccess::SignedOut => None,
        };
        serde_json::to_string(&SerializedAuthUser {
            id: self.id.clone(),
            claims: self.claims.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
            phone_number: self.phone_number.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            client_initialized: self.client_initialized,
            token,
        })
    }
}

impl PartialEq for AuthUser {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.email == other.email
            && self.email_verified == other.email_verified
            && self.phone_number == other.phone_number
            && self.display_name == other.display_name
            && self.photo_url == other.photo_url
            && self.claims == other.claims
            && self.client_initialized == other.client_initialized
    }
}

impl fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("email_verified", &self.email_verified)
            .field("claims", &self.claims)
            .field("client_initialized", &self.client_initialized)
            .finish_non_exhaustive()
    }
}
