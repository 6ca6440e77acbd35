//! The identity provider's view of a signed-in user.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::ProviderError;
use crate::state::Claims;

/// Token accessor and session control for one provider user.
///
/// Implemented by the identity-provider integration; the synchronizer only
/// ever asks for a token (login path) and [`AuthUser`](crate::AuthUser)
/// forwards sign-out requests here.
#[async_trait]
pub trait UserSession: Send + Sync {
    /// Return the user's current ID token, refreshing it first when
    /// `force_refresh` is set or the cached one has expired.
    async fn id_token(&self, force_refresh: bool) -> Result<String, ProviderError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// A session backed by a fixed token. Signing out is a no-op.
///
/// Used where a token was obtained out of band (CLI, server-rendered pages).
#[derive(Debug, Clone)]
pub struct StaticSession {
    token: String,
}

impl StaticSession {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl UserSession for StaticSession {
    async fn id_token(&self, _force_refresh: bool) -> Result<String, ProviderError> {
        Ok(self.token.clone())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// The provider's representation of a signed-in user.
///
/// Equality compares identity fields only; two values with the same fields
/// but different sessions are considered the same user.
#[derive(Clone, Serialize)]
pub struct ProviderUser {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    #[serde(skip)]
    session: Arc<dyn UserSession>,
}

impl ProviderUser {
    pub fn new(uid: impl Into<String>, session: Arc<dyn UserSession>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            email_verified: false,
            display_name: None,
            photo_url: None,
            phone_number: None,
            session,
        }
    }

    /// A user whose token is the given fixed string.
    pub fn with_static_token(uid: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(uid, Arc::new(StaticSession::new(token)))
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = verified;
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    /// Fetch the current ID token from the provider session.
    ///
    /// # Errors
    ///
    /// Returns whatever the session reports, typically `ProviderError::Token`.
    pub async fn id_token(&self, force_refresh: bool) -> Result<String, ProviderError> {
        self.session.id_token(force_refresh).await
    }

    #[must_use]
    pub fn session(&self) -> Arc<dyn UserSession> {
        Arc::clone(&self.session)
    }
}

impl PartialEq for ProviderUser {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.email == other.email
            && self.email_verified == other.email_verified
            && self.display_name == other.display_name
            && self.photo_url == other.photo_url
            && self.phone_number == other.phone_number
    }
}

impl fmt::Debug for ProviderUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("email_verified", &self.email_verified)
            .field("display_name", &self.display_name)
            .field("photo_url", &self.photo_url)
            .field("phone_number", &self.phone_number)
            .finish_non_exhaustive()
    }
}

/// Result of the provider's token-result accessor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdTokenResult {
    pub token: String,
    /// `None` when the token carries no extended claims.
    pub claims: Option<Claims>,
}
