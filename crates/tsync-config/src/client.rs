//! Identity provider SDK settings.

use serde::{Deserialize, Serialize};

/// Settings for the client-side identity SDK.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientInitConfig {
    /// Public API key. Always required; the server also uses it when
    /// exchanging tokens.
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub auth_domain: String,

    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub database_url: String,
}

impl ClientInitConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Service-account credential for the admin SDK. Server-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdminCredential {
    #[serde(default)]
    pub project_id: String,

    #[serde(default)]
    pub client_email: String,

    #[serde(default)]
    pub private_key: String,
}

/// Settings for the admin SDK. Optional when the app initializes it itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdminInitConfig {
    #[serde(default)]
    pub credential: AdminCredential,

    #[serde(default)]
    pub database_url: String,
}

impl AdminInitConfig {
    pub fn has_private_key(&self) -> bool {
        !self.credential.private_key.is_empty()
    }
}
