//! HTTP transport seam for the login/logout endpoints.
//!
//! The protocol only ever issues body-less POSTs, so the trait is that narrow.
//! [`ReqwestTransport`] is the production implementation; tests substitute
//! their own.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use thiserror::Error;

/// One outbound sync request. Always credential-bearing: cookies are sent
/// and accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub url: String,
    /// Raw value for the `Authorization` header (no `Bearer` prefix).
    pub authorization: Option<String>,
}

impl SyncRequest {
    pub fn login(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authorization: Some(token.into()),
        }
    }

    pub fn logout(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authorization: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, or an empty object when it is not JSON.
    #[must_use]
    pub fn json_or_empty(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// The request never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a body-less POST.
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn post(&self, request: SyncRequest) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
///
/// The client keeps a cookie store, so session cookies set by the login
/// endpoint are kept and replayed.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns `TransportError::Request` if the TLS backend fails to initialize.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: reqwest::Client::builder().cookie_store(true).build()?,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, request: SyncRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.post(&request.url);
        if let Some(token) = &request.authorization {
            builder = builder.header(AUTHORIZATION, token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            // The status already decides the outcome; an unreadable error
            // body is reported as empty.
            Err(error) if !status.is_success() => {
                tracing::debug!(url = %request.url, %error, "failed to read error response body");
                Vec::new()
            }
            Err(error) => return Err(error.into()),
        };
        tracing::debug!(url = %request.url, status = status.as_u16(), "sync request completed");
        Ok(TransportResponse::new(status.as_u16(), body))
    }
}
