//! Courier HTTP transport adapter.
//!
//! Implements the [`gateway::Transport`] trait over [`reqwest`]. Every HTTP
//! response, whatever its status, comes back as a
//! [`gateway::ResponseEnvelope`]; only failures that leave no response behind
//! become a [`gateway::TransportError`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Connection pooling, TLS, body encoding and timeout
//! enforcement live here. The [`gateway`] crate sees only
//! [`gateway::Transport`].

use std::time::Duration;

use async_trait::async_trait;
use gateway::{PreparedRequest, RequestBody, ResponseEnvelope, Transport, TransportError};
use thiserror::Error;
use tracing::trace;

/// `User-Agent` sent when the caller does not set one.
pub const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// The underlying HTTP client could not be constructed.
#[derive(Debug, Error)]
#[error("Could not build HTTP client: {0}")]
pub struct BuildError(#[from] reqwest::Error);

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with Courier's default client settings.
    pub fn new() -> Result<Self, BuildError> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Creates a transport whose connection phase is capped at `connect_timeout`.
    ///
    /// The overall request timeout always comes from the prepared request.
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self, BuildError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<ResponseEnvelope, TransportError> {
        let PreparedRequest {
            method,
            url,
            headers,
            body,
            timeout,
        } = request;

        trace!(%method, %url, timeout_ms = timeout.as_millis() as u64, "dispatching");

        let mut builder = self.client.request(method, url).headers(headers).timeout(timeout);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Bytes(bytes) => builder.body(bytes),
        };

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_error)?;

        trace!(status = status.as_u16(), bytes = body.len(), "response received");
        Ok(ResponseEnvelope {
            status,
            headers,
            body,
        })
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("courier/"));
    }

    #[test]
    fn test_default_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
