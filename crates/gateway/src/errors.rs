//! Error types for the gateway pipeline.
//!
//! [`GatewayError`] is what callers of [`crate::RequestGateway`] receive. Its
//! [`GatewayError::Transport`] variant carries the transport's own error
//! untouched: classification and user notification are side effects of the
//! failure path, never a replacement for the error itself.
//!
//! The taxonomy splits failures by where they stop:
//!
//! | Stage | Variant |
//! |-------|---------|
//! | Before dispatch | [`GatewayError::InvalidRequest`], [`GatewayError::Hook`] |
//! | Transport, with response | [`TransportError::Status`] |
//! | Transport, no response | [`TransportError::Timeout`], [`TransportError::Connect`], [`TransportError::Other`] |

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::ResponseEnvelope;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// A failed transport call.
///
/// Transports return [`TransportError::Timeout`], [`TransportError::Connect`]
/// or [`TransportError::Other`] when no response arrived. The gateway itself
/// produces [`TransportError::Status`] from any non-2xx envelope.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP error: status={status}")]
    Status {
        /// Status returned by the server.
        status: StatusCode,
        /// Response headers.
        headers: HeaderMap,
        /// Buffered response body.
        body: Bytes,
    },

    /// No response within the request timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The connection could not be established (DNS, refused, TLS).
    #[error("Connection error: {0}")]
    Connect(String),

    /// Any other failure that left no response behind.
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Converts a non-success envelope into an error, keeping the whole response.
    pub fn from_envelope(envelope: ResponseEnvelope) -> Self {
        TransportError::Status {
            status: envelope.status,
            headers: envelope.headers,
            body: envelope.body,
        }
    }

    /// The response status, or `None` when the failure happened without a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Hook errors
// ---------------------------------------------------------------------------

/// A request hook refused or failed to shape a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Request hook '{hook}' failed: {message}")]
pub struct HookError {
    /// Name of the failing hook (see [`crate::RequestHook::name`]).
    pub hook: String,
    /// Description of the failure.
    pub message: String,
}

impl HookError {
    /// Creates a new [`HookError`].
    pub fn new(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway errors
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::RequestGateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The descriptor could not be built or its path does not resolve to a URL.
    #[error("Invalid request '{path}': {reason}")]
    InvalidRequest {
        /// The offending path as supplied by the caller.
        path: String,
        /// Description of the problem.
        reason: String,
    },

    /// A request hook failed; the transport was never called.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The transport failed. This is the transport's original error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A successful body could not be decoded into the requested type.
    ///
    /// Only produced by [`crate::RequestGateway::send_json`] after the pipeline
    /// has already settled successfully.
    #[error("Response body could not be decoded: {0}")]
    Decode(String),
}

impl GatewayError {
    /// The response status behind this error, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Transport(err) => err.status(),
            _ => None,
        }
    }

    /// The original transport error, if the failure came from the transport.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            GatewayError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Problems found while loading or validating a [`crate::GatewayConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Could not read configuration file '{path}': {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or has unexpected keys.
    #[error("Could not parse configuration: {0}")]
    Parse(String),

    /// No base URL was supplied by any configuration layer.
    #[error("No base URL configured (set `base_url` or {env})", env = crate::config::BASE_URL_ENV)]
    MissingBaseUrl,

    /// The base URL is not an absolute `http`/`https` URL.
    #[error("Invalid base URL '{value}': {reason}")]
    InvalidBaseUrl {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timeout of zero would fail every request.
    #[error("Timeout must be greater than zero")]
    ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_keeps_envelope() {
        let envelope = ResponseEnvelope::new(StatusCode::NOT_FOUND, "missing");
        let err = TransportError::from_envelope(envelope);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        match err {
            TransportError::Status { body, .. } => assert_eq!(body, Bytes::from("missing")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_response_errors_have_no_status() {
        assert_eq!(TransportError::Timeout("5s".into()).status(), None);
        assert_eq!(TransportError::Connect("refused".into()).status(), None);
        assert_eq!(TransportError::Other("reset".into()).status(), None);
    }

    #[test]
    fn test_gateway_error_exposes_transport_status() {
        let err = GatewayError::from(TransportError::from_envelope(ResponseEnvelope::new(
            StatusCode::FORBIDDEN,
            "",
        )));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert!(err.transport().is_some());

        let hook = GatewayError::from(HookError::new("auth", "no token"));
        assert_eq!(hook.status(), None);
        assert!(hook.transport().is_none());
        assert_eq!(hook.to_string(), "Request hook 'auth' failed: no token");
    }
}
