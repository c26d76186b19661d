//! Request and response value types carried through the gateway pipeline.
//!
//! A [`RequestDescriptor`] is what callers and hooks see. Once the hooks have
//! run, the gateway resolves it against the configured base URL and timeout and
//! hands the transport a [`PreparedRequest`]. The transport answers with a
//! [`ResponseEnvelope`], which the gateway unwraps to its body on success.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::GatewayError;

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

/// Payload attached to an outbound request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document. Transports send it with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Raw bytes, sent as-is.
    Bytes(Bytes),
}

impl RequestBody {
    /// Returns `true` if there is no payload.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

// ---------------------------------------------------------------------------
// Request descriptor
// ---------------------------------------------------------------------------

/// A request as described by the caller, before base-URL resolution.
///
/// Descriptors are plain values. Request hooks receive one by value and return
/// a (possibly different) descriptor; nothing mutates a descriptor after it has
/// been handed to the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
    timeout: Option<Duration>,
}

impl RequestDescriptor {
    /// Creates a new descriptor builder.
    pub fn builder() -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::default()
    }

    /// A bodiless `GET` for `path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::bare(Method::GET, path)
    }

    /// A bodiless `DELETE` for `path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::bare(Method::DELETE, path)
    }

    /// A `POST` for `path` carrying `value` as JSON.
    pub fn post_json<T: Serialize>(path: impl Into<String>, value: &T) -> Result<Self, GatewayError> {
        Self::builder().method(Method::POST).path(path).json(value)?.build()
    }

    /// A `PUT` for `path` carrying `value` as JSON.
    pub fn put_json<T: Serialize>(path: impl Into<String>, value: &T) -> Result<Self, GatewayError> {
        Self::builder().method(Method::PUT).path(path).json(value)?.build()
    }

    fn bare(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path, relative to the base URL unless it is an absolute `http(s)` URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query pairs, in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request body.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Per-request timeout override, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns this descriptor with `name` set to `value`, replacing earlier values.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns this descriptor with `value` appended to any existing values of `name`.
    pub fn with_appended_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Splits the descriptor into its resolved form for the transport.
    pub(crate) fn prepare(self, url: Url, default_timeout: Duration) -> PreparedRequest {
        PreparedRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout.unwrap_or(default_timeout),
        }
    }
}

/// Fluent builder for [`RequestDescriptor`].
#[derive(Debug, Default)]
pub struct RequestDescriptorBuilder {
    method: Option<Method>,
    path: Option<String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: RequestBody,
    timeout: Option<Duration>,
}

impl RequestDescriptorBuilder {
    /// Set the HTTP method. Defaults to `GET`.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the request path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Append a query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header, replacing earlier values with the same name.
    pub fn header<K, V>(mut self, key: K, value: V) -> Result<Self, GatewayError>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Display,
        V::Error: std::fmt::Display,
    {
        let key = key.try_into().map_err(|e| self.invalid(format!("invalid header name: {e}")))?;
        let value = value
            .try_into()
            .map_err(|e| self.invalid(format!("invalid header value: {e}")))?;
        self.headers.insert(key, value);
        Ok(self)
    }

    /// Set the body to `value` serialised as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Result<Self, GatewayError> {
        let value = serde_json::to_value(value)
            .map_err(|e| self.invalid(format!("body is not serialisable as JSON: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(body.into());
        self
    }

    /// Override the configured timeout for this request only.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Build the descriptor. The path is required.
    pub fn build(self) -> Result<RequestDescriptor, GatewayError> {
        let path = match self.path {
            Some(path) => path,
            None => {
                return Err(GatewayError::InvalidRequest {
                    path: String::new(),
                    reason: "request path is required".into(),
                })
            }
        };

        Ok(RequestDescriptor {
            method: self.method.unwrap_or(Method::GET),
            path,
            query: self.query,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        })
    }

    fn invalid(&self, reason: String) -> GatewayError {
        GatewayError::InvalidRequest {
            path: self.path.clone().unwrap_or_default(),
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Prepared request
// ---------------------------------------------------------------------------

/// A descriptor after hooks have run and the URL and timeout are fixed.
///
/// This is the only request shape a [`crate::Transport`] ever sees.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully resolved URL, including query pairs.
    pub url: Url,
    /// Headers to send.
    pub headers: HeaderMap,
    /// Body to send.
    pub body: RequestBody,
    /// Timeout the transport must enforce for this request.
    pub timeout: Duration,
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// The full transport-level response.
///
/// Callers of the gateway never receive an envelope on success; they get
/// [`ResponseEnvelope::body`] only.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Buffered response body.
    pub body: Bytes,
}

impl ResponseEnvelope {
    /// Creates an envelope with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
