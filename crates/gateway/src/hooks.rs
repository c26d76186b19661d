//! Request shaping before dispatch.
//!
//! Hooks run in registration order, each receiving the descriptor returned by
//! the previous one. With no hooks registered the descriptor reaches the
//! transport unmodified. A failing hook stops the pipeline before the transport
//! is called.

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};

use crate::{HookError, RequestDescriptor};

/// A step that may rewrite a descriptor before it is dispatched.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Short name used in logs and in [`HookError::hook`].
    fn name(&self) -> &str;

    /// Returns the descriptor to dispatch.
    async fn before_send(&self, descriptor: RequestDescriptor) -> Result<RequestDescriptor, HookError>;
}

// ---------------------------------------------------------------------------

/// Injects `Authorization: Bearer <token>`.
///
/// A descriptor that already carries an `Authorization` header is left alone.
pub struct BearerAuth {
    token: String,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").field("token", &"<redacted>").finish()
    }
}

impl BearerAuth {
    /// Creates the hook for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl RequestHook for BearerAuth {
    fn name(&self) -> &str {
        "bearer_auth"
    }

    async fn before_send(&self, descriptor: RequestDescriptor) -> Result<RequestDescriptor, HookError> {
        if descriptor.headers().contains_key(AUTHORIZATION) {
            return Ok(descriptor);
        }
        if self.token.trim().is_empty() {
            return Err(HookError::new(self.name(), "bearer token is empty"));
        }

        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| HookError::new(self.name(), format!("token is not a valid header value: {e}")))?;
        value.set_sensitive(true);
        Ok(descriptor.with_header(AUTHORIZATION, value))
    }
}

// ---------------------------------------------------------------------------

/// Adds headers the descriptor does not already set.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: HeaderMap,
}

impl DefaultHeaders {
    /// Creates the hook from a header map; every value of a name is added.
    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }
}

#[async_trait]
impl RequestHook for DefaultHeaders {
    fn name(&self) -> &str {
        "default_headers"
    }

    async fn before_send(&self, descriptor: RequestDescriptor) -> Result<RequestDescriptor, HookError> {
        let mut descriptor = descriptor;
        for name in self.headers.keys() {
            if descriptor.headers().contains_key(name) {
                continue;
            }
            for value in self.headers.get_all(name) {
                descriptor = descriptor.with_appended_header(name.clone(), value.clone());
            }
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use http::header::{ACCEPT, USER_AGENT};

    use super::*;

    #[tokio::test]
    async fn test_bearer_auth_injects_header() {
        let hook = BearerAuth::new("abc123");
        let descriptor = hook.before_send(RequestDescriptor::get("/me")).await.unwrap();
        let value = descriptor.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(value, "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[tokio::test]
    async fn test_bearer_auth_keeps_existing_header() {
        let hook = BearerAuth::new("abc123");
        let descriptor = RequestDescriptor::get("/me")
            .with_header(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        let shaped = hook.before_send(descriptor).await.unwrap();
        assert_eq!(shaped.headers().get(AUTHORIZATION).unwrap(), "Basic Zm9v");
    }

    #[tokio::test]
    async fn test_bearer_auth_rejects_empty_token() {
        let err = BearerAuth::new("  ").before_send(RequestDescriptor::get("/me")).await.unwrap_err();
        assert_eq!(err.hook, "bearer_auth");
    }

    #[tokio::test]
    async fn test_bearer_auth_rejects_unprintable_token() {
        let err = BearerAuth::new("bad\ntoken")
            .before_send(RequestDescriptor::get("/me"))
            .await
            .unwrap_err();
        assert!(err.message.contains("header value"));
    }

    #[test]
    fn test_bearer_auth_debug_redacts_token() {
        assert!(!format!("{:?}", BearerAuth::new("secret")).contains("secret"));
    }

    #[tokio::test]
    async fn test_default_headers_fill_gaps_only() {
        let mut defaults = HeaderMap::new();
        defaults.insert(ACCEPT, HeaderValue::from_static("application/json"));
        defaults.insert(USER_AGENT, HeaderValue::from_static("courier"));
        let hook = DefaultHeaders::new(defaults);

        let descriptor =
            RequestDescriptor::get("/x").with_header(ACCEPT, HeaderValue::from_static("text/plain"));
        let shaped = hook.before_send(descriptor).await.unwrap();

        assert_eq!(shaped.headers().get(ACCEPT).unwrap(), "text/plain");
        assert_eq!(shaped.headers().get(USER_AGENT).unwrap(), "courier");
    }
}
