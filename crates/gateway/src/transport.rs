//! The transport port.

use async_trait::async_trait;

use crate::{PreparedRequest, ResponseEnvelope, TransportError};

/// Sends a prepared request over the network.
///
/// Implementations return every HTTP response as an envelope, whatever its
/// status; the gateway decides what counts as success. Errors are reserved for
/// failures that left no response behind, and the request's timeout must be
/// enforced here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the call.
    async fn send(&self, request: PreparedRequest) -> Result<ResponseEnvelope, TransportError>;
}
