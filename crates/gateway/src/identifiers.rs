//! Newtype identifiers used by the gateway.
//!
//! Requests are not persisted, so the only identity the gateway hands out is a
//! correlation id attached to the tracing span of each `send` call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a single pass of a request through the gateway pipeline.
///
/// Generated fresh for every call to [`crate::RequestGateway::send`], including
/// repeated sends of an identical descriptor, so log lines from two otherwise
/// indistinguishable calls can still be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RequestId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
