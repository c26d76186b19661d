//! Core request pipeline for Courier.
//!
//! This crate contains the request gateway and every type and port it needs:
//! descriptors and envelopes, the error taxonomy, status classification, the
//! reference-counted progress tracker, and the traits infrastructure crates
//! implement. It performs no network I/O itself.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** Infrastructure crates implement
//! [`Transport`], [`ProgressIndicator`] and [`Notifier`]; they never add
//! pipeline rules.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`client`] | [`RequestGateway`] and its builder |
//! | [`types`] | Descriptors, prepared requests, envelopes, timestamps |
//! | [`errors`] | Gateway, transport, hook and configuration errors |
//! | [`classification`] | Status table, [`Classification`], message catalog |
//! | [`progress`] | [`ProgressTracker`] and the indicator port |
//! | [`notify`] | Notifications and the notifier port |
//! | [`hooks`] | The request hook port and built-in hooks |
//! | [`transport`] | The transport port |
//! | [`config`] | Layered configuration |
//! | [`identifiers`] | Request correlation ids |

pub mod classification;
pub mod client;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod identifiers;
pub mod notify;
pub mod progress;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use classification::{classify, Classification, Locale, MessageCatalog, STATUS_TABLE};
pub use client::{RequestGateway, RequestGatewayBuilder};
pub use config::{GatewayConfig, GatewaySettings, BASE_URL_ENV, DEFAULT_TIMEOUT};
pub use errors::{ConfigError, GatewayError, HookError, TransportError};
pub use hooks::{BearerAuth, DefaultHeaders, RequestHook};
pub use identifiers::RequestId;
pub use notify::{Notification, NotificationKind, Notifier, RecordingNotifier, TracingNotifier};
pub use progress::{NoopIndicator, ProgressGuard, ProgressIndicator, ProgressState, ProgressTracker};
pub use transport::Transport;
pub use types::{
    PreparedRequest, RequestBody, RequestDescriptor, RequestDescriptorBuilder, ResponseEnvelope,
    Timestamp,
};

// Shared HTTP vocabulary, so callers need not depend on `http` directly.
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
