//! The request gateway.
//!
//! [`RequestGateway::send`] is the single path every outbound call takes:
//!
//! 1. Register the request with the shared [`ProgressTracker`].
//! 2. Run the [`RequestHook`]s in order and resolve the URL. A failure here
//!    never reaches the transport.
//! 3. Dispatch through the [`Transport`]. A non-2xx envelope becomes
//!    [`TransportError::Status`].
//! 4. Release the tracker, then either return the body or classify the
//!    failure, emit one notification, and return the original error.
//!
//! A pre-dispatch failure counts as "started then stopped": the tracker was
//! already registered in step 1 and is released in step 4 like any other
//! failure, and the failure is reported as a connectivity failure because no
//! response exists.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn, Instrument};

use crate::classification::classify;
use crate::{
    GatewayConfig, GatewayError, MessageCatalog, NoopIndicator, Notification, Notifier,
    PreparedRequest, ProgressTracker, RequestDescriptor, RequestHook, RequestId, ResponseEnvelope,
    TracingNotifier, Transport, TransportError,
};

/// Uniform send-and-receive front over a [`Transport`].
pub struct RequestGateway {
    config: GatewayConfig,
    catalog: MessageCatalog,
    transport: Arc<dyn Transport>,
    hooks: Vec<Arc<dyn RequestHook>>,
    progress: Arc<ProgressTracker>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("config", &self.config)
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .field("progress", &self.progress)
            .finish()
    }
}

impl RequestGateway {
    /// Starts building a gateway over `transport`.
    pub fn builder(config: GatewayConfig, transport: Arc<dyn Transport>) -> RequestGatewayBuilder {
        RequestGatewayBuilder {
            config,
            transport,
            hooks: Vec::new(),
            progress: None,
            notifier: None,
        }
    }

    /// The configuration this gateway was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The shared progress tracker.
    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    /// Sends `descriptor` and returns the response body.
    ///
    /// On failure a single error notification is emitted and the original
    /// error is returned.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Bytes, GatewayError> {
        let span = tracing::info_span!(
            "gateway.send",
            request_id = %RequestId::new_random(),
            method = %descriptor.method(),
            path = descriptor.path(),
        );
        self.send_inner(descriptor).instrument(span).await
    }

    /// Sends `descriptor` and decodes the body as JSON.
    ///
    /// A decode failure is returned as [`GatewayError::Decode`] without a
    /// notification: the request itself succeeded.
    pub async fn send_json<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<T, GatewayError> {
        let body = self.send(descriptor).await?;
        serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// `GET path`.
    pub async fn get(&self, path: &str) -> Result<Bytes, GatewayError> {
        self.send(RequestDescriptor::get(path)).await
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> Result<Bytes, GatewayError> {
        self.send(RequestDescriptor::delete(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// A body that cannot be serialised is rejected before the request enters
    /// the pipeline, so it produces no notification.
    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Bytes, GatewayError> {
        self.send(RequestDescriptor::post_json(path, body)?).await
    }

    /// `PUT path` with a JSON body. Serialisation failures behave as in
    /// [`RequestGateway::post_json`].
    pub async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Bytes, GatewayError> {
        self.send(RequestDescriptor::put_json(path, body)?).await
    }

    async fn send_inner(&self, descriptor: RequestDescriptor) -> Result<Bytes, GatewayError> {
        let progress = self.progress.begin();
        let outcome = self.dispatch(descriptor).await;
        progress.finish();

        match outcome {
            Ok(envelope) => {
                debug!(status = envelope.status.as_u16(), bytes = envelope.body.len(), "request succeeded");
                Ok(envelope.body)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    async fn dispatch(&self, descriptor: RequestDescriptor) -> Result<ResponseEnvelope, GatewayError> {
        let descriptor = self.run_hooks(descriptor).await?;
        let prepared = self.prepare(descriptor)?;

        let envelope = self.transport.send(prepared).await?;
        if envelope.is_success() {
            Ok(envelope)
        } else {
            Err(TransportError::from_envelope(envelope).into())
        }
    }

    async fn run_hooks(&self, mut descriptor: RequestDescriptor) -> Result<RequestDescriptor, GatewayError> {
        for hook in &self.hooks {
            descriptor = hook.before_send(descriptor).await?;
        }
        Ok(descriptor)
    }

    fn prepare(&self, descriptor: RequestDescriptor) -> Result<PreparedRequest, GatewayError> {
        let url = self
            .config
            .resolve(descriptor.path(), descriptor.query())
            .map_err(|reason| GatewayError::InvalidRequest {
                path: descriptor.path().to_string(),
                reason,
            })?;
        Ok(descriptor.prepare(url, self.config.timeout()))
    }

    fn report(&self, err: &GatewayError) {
        let classification = classify(err.status());
        warn!(
            status = err.status().map(|s| s.as_u16()),
            classification = %classification,
            error = %err,
            "request failed"
        );
        self.notifier
            .notify(Notification::error(self.catalog.message(classification)));
    }
}

// ---------------------------------------------------------------------------

/// Builder for [`RequestGateway`].
pub struct RequestGatewayBuilder {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    hooks: Vec<Arc<dyn RequestHook>>,
    progress: Option<Arc<ProgressTracker>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl RequestGatewayBuilder {
    /// Appends a request hook. Hooks run in the order they are added.
    pub fn hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Uses an existing tracker, e.g. one shared with other gateways.
    ///
    /// Defaults to a private tracker over [`NoopIndicator`].
    pub fn progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the notification sink. Defaults to [`TracingNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Builds the gateway.
    pub fn build(self) -> RequestGateway {
        RequestGateway {
            catalog: MessageCatalog::new(self.config.locale()),
            config: self.config,
            transport: self.transport,
            hooks: self.hooks,
            progress: self
                .progress
                .unwrap_or_else(|| Arc::new(ProgressTracker::new(Arc::new(NoopIndicator)))),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
        }
    }
}
