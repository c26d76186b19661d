//! User-visible notifications.
//!
//! The gateway emits exactly one [`Notification`] per failed request and none
//! on success. Delivery is fire-and-forget: [`Notifier::notify`] cannot fail,
//! so a broken notification sink can never change a request's outcome.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Severity of a notification, as rendered by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Something failed.
    Error,
    /// Something needs attention.
    Warning,
    /// Neutral information.
    Info,
    /// Something succeeded.
    Success,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity.
    pub kind: NotificationKind,
    /// Text shown to the user.
    pub message: String,
    /// When the notification was raised.
    pub raised_at: Timestamp,
}

impl Notification {
    /// Creates a notification stamped with the current time.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raised_at: Timestamp::now(),
        }
    }

    /// Shorthand for an [`NotificationKind::Error`] notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }
}

/// Delivers notifications to the user.
pub trait Notifier: Send + Sync {
    /// Shows `notification`. Must not panic.
    fn notify(&self, notification: Notification);
}

/// Emits notifications as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            kind,
            message,
            raised_at,
        } = notification;
        match kind {
            NotificationKind::Error => {
                tracing::error!(target: "courier::notify", %raised_at, %message)
            }
            NotificationKind::Warning => {
                tracing::warn!(target: "courier::notify", %raised_at, %message)
            }
            NotificationKind::Info | NotificationKind::Success => {
                tracing::info!(target: "courier::notify", kind = ?kind, %raised_at, %message)
            }
        }
    }
}

/// Keeps every notification in memory.
///
/// Useful for embedding the gateway where the host renders notifications
/// itself, and for asserting on notifications in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Number of notifications received.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes and returns everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.received.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.lock().push(notification);
    }
}
