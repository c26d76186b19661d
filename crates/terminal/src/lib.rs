//! Courier terminal adapters.
//!
//! Implements the gateway's [`Notifier`] and [`ProgressIndicator`] ports for a
//! text terminal:
//!
//! - [`TerminalNotifier`] prints each notification as one coloured line.
//! - [`TerminalIndicator`] shows a loading label while requests are in flight
//!   and erases it when the last one settles.
//!
//! Both write to stderr by default so stdout stays reserved for response
//! bodies. Write failures are logged and otherwise ignored: a broken terminal
//! must never change a request's outcome.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.**

use std::io::{self, Write};
use std::sync::Mutex;

use colored::Colorize;
use gateway::{Notification, NotificationKind, Notifier, ProgressIndicator};

type Sink = Mutex<Box<dyn Write + Send>>;

fn write_to(sink: &Sink, bytes: &[u8]) {
    let mut out = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(err) = out.write_all(bytes).and_then(|_| out.flush()) {
        tracing::debug!(error = %err, "terminal write failed");
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Prints notifications as `<kind>: <message>` lines.
pub struct TerminalNotifier {
    sink: Sink,
}

impl TerminalNotifier {
    /// Writes to stderr.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Writes to `sink`.
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }
}

/// Renders one notification line, including the trailing newline.
pub fn render_notification(notification: &Notification) -> String {
    let label = match notification.kind {
        NotificationKind::Error => "error".red().bold(),
        NotificationKind::Warning => "warning".yellow().bold(),
        NotificationKind::Info => "info".blue().bold(),
        NotificationKind::Success => "success".green().bold(),
    };
    format!("{label}: {}\n", notification.message)
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        write_to(&self.sink, render_notification(&notification).as_bytes());
    }
}

// ---------------------------------------------------------------------------
// Loading indicator
// ---------------------------------------------------------------------------

/// Label shown while requests are in flight.
pub const DEFAULT_LABEL: &str = "loading…";

// Carriage return, then ANSI "erase entire line".
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Shows a single-line loading label.
///
/// Meant to sit behind a [`gateway::ProgressTracker`], which calls
/// [`ProgressIndicator::start`] and [`ProgressIndicator::done`] only on idle
/// transitions. Redundant calls are harmless: `start` while visible and `done`
/// while hidden write nothing.
pub struct TerminalIndicator {
    sink: Sink,
    label: String,
    visible: Mutex<bool>,
}

impl TerminalIndicator {
    /// Writes [`DEFAULT_LABEL`] to stderr.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()), DEFAULT_LABEL)
    }

    /// Writes `label` to `sink`.
    pub fn new(sink: Box<dyn Write + Send>, label: impl Into<String>) -> Self {
        Self {
            sink: Mutex::new(sink),
            label: label.into(),
            visible: Mutex::new(false),
        }
    }

    fn set_visible(&self, visible: bool) {
        let mut current = self.visible.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current == visible {
            return;
        }
        *current = visible;
        if visible {
            write_to(&self.sink, format!("{}", self.label.as_str().dimmed()).as_bytes());
        } else {
            write_to(&self.sink, CLEAR_LINE.as_bytes());
        }
    }
}

impl ProgressIndicator for TerminalIndicator {
    fn start(&self) {
        self.set_visible(true);
    }

    fn done(&self) {
        self.set_visible(false);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    /// A `Write` whose contents the test can read back.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_notifier_prints_one_line_per_notification() {
        let buffer = SharedBuffer::default();
        let notifier = TerminalNotifier::new(Box::new(buffer.clone()));

        notifier.notify(Notification::error("请求地址错误"));
        notifier.notify(Notification::new(NotificationKind::Info, "done"));

        let output = buffer.contents();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("error") && lines[0].ends_with(": 请求地址错误"));
        assert!(lines[1].contains("info") && lines[1].ends_with(": done"));
    }

    #[test]
    fn test_indicator_shows_and_clears() {
        let buffer = SharedBuffer::default();
        let indicator = TerminalIndicator::new(Box::new(buffer.clone()), "working");

        indicator.start();
        assert!(buffer.contents().contains("working"));

        indicator.done();
        assert!(buffer.contents().ends_with(CLEAR_LINE));
    }

    #[test]
    fn test_indicator_tolerates_redundant_calls() {
        let buffer = SharedBuffer::default();
        let indicator = TerminalIndicator::new(Box::new(buffer.clone()), "working");

        indicator.done();
        assert!(buffer.contents().is_empty());

        indicator.start();
        indicator.start();
        assert_eq!(buffer.contents().matches("working").count(), 1);

        indicator.done();
        indicator.done();
        assert_eq!(buffer.contents().matches(CLEAR_LINE).count(), 1);
    }
}
