//! Shared loading indicator with in-flight reference counting.
//!
//! A single [`ProgressIndicator`] represents the visible loading cue. The
//! [`ProgressTracker`] sits in front of it and counts requests in flight: the
//! indicator is started on the 0→1 transition and finished on the 1→0
//! transition only, so overlapping requests never make it flicker idle while
//! one of them is still outstanding.
//!
//! Each request holds a [`ProgressGuard`]. Finishing the guard (explicitly or
//! by dropping it) releases that request's share exactly once, which also
//! covers futures dropped mid-flight.

use std::sync::{Arc, Mutex, MutexGuard};

/// The visible loading cue.
///
/// Implementations must tolerate redundant calls and must not call back into
/// the [`ProgressTracker`] that drives them.
pub trait ProgressIndicator: Send + Sync {
    /// Show the cue.
    fn start(&self);

    /// Hide the cue.
    fn done(&self);
}

/// An indicator that shows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndicator;

impl ProgressIndicator for NoopIndicator {
    fn start(&self) {}

    fn done(&self) {}
}

/// Whether any request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    /// No request in flight.
    Idle,
    /// At least one request in flight.
    Active,
}

/// Reference-counted front for a [`ProgressIndicator`].
pub struct ProgressTracker {
    in_flight: Mutex<usize>,
    indicator: Arc<dyn ProgressIndicator>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Arc::new(NoopIndicator))
    }
}

impl ProgressTracker {
    /// Creates an idle tracker driving `indicator`.
    pub fn new(indicator: Arc<dyn ProgressIndicator>) -> Self {
        Self {
            in_flight: Mutex::new(0),
            indicator,
        }
    }

    /// Registers one request in flight and returns the guard that releases it.
    pub fn begin(self: &Arc<Self>) -> ProgressGuard {
        let mut count = self.lock();
        *count += 1;
        if *count == 1 {
            self.indicator.start();
        }
        ProgressGuard {
            tracker: Some(Arc::clone(self)),
        }
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        *self.lock()
    }

    /// Current state of the shared cue.
    pub fn state(&self) -> ProgressState {
        if self.in_flight() == 0 {
            ProgressState::Idle
        } else {
            ProgressState::Active
        }
    }

    fn end(&self) {
        let mut count = self.lock();
        // Guards release exactly once, so a zero count here is unreachable.
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.indicator.done();
        }
    }

    // The indicator is called with the lock held so start/done reach it in the
    // same order as the count transitions.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One request's share of the tracker. Released on [`ProgressGuard::finish`] or drop.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the request's progress"]
pub struct ProgressGuard {
    tracker: Option<Arc<ProgressTracker>>,
}

impl ProgressGuard {
    /// Releases this request's share now.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.end();
        }
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Indicator that counts calls; shared by tests across the crate.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CountingIndicator {
    pub(crate) starts: std::sync::atomic::AtomicUsize,
    pub(crate) dones: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl CountingIndicator {
    pub(crate) fn counts(&self) -> (usize, usize) {
        use std::sync::atomic::Ordering;
        (self.starts.load(Ordering::SeqCst), self.dones.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
impl ProgressIndicator for CountingIndicator {
    fn start(&self) {
        self.starts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn done(&self) {
        self.dones.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (Arc<ProgressTracker>, Arc<CountingIndicator>) {
        let indicator = Arc::new(CountingIndicator::default());
        (Arc::new(ProgressTracker::new(indicator.clone())), indicator)
    }

    #[test]
    fn test_single_request_starts_and_finishes_once() {
        let (tracker, indicator) = tracker();
        assert_eq!(tracker.state(), ProgressState::Idle);

        let guard = tracker.begin();
        assert_eq!(tracker.state(), ProgressState::Active);
        assert_eq!(indicator.counts(), (1, 0));

        guard.finish();
        assert_eq!(tracker.state(), ProgressState::Idle);
        assert_eq!(indicator.counts(), (1, 1));
    }

    #[test]
    fn test_overlapping_requests_do_not_flicker() {
        let (tracker, indicator) = tracker();

        let first = tracker.begin();
        let second = tracker.begin();
        assert_eq!(tracker.in_flight(), 2);

        first.finish();
        assert_eq!(tracker.state(), ProgressState::Active);
        assert_eq!(indicator.counts(), (1, 0));

        second.finish();
        assert_eq!(tracker.state(), ProgressState::Idle);
        assert_eq!(indicator.counts(), (1, 1));
    }

    #[test]
    fn test_drop_releases_share() {
        let (tracker, indicator) = tracker();
        {
            let _guard = tracker.begin();
            assert_eq!(tracker.in_flight(), 1);
        }
        assert_eq!(tracker.in_flight(), 0);
        assert_eq!(indicator.counts(), (1, 1));
    }

    #[test]
    fn test_restart_after_idle() {
        let (tracker, indicator) = tracker();
        tracker.begin().finish();
        tracker.begin().finish();
        assert_eq!(indicator.counts(), (2, 2));
    }
}
