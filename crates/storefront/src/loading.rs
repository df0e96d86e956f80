//! In-flight request tracking.
//!
//! Each HTTP request holds a [`LoadingGuard`] for its lifetime. The tracker
//! publishes `true` while at least one guard is alive, which is what a UI
//! binds a global spinner to.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Counts in-flight requests and publishes `is_loading`.
#[derive(Clone)]
pub struct LoadingTracker {
    inner: Arc<LoadingTrackerInner>,
}

struct LoadingTrackerInner {
    in_flight: AtomicUsize,
    loading_tx: watch::Sender<bool>,
}

impl LoadingTrackerInner {
    /// Recompute the flag from the counter while holding the channel lock,
    /// so the last publisher always sees the latest count.
    fn publish(&self) {
        self.loading_tx.send_if_modified(|loading| {
            let now = self.in_flight.load(Ordering::Acquire) > 0;
            let changed = *loading != now;
            *loading = now;
            changed
        });
    }
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        let (loading_tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(LoadingTrackerInner {
                in_flight: AtomicUsize::new(0),
                loading_tx,
            }),
        }
    }

    /// Mark the start of a request. Dropping the guard marks the end.
    #[must_use = "the request counts as finished when the guard is dropped"]
    pub fn begin(&self) -> LoadingGuard {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        self.inner.publish();
        LoadingGuard {
            tracker: Arc::clone(&self.inner),
        }
    }

    /// Whether any request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.inner.loading_tx.borrow()
    }

    /// Number of requests in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Subscribe to `is_loading` changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.loading_tx.subscribe()
    }
}

/// Held for the duration of one request.
pub struct LoadingGuard {
    tracker: Arc<LoadingTrackerInner>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.tracker.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_follows_guards() {
        let tracker = LoadingTracker::new();
        let rx = tracker.subscribe();
        assert!(!tracker.is_loading());

        let first = tracker.begin();
        let second = tracker.begin();
        assert!(*rx.borrow());
        assert_eq!(tracker.in_flight(), 2);

        drop(first);
        assert!(tracker.is_loading());

        drop(second);
        assert!(!tracker.is_loading());
        assert!(!*rx.borrow());
    }
}
