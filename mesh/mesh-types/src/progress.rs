//! Cancellation and progress reporting.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// A shared handle for cooperative cancellation and progress reporting.
///
/// Clones share state: a caller keeps one clone while passing another into a
/// long-running operation. The operation polls [`ProgressContext::is_cancelled`]
/// at phase boundaries and publishes completion percentages; the caller may
/// flip the cancel flag from any thread.
///
/// Cancellation is cooperative: an operation that observes the flag stops at
/// the next check point and returns a cancellation error, producing no
/// partial output.
///
/// # Example
///
/// ```
/// use mesh_types::ProgressContext;
///
/// let progress = ProgressContext::new();
/// let handle = progress.clone();
///
/// progress.set_percent(40);
/// assert_eq!(handle.percent(), 40);
///
/// handle.cancel();
/// assert!(progress.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProgressContext {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    percent: AtomicU8,
}

impl ProgressContext {
    /// Create a fresh context: not cancelled, 0% complete.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the running operation.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Relaxed)
    }

    /// Publish a completion percentage (clamped to 100).
    pub fn set_percent(&self, percent: u8) {
        self.inner.percent.store(percent.min(100), Ordering::Relaxed);
    }

    /// The most recently published completion percentage.
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.inner.percent.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context() {
        let progress = ProgressContext::new();
        assert!(!progress.is_cancelled());
        assert_eq!(progress.percent(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let progress = ProgressContext::new();
        let handle = progress.clone();

        handle.cancel();
        handle.set_percent(70);

        assert!(progress.is_cancelled());
        assert_eq!(progress.percent(), 70);
    }

    #[test]
    fn test_percent_clamped() {
        let progress = ProgressContext::new();
        progress.set_percent(250);
        assert_eq!(progress.percent(), 100);
    }
}
