//! Progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Progress and cancellation context supplied by the caller.
///
/// Cancellation is cooperative: the pipeline polls [`is_canceled`] once per
/// node before dispatching visitors.
///
/// [`is_canceled`]: ProgressMonitor::is_canceled
pub trait ProgressMonitor {
    /// Start a task with an estimated amount of work.
    fn begin_task(&self, name: &str, total: usize);

    /// Record completed units of work.
    fn worked(&self, units: usize);

    /// Whether the caller asked to stop.
    fn is_canceled(&self) -> bool;

    /// Finish the current task.
    fn done(&self);
}

/// Progress monitor that ignores everything and is never canceled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressMonitor for NullProgress {
    fn begin_task(&self, _name: &str, _total: usize) {}

    fn worked(&self, _units: usize) {}

    fn is_canceled(&self) -> bool {
        false
    }

    fn done(&self) {}
}

/// Shareable cancellation flag that doubles as a progress monitor.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// to cancel the run.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
    worked: Arc<AtomicUsize>,
}

impl CancellationToken {
    /// Create a token that is not canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Units of work reported so far.
    pub fn units_worked(&self) -> usize {
        self.worked.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancellationToken {
    fn begin_task(&self, name: &str, total: usize) {
        debug!("Starting '{}' over {} node(s)", name, total);
        self.worked.store(0, Ordering::SeqCst);
    }

    fn worked(&self, units: usize) {
        self.worked.fetch_add(units, Ordering::SeqCst);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    fn done(&self) {
        debug!("Task finished after {} unit(s)", self.units_worked());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_progress_is_never_canceled() {
        assert!(!NullProgress.is_canceled());
    }

    #[test]
    fn clones_share_cancellation() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!token.is_canceled());

        other.cancel();
        assert!(token.is_canceled());
    }

    #[test]
    fn worked_units_accumulate_per_task() {
        let token = CancellationToken::new();
        token.begin_task("snapshot", 3);
        token.worked(1);
        token.worked(2);
        assert_eq!(token.units_worked(), 3);

        token.begin_task("restore", 3);
        assert_eq!(token.units_worked(), 0);
    }
}
