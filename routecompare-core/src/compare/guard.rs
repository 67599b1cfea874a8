//! Process-wide exclusion for comparison runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared run-state flag.
///
/// Clones share one flag, so every comparator built from the same guard
/// rejects overlapping runs.
///
/// # Examples
/// ```
/// use routecompare_core::RunGuard;
///
/// let guard = RunGuard::default();
/// let permit = guard.try_acquire().expect("idle guard");
/// assert!(guard.is_busy());
/// assert!(guard.try_acquire().is_none());
/// drop(permit);
/// assert!(!guard.is_busy());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    active: Arc<AtomicBool>,
}

impl RunGuard {
    /// Create an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the run slot, or return `None` when a run is active.
    #[must_use = "the run slot is released as soon as the permit is dropped"]
    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                active: Arc::clone(&self.active),
            })
    }

    /// Whether a run currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Proof of an active run; releases the slot on drop.
#[derive(Debug)]
pub struct RunPermit {
    active: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}
