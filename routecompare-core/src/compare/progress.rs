//! Step-counted progress events.

/// One progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Completed steps, starting at 1.
    pub step: u32,
    /// Total steps in the run.
    pub total: u32,
    /// Human-readable description of the completed step.
    pub message: String,
}

impl ProgressEvent {
    /// Build an event.
    pub fn new(step: u32, total: u32, message: impl Into<String>) -> Self {
        Self {
            step,
            total,
            message: message.into(),
        }
    }

    /// Completion percentage, rounded down and capped at 100.
    ///
    /// # Examples
    /// ```
    /// use routecompare_core::ProgressEvent;
    ///
    /// assert_eq!(ProgressEvent::new(1, 7, "pairs").percent(), 14);
    /// assert_eq!(ProgressEvent::new(7, 7, "saved").percent(), 100);
    /// ```
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let scaled = u64::from(self.step.min(self.total)) * 100 / u64::from(self.total);
        u8::try_from(scaled).unwrap_or(100)
    }
}

/// Receives progress events as they happen.
pub trait ProgressSink: Send + Sync {
    /// Handle one event. Called in step order.
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn report(&self, event: &ProgressEvent) {
        self(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: &ProgressEvent) {}
}
