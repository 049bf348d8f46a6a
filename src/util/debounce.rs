use std::time::Duration;

use tokio::time::Instant;

/// Cancellable-delay primitive for coalescing rapid triggers.
///
/// Arming the debouncer schedules a deadline `delay` from now; arming again
/// before the deadline replaces it, so only the last trigger within the
/// window ever fires. This is the only ordering/cancellation device in the
/// system; callers poll [`fire`](Self::fire) from their event loop tick.
///
/// Uses `tokio::time::Instant` so tests can drive it with paused time.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Schedule (or reschedule) the deadline. A pending deadline is
    /// superseded, never stacked.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Discard any pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has elapsed. Returns `true` exactly once
    /// per armed window.
    pub fn fire(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the pending deadline, if any. Lets an event loop pick
    /// a wakeup instead of busy-polling.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Debouncer;

    #[tokio::test(start_paused = true)]
    async fn test_fires_only_after_delay() {
        let mut debounce = Debouncer::new(Duration::from_millis(500));
        debounce.arm();

        assert!(!debounce.fire());
        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(!debounce.fire());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(debounce.fire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_most_once_per_window() {
        let mut debounce = Debouncer::new(Duration::from_millis(100));
        debounce.arm();
        tokio::time::advance(Duration::from_millis(100)).await;

        assert!(debounce.fire());
        assert!(!debounce.fire());
        assert!(!debounce.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_supersedes_pending_deadline() {
        let mut debounce = Debouncer::new(Duration::from_millis(500));
        debounce.arm();
        tokio::time::advance(Duration::from_millis(400)).await;

        // A new trigger within the window resets the clock
        debounce.arm();
        tokio::time::advance(Duration::from_millis(400)).await;
        assert!(!debounce.fire());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(debounce.fire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_deadline() {
        let mut debounce = Debouncer::new(Duration::from_millis(100));
        debounce.arm();
        debounce.cancel();

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!debounce.fire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining() {
        let mut debounce = Debouncer::new(Duration::from_millis(500));
        assert!(debounce.remaining().is_none());

        debounce.arm();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(debounce.remaining(), Some(Duration::from_millis(300)));
    }
}
