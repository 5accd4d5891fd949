use std::time::Duration;

use tokio::time::Instant;

/// Pure debouncer: a single deadline, pushed back by every touch.
///
/// Uses tokio's clock so paused-time tests drive it.
pub(super) struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Record an event; cancels and reschedules the pending deadline.
    pub(super) fn touch(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    pub(super) fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Clear and report the deadline if it has passed.
    pub(super) fn take_if_ready(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Precise sleep duration until the deadline.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(deadline) = self.deadline else {
            return Duration::from_secs(86400);
        };
        deadline
            .saturating_duration_since(Instant::now())
            .max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_idle_never_ready() {
        let mut debouncer = Debouncer::new(Duration::from_millis(250));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.take_if_ready());
        assert_eq!(debouncer.sleep_duration(), Duration::from_secs(86400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_reschedules() {
        let mut debouncer = Debouncer::new(Duration::from_millis(250));
        debouncer.touch();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!debouncer.take_if_ready());

        debouncer.touch();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!debouncer.take_if_ready());
        assert_eq!(debouncer.sleep_duration(), Duration::from_millis(50));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(debouncer.take_if_ready());
        assert!(!debouncer.is_pending());
        assert!(!debouncer.take_if_ready());
    }
}
