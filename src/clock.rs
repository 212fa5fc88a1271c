use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of "now" for elapsed-time accounting.
///
/// Only differences between two readings are meaningful, so implementations
/// may pick any origin.
pub trait Clock: Send + 'static {
    fn now(&self) -> Duration;
}

/// Wall clock. Keeps counting while the process is suspended or the machine
/// sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// Hand-driven clock for tests and headless runs. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Move the clock to an absolute reading, possibly backwards.
    pub fn set(&self, at: Duration) {
        self.millis.store(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();

        clock.advance(Duration::from_secs(90));

        assert_eq!(other.now(), Duration::from_secs(90));
    }

    #[test]
    fn manual_clock_can_jump_backwards() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(10));
        clock.set(Duration::from_secs(3));

        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn system_clock_is_past_the_epoch() {
        assert!(SystemClock.now() > Duration::ZERO);
    }
}
