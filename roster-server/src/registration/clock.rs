//! Timestamp source for registration time and claim deadlines

use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond clock
///
/// Values never go backwards, even when the wall clock is adjusted.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_millis(&self) -> i64;
}

/// Wall clock clamped to be non-decreasing
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that never reads earlier than `floor`
    ///
    /// Seeded from the latest stored timestamp so ordering holds across
    /// restarts even if the wall clock was set back in between.
    pub fn resume_after(floor: i64) -> Self {
        Self {
            last: AtomicI64::new(floor),
        }
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        let now = shared::util::now_millis();
        let prev = self.last.fetch_max(now, Ordering::SeqCst);
        prev.max(now)
    }
}

/// Hand-driven clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, millis: i64) {
        self.now.fetch_max(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis.max(0), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let mut prev = clock.now_millis();
        for _ in 0..1000 {
            let now = clock.now_millis();
            assert!(now >= prev);
            prev = now;
        }
    }

    #[test]
    fn resumed_clock_stays_ahead_of_floor() {
        let floor = shared::util::now_millis() + 60_000;
        let clock = SystemClock::resume_after(floor);
        assert_eq!(clock.now_millis(), floor);
        assert!(clock.now_millis() >= floor);
    }

    #[test]
    fn manual_clock_never_goes_back() {
        let clock = ManualClock::new(1_000);
        clock.advance(500);
        assert_eq!(clock.now_millis(), 1_500);
        clock.set(10);
        assert_eq!(clock.now_millis(), 1_500);
        clock.set(2_000);
        assert_eq!(clock.now_millis(), 2_000);
    }
}
