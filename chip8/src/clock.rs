//! Host clock.
use std::time::{Duration, Instant};

/// Timer used by hosts to pace instruction steps and timer ticks.
///
/// The interval is measured from the last due cycle rather than from when
/// `tick` was called, so a host polling in a loop does not drift. When the
/// host falls far behind, the clock skips ahead instead of catching up.
pub struct Clock {
    interval: Duration,
    last: Instant,
}

impl Clock {
    /// Number of missed cycles after which the clock stops catching up.
    const MAX_BACKLOG: u32 = 8;

    /// Creates a new clock with the current time as internal state.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.last = Instant::now()
    }

    /// Check whether a cycle is due, and consume it if so.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> bool {
        // A zero interval is due once per instant, never repeatedly.
        if self.interval.is_zero() {
            let due = now > self.last;
            self.last = self.last.max(now);
            return due;
        }

        let elapsed = now.saturating_duration_since(self.last);
        if elapsed < self.interval {
            return false;
        }

        if elapsed > self.interval * Self::MAX_BACKLOG {
            // Reset back to zero, rather than trying to catch up.
            //
            // If the VM was paused for debugging, and a large
            // amount of time has elapsed until it is resumed,
            // it should simply continue at the next cycle running
            // at its usual speed.
            self.last = now;
        } else {
            self.last += self.interval;
        }

        true
    }

    /// Time remaining until the next cycle is due.
    pub fn remaining(&self) -> Duration {
        self.interval.saturating_sub(self.last.elapsed())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tick_due() {
        let mut clock = Clock::new(Duration::from_millis(10));
        let start = clock.last;

        assert!(!clock.tick_at(start + Duration::from_millis(5)));
        assert!(clock.tick_at(start + Duration::from_millis(12)));
        assert_eq!(clock.last, start + Duration::from_millis(10));

        // Second cycle is already due from the backlog.
        assert!(clock.tick_at(start + Duration::from_millis(21)));
        assert!(!clock.tick_at(start + Duration::from_millis(21)));
    }

    #[test]
    fn test_zero_interval() {
        let mut clock = Clock::new(Duration::ZERO);
        let start = clock.last;

        assert!(!clock.tick_at(start));
        assert!(clock.tick_at(start + Duration::from_nanos(1)));
        assert!(!clock.tick_at(start + Duration::from_nanos(1)));
        assert!(!clock.tick_at(start));
        assert!(clock.tick_at(start + Duration::from_millis(1)));
    }

    #[test]
    fn test_tick_skips_long_pause() {
        let mut clock = Clock::new(Duration::from_millis(10));
        let start = clock.last;
        let resumed = start + Duration::from_secs(5);

        assert!(clock.tick_at(resumed));
        assert_eq!(clock.last, resumed);
        assert!(!clock.tick_at(resumed + Duration::from_millis(1)));
    }
}
