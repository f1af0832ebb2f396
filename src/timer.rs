//! Wraparound-safe interval timers.
//!
//! The clock is a free-running 32-bit millisecond counter that wraps after
//! about 49.7 days. Every comparison is done on the unsigned difference
//! `now.wrapping_sub(last)`, never on absolute timestamps.
//!
//! ```rust
//! use mmwave_occupancy::timer::IntervalTimer;
//!
//! let mut timer = IntervalTimer::new(1000);
//! timer.reset(u32::MAX - 100);
//!
//! // 900ms later the counter has wrapped, the timer has not fired
//! assert!(!timer.fire_if_due(799));
//! // 1000ms later it fires
//! assert!(timer.fire_if_due(899));
//! ```

/// A "time since last fire >= period" check with no drift correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalTimer {
    period_ms: u32,
    last_ms: u32,
}

impl IntervalTimer {
    /// Creates a timer with the given period, last fired at t=0.
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: 0,
        }
    }

    /// Returns the configured period.
    #[inline]
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Marks the timer as fired at `now_ms`.
    #[inline]
    pub fn reset(&mut self, now_ms: u32) {
        self.last_ms = now_ms;
    }

    /// Milliseconds since the timer last fired.
    #[inline]
    pub fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_ms)
    }

    /// Returns true if at least one period has elapsed.
    #[inline]
    pub fn is_due(&self, now_ms: u32) -> bool {
        self.elapsed(now_ms) >= self.period_ms
    }

    /// Fires (and resets) the timer if it is due.
    pub fn fire_if_due(&mut self, now_ms: u32) -> bool {
        if self.is_due(now_ms) {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_period() {
        let mut timer = IntervalTimer::new(100);
        timer.reset(0);
        assert!(!timer.fire_if_due(99));
        assert!(timer.fire_if_due(100));
        assert!(!timer.fire_if_due(150));
        assert!(timer.fire_if_due(200));
    }

    #[test]
    fn no_drift_correction() {
        let mut timer = IntervalTimer::new(100);
        timer.reset(0);
        // Late fire re-bases the schedule on the actual fire time
        assert!(timer.fire_if_due(170));
        assert!(!timer.fire_if_due(260));
        assert!(timer.fire_if_due(270));
    }

    #[test]
    fn zero_period_is_always_due() {
        let mut timer = IntervalTimer::new(0);
        timer.reset(42);
        assert!(timer.fire_if_due(42));
        assert!(timer.fire_if_due(42));
    }

    #[test]
    fn survives_counter_wrap() {
        let mut timer = IntervalTimer::new(500);
        timer.reset(u32::MAX - 199);
        assert_eq!(timer.elapsed(u32::MAX), 199);
        assert_eq!(timer.elapsed(0), 200);
        assert!(!timer.is_due(299));
        assert!(timer.is_due(300));
    }
}
