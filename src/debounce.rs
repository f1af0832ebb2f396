//! Presence debouncing: turns a raw presence signal into motion events.
//!
//! Exactly one [`DebounceStrategy`] is active per deployment:
//!
//! - [`EdgeHold`](DebounceStrategy::EdgeHold): a rising edge sets presence
//!   immediately and arms a hold timer. Presence clears only once the signal
//!   is low and `hold_ms` has elapsed since the last rising edge.
//! - [`LevelRefresh`](DebounceStrategy::LevelRefresh): the level is sampled as
//!   is (the module's own hold timer is ground truth). A change publishes
//!   immediately, and the current level is re-announced every `broadcast_ms`
//!   even without a change.
//!
//! [`DebounceEngine::evaluate`] returns `Some(level)` when a publish should
//! happen. A level change and an expired broadcast timer in the same call
//! yield a single publish.
//!
//! # Example
//!
//! ```rust
//! use mmwave_occupancy::debounce::{DebounceEngine, DebounceStrategy};
//!
//! let mut engine = DebounceEngine::new(DebounceStrategy::LevelRefresh { broadcast_ms: 60_000 });
//! engine.reset(0);
//!
//! assert_eq!(engine.evaluate(false, 0), Some(false)); // initial announce
//! assert_eq!(engine.evaluate(false, 10), None);
//! assert_eq!(engine.evaluate(true, 20), Some(true)); // change
//! assert_eq!(engine.evaluate(true, 60_020), Some(true)); // refresh
//! ```

use crate::timer::IntervalTimer;

/// Debounce strategy, selected at configuration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DebounceStrategy {
    /// Rising edge sets presence; presence clears after `hold_ms` without a new edge.
    EdgeHold {
        /// Hold interval in milliseconds.
        hold_ms: u32,
    },
    /// Publish on level change, and re-announce every `broadcast_ms`.
    LevelRefresh {
        /// Broadcast interval in milliseconds.
        broadcast_ms: u32,
    },
}

impl Default for DebounceStrategy {
    fn default() -> Self {
        DebounceStrategy::LevelRefresh {
            broadcast_ms: 60_000,
        }
    }
}

/// Where the raw presence signal comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PresenceSource {
    /// The module's digital output pin.
    #[default]
    Pin,
    /// The moving/stationary flags of the latest decoded frame.
    RadarFlags,
}

/// Published occupancy state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyState {
    /// Last published presence.
    pub is_present: bool,
    /// When `is_present` last flipped.
    pub last_change_ms: u32,
    /// When the state was last published.
    pub last_broadcast_ms: u32,
}

/// Hysteresis filter and broadcast scheduler for presence.
#[derive(Clone, Debug)]
pub struct DebounceEngine {
    strategy: DebounceStrategy,
    state: OccupancyState,
    hold: IntervalTimer,
    broadcast: IntervalTimer,
    last_raw: bool,
    announced: bool,
}

impl DebounceEngine {
    /// Creates an engine for the given strategy.
    pub fn new(strategy: DebounceStrategy) -> Self {
        let (hold_ms, broadcast_ms) = match strategy {
            DebounceStrategy::EdgeHold { hold_ms } => (hold_ms, 0),
            DebounceStrategy::LevelRefresh { broadcast_ms } => (0, broadcast_ms),
        };
        Self {
            strategy,
            state: OccupancyState::default(),
            hold: IntervalTimer::new(hold_ms),
            broadcast: IntervalTimer::new(broadcast_ms),
            last_raw: false,
            announced: false,
        }
    }

    /// Active strategy.
    pub fn strategy(&self) -> DebounceStrategy {
        self.strategy
    }

    /// Current occupancy state.
    pub fn state(&self) -> &OccupancyState {
        &self.state
    }

    /// Last published presence.
    #[inline]
    pub fn is_present(&self) -> bool {
        self.state.is_present
    }

    /// Resets state and timers. Called once when the node is ready to operate.
    ///
    /// The next [`evaluate`](Self::evaluate) always publishes.
    pub fn reset(&mut self, now_ms: u32) {
        self.state = OccupancyState {
            is_present: false,
            last_change_ms: now_ms,
            last_broadcast_ms: now_ms,
        };
        self.hold.reset(now_ms);
        self.broadcast.reset(now_ms);
        self.last_raw = false;
        self.announced = false;
    }

    /// Feeds one raw sample.
    ///
    /// Returns the presence to publish, or `None` if nothing should be sent.
    pub fn evaluate(&mut self, raw: bool, now_ms: u32) -> Option<bool> {
        let next = match self.strategy {
            DebounceStrategy::EdgeHold { .. } => self.edge_hold(raw, now_ms),
            DebounceStrategy::LevelRefresh { .. } => raw,
        };
        self.last_raw = raw;

        let changed = next != self.state.is_present;
        if changed {
            self.state.is_present = next;
            self.state.last_change_ms = now_ms;
        }

        let refresh = match self.strategy {
            DebounceStrategy::LevelRefresh { .. } => self.broadcast.is_due(now_ms),
            DebounceStrategy::EdgeHold { .. } => false,
        };

        if changed || refresh || !self.announced {
            self.announced = true;
            self.broadcast.reset(now_ms);
            self.state.last_broadcast_ms = now_ms;
            Some(self.state.is_present)
        } else {
            None
        }
    }

    fn edge_hold(&mut self, raw: bool, now_ms: u32) -> bool {
        if raw && !self.last_raw {
            self.hold.reset(now_ms);
            return true;
        }
        if self.state.is_present && !raw && self.hold.is_due(now_ms) {
            return false;
        }
        self.state.is_present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(hold_ms: u32) -> DebounceEngine {
        let mut engine = DebounceEngine::new(DebounceStrategy::EdgeHold { hold_ms });
        engine.reset(0);
        engine
    }

    fn level(broadcast_ms: u32) -> DebounceEngine {
        let mut engine = DebounceEngine::new(DebounceStrategy::LevelRefresh { broadcast_ms });
        engine.reset(0);
        engine
    }

    // =========================================================================
    // EdgeHold
    // =========================================================================

    #[test]
    fn edge_hold_rising_edge_is_immediate() {
        let mut engine = edge(5000);
        assert_eq!(engine.evaluate(false, 0), Some(false));
        assert_eq!(engine.evaluate(true, 100), Some(true));
        assert!(engine.is_present());
        assert_eq!(engine.state().last_change_ms, 100);
    }

    #[test]
    fn edge_hold_clears_after_hold() {
        let mut engine = edge(5000);
        engine.evaluate(false, 0);
        engine.evaluate(true, 100);
        assert_eq!(engine.evaluate(false, 200), None);
        assert_eq!(engine.evaluate(false, 5099), None);
        assert_eq!(engine.evaluate(false, 5100), Some(false));
        assert!(!engine.is_present());
    }

    #[test]
    fn edge_hold_new_edge_rearms() {
        let mut engine = edge(5000);
        engine.evaluate(false, 0);
        engine.evaluate(true, 100);
        engine.evaluate(false, 200);
        // Second edge at 4000 restarts the hold window, no republish
        assert_eq!(engine.evaluate(true, 4000), None);
        engine.evaluate(false, 4100);
        assert_eq!(engine.evaluate(false, 5100), None);
        assert_eq!(engine.evaluate(false, 9000), Some(false));
    }

    #[test]
    fn edge_hold_stays_present_while_high() {
        let mut engine = edge(1000);
        engine.evaluate(false, 0);
        engine.evaluate(true, 10);
        for t in (100..10_000).step_by(100) {
            assert_eq!(engine.evaluate(true, t), None);
        }
        assert!(engine.is_present());
    }

    #[test]
    fn edge_hold_short_pulse_settles_to_prior_state() {
        let mut engine = edge(2000);
        engine.evaluate(false, 0);
        // Pulse shorter than the hold interval
        engine.evaluate(true, 100);
        engine.evaluate(false, 150);
        // After settling the reported state is the pre-pulse state
        engine.evaluate(false, 2100);
        assert!(!engine.is_present());
    }

    #[test]
    fn edge_hold_never_refreshes() {
        let mut engine = edge(1000);
        engine.evaluate(false, 0);
        assert_eq!(engine.evaluate(false, 1_000_000), None);
    }

    // =========================================================================
    // LevelRefresh
    // =========================================================================

    #[test]
    fn level_refresh_initial_announce() {
        let mut engine = level(60_000);
        assert_eq!(engine.evaluate(true, 5), Some(true));
        assert_eq!(engine.evaluate(true, 6), None);
    }

    #[test]
    fn level_refresh_publishes_each_change() {
        let mut engine = level(60_000);
        engine.evaluate(false, 0);
        assert_eq!(engine.evaluate(true, 10), Some(true));
        assert_eq!(engine.evaluate(true, 20), None);
        assert_eq!(engine.evaluate(false, 30), Some(false));
        assert_eq!(engine.evaluate(false, 40), None);
    }

    #[test]
    fn level_refresh_reannounces_without_change() {
        let mut engine = level(1000);
        engine.evaluate(false, 0);
        let mut publishes = 0;
        for t in (10..=5000).step_by(10) {
            if engine.evaluate(false, t).is_some() {
                publishes += 1;
            }
        }
        assert_eq!(publishes, 5);
    }

    #[test]
    fn level_refresh_change_and_refresh_publish_once() {
        let mut engine = level(1000);
        engine.evaluate(false, 0);
        // Broadcast timer expires on the same sample as a level change
        assert_eq!(engine.evaluate(true, 1000), Some(true));
        assert_eq!(engine.evaluate(true, 1001), None);
        assert_eq!(engine.state().last_broadcast_ms, 1000);
    }

    #[test]
    fn level_refresh_change_restarts_broadcast_window() {
        let mut engine = level(1000);
        engine.evaluate(false, 0);
        engine.evaluate(true, 900);
        assert_eq!(engine.evaluate(true, 1000), None);
        assert_eq!(engine.evaluate(true, 1900), Some(true));
    }

    #[test]
    fn level_refresh_across_clock_wrap() {
        let mut engine = DebounceEngine::new(DebounceStrategy::LevelRefresh { broadcast_ms: 1000 });
        let start = u32::MAX - 500;
        engine.reset(start);
        engine.evaluate(false, start);
        assert_eq!(engine.evaluate(false, 100), None);
        assert_eq!(engine.evaluate(false, 499), Some(false));
    }

    #[test]
    fn reset_forces_next_publish() {
        let mut engine = level(60_000);
        engine.evaluate(true, 0);
        engine.reset(100);
        assert!(!engine.is_present());
        assert_eq!(engine.evaluate(false, 100), Some(false));
    }
}
