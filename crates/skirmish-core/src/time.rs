//! Game clock for the Skirmish server
//!
//! Combat timers (stun, knockdown, cooldowns, recovery) are absolute
//! millisecond timestamps on a monotonic region clock.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Milliseconds since the clock started
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    /// Create a timestamp from milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the clock started
    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Timestamp `ms` milliseconds later
    pub fn after(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed since `earlier`, zero if `earlier` is in the future
    pub fn since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Milliseconds remaining until `later`, zero if already passed
    pub fn until(self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;

    fn add(self, ms: u64) -> Timestamp {
        self.after(ms)
    }
}

impl AddAssign<u64> for Timestamp {
    fn add_assign(&mut self, ms: u64) {
        *self = self.after(ms);
    }
}

/// Errors that can occur while driving the clock
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClockError {
    #[error("Clock cannot move backwards from {now}ms to {requested}ms")]
    Backwards { now: u64, requested: u64 },
}

/// Configuration for the game clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// How many game milliseconds pass per real millisecond
    pub time_scale: f32,
    /// Maximum delta accepted per update, to survive stalls
    pub max_delta_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_ms: 250,
        }
    }
}

/// Region clock
#[derive(Debug, Clone, Default)]
pub struct GameClock {
    /// Configuration
    pub config: ClockConfig,
    /// Current time
    now: Timestamp,
    /// Number of updates applied
    pub tick_count: u64,
    /// Whether the clock is paused
    pub paused: bool,
}

impl GameClock {
    /// Create a clock with custom config
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Current time
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Advance by a raw real-time delta in milliseconds
    pub fn update(&mut self, raw_delta_ms: u64) -> Timestamp {
        self.tick_count += 1;
        if self.paused {
            return self.now;
        }

        let clamped = raw_delta_ms.min(self.config.max_delta_ms);
        let scaled = (clamped as f64 * self.config.time_scale.max(0.0) as f64) as u64;
        self.now += scaled;
        self.now
    }

    /// Jump to an absolute time. Time never flows backwards.
    pub fn advance_to(&mut self, time: Timestamp) -> Result<Timestamp, ClockError> {
        if time < self.now {
            return Err(ClockError::Backwards {
                now: self.now.0,
                requested: time.0,
            });
        }
        self.now = time;
        Ok(self.now)
    }

    /// Pause the clock
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the clock
    pub fn resume(&mut self) {
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_arithmetic() {
        let t = Timestamp::from_millis(1000);
        assert_eq!((t + 500).as_millis(), 1500);
        assert_eq!(t.after(250).since(t), 250);
        assert_eq!(t.since(t.after(10)), 0);
        assert_eq!(t.until(t.after(40)), 40);
    }

    #[test]
    fn test_clock_update_clamps_and_pauses() {
        let mut clock = GameClock::default();
        assert_eq!(clock.update(100).as_millis(), 100);
        assert_eq!(clock.update(10_000).as_millis(), 350);

        clock.pause();
        assert_eq!(clock.update(100).as_millis(), 350);
        assert_eq!(clock.tick_count, 3);
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut clock = GameClock::default();
        clock.advance_to(Timestamp(5000)).unwrap();
        assert!(clock.advance_to(Timestamp(4000)).is_err());
        assert_eq!(clock.now(), Timestamp(5000));
    }
}
