// Fixed-timestep frame driver.
//
// The clock decides how many simulation ticks a rendered frame advances:
// one normally, five in fast-forward, three on "superlemming" levels. All
// ticks are fully ordered and none are ever skipped — the state machine
// has no way to catch up partially, so a frame that owes five ticks runs
// exactly five.
//
// The time limit is tick-driven, not wall-clock: one "second" is a fixed
// number of ticks, and pausing simply stops consuming them.
//
// **Critical constraint: determinism.** Nothing in here reads real time.

use serde::{Deserialize, Serialize};

/// Playback speed selected by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedMode {
    Normal,
    FastForward,
}

/// Tick accounting for one level session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Clock {
    /// Current simulation tick, starting at 0 when the level loads.
    pub tick: u64,
    /// Ticks per simulated second.
    ticks_per_second: u32,
    /// Remaining time-limit ticks.
    time_left_ticks: u64,
    /// Level-wide speed multiplier (the original's "superlemming" flag).
    superlemming: bool,
    pub speed: SpeedMode,
    pub paused: bool,
}

impl Clock {
    pub fn new(ticks_per_second: u32, time_limit_seconds: u32, superlemming: bool) -> Self {
        Self {
            tick: 0,
            ticks_per_second,
            time_left_ticks: u64::from(time_limit_seconds) * u64::from(ticks_per_second),
            superlemming,
            speed: SpeedMode::Normal,
            paused: false,
        }
    }

    /// Simulation ticks owed for one rendered frame.
    pub fn ticks_per_frame(&self) -> u32 {
        if self.paused {
            return 0;
        }
        if self.superlemming {
            3
        } else {
            match self.speed {
                SpeedMode::Normal => 1,
                SpeedMode::FastForward => 5,
            }
        }
    }

    /// Whole seconds left on the level timer, rounded up so the display
    /// only shows 0 once the limit has truly expired.
    pub fn seconds_left(&self) -> u32 {
        let tps = u64::from(self.ticks_per_second);
        ((self.time_left_ticks + tps - 1) / tps) as u32
    }

    /// Consume one tick of the time limit. Returns true exactly once, on
    /// the tick the limit reaches zero.
    pub(crate) fn consume_time(&mut self) -> bool {
        if self.time_left_ticks == 0 {
            return false;
        }
        self.time_left_ticks -= 1;
        self.time_left_ticks == 0
    }

    pub fn expired(&self) -> bool {
        self.time_left_ticks == 0
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_frame_is_one_tick() {
        let clock = Clock::new(34, 60, false);
        assert_eq!(clock.ticks_per_frame(), 1);
    }

    #[test]
    fn fast_forward_is_five_ticks() {
        let mut clock = Clock::new(34, 60, false);
        clock.speed = SpeedMode::FastForward;
        assert_eq!(clock.ticks_per_frame(), 5);
    }

    #[test]
    fn superlemming_is_three_ticks_regardless_of_speed() {
        let mut clock = Clock::new(34, 60, true);
        assert_eq!(clock.ticks_per_frame(), 3);
        clock.speed = SpeedMode::FastForward;
        assert_eq!(clock.ticks_per_frame(), 3);
    }

    #[test]
    fn paused_frame_owes_no_ticks() {
        let mut clock = Clock::new(34, 60, false);
        clock.paused = true;
        assert_eq!(clock.ticks_per_frame(), 0);
    }

    #[test]
    fn time_expires_exactly_once() {
        let mut clock = Clock::new(2, 1, false);
        assert_eq!(clock.seconds_left(), 1);
        assert!(!clock.consume_time());
        assert!(clock.consume_time());
        assert!(clock.expired());
        assert!(!clock.consume_time());
        assert_eq!(clock.seconds_left(), 0);
    }

    #[test]
    fn seconds_left_rounds_up() {
        let mut clock = Clock::new(10, 2, false);
        assert!(!clock.consume_time());
        // 19 ticks left of a 20-tick limit still displays 2 seconds.
        assert_eq!(clock.seconds_left(), 2);
    }
}
