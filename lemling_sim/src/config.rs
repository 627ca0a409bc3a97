// Engine tuning configuration.
//
// Scalars that belong to the engine rather than to any one level (level
// scalars — lemming count, release rate, time limit — live in
// `level.rs`). Everything here feeds deterministic tick arithmetic, so
// two sims must use identical configs to produce identical traces.

use serde::{Deserialize, Serialize};

/// Engine-level tuning knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Ticks per simulated second. Drives the time-limit countdown and the
    /// bomber fuse. Not wall-clock: a "second" is exactly this many ticks.
    pub ticks_per_second: u32,
    /// Bomber/nuke fuse length in simulated seconds.
    pub bomber_fuse_seconds: u32,
    /// Ticks the entry hatch animation takes before the first spawn.
    pub entry_open_ticks: u32,
    /// Half-width of the square cursor hit box, in pixels.
    pub cursor_radius: i32,
    /// Debug: a time limit of zero remaining no longer fails the level.
    pub cheat_no_time_limit: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Two ticks per original frame at the original's 17 fps.
            ticks_per_second: 34,
            bomber_fuse_seconds: 5,
            entry_open_ticks: 40,
            cursor_radius: 6,
            cheat_no_time_limit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fuse_matches_original_five_seconds() {
        let config = SimConfig::default();
        assert_eq!(config.bomber_fuse_seconds, 5);
        assert_eq!(
            config.bomber_fuse_seconds * config.ticks_per_second,
            170
        );
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = SimConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
