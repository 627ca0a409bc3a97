// Output events — fire-and-forget cues emitted by the simulation.
//
// The core never waits on or reads results from its sound/visual sink:
// every tick returns a batch of `SimEvent` values and the presentation
// layer does whatever it likes with them (play a sample, spawn particles,
// flash a counter). Dropping the batch on the floor changes nothing about
// the simulation, which is what keeps replays exact.
//
// See also: `sim.rs` which collects these during `tick()`, `replay.rs`
// for the *input* event stream (a different thing: replay events mutate,
// sim events only describe).

use serde::{Deserialize, Serialize};

use crate::types::LemmingId;

/// Sound cue identifiers handed to the audio sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// A skill request was accepted.
    SkillAssigned,
    /// A skill request was refused — a normal outcome, not an error.
    SkillRefused,
    /// Destructive skill hit steel or a one-way wall.
    HitObstruction,
    /// Builder is three steps from running out of bricks.
    BuilderWarning,
    Explosion,
    Splat,
    Drown,
    Trap,
    Exit,
    /// Fell out of the level or timed out mid-air.
    Die,
    /// Entry hatch finished opening.
    DoorOpen,
}

/// One narrative/cue event, tagged with the tick it happened on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

/// Everything the core tells the outside world about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    Sound(SoundCue),
    /// Spawn a particle explosion at the given level position.
    Explosion { x: i32, y: i32 },
    /// Countdown digit to draw above an agent's head.
    CountdownDigit { lemming: LemmingId, seconds: u32 },
    LemmingSpawned { lemming: LemmingId, entry: usize },
    LemmingRescued { lemming: LemmingId, total_rescued: u32 },
    LemmingDied { lemming: LemmingId },
    /// The tick-driven time limit ran out.
    TimeExpired,
    /// All lemmings are out and accounted for.
    LevelFinished { rescued: u32, needed: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_roundtrip() {
        let event = SimEvent {
            tick: 120,
            kind: SimEventKind::CountdownDigit {
                lemming: LemmingId(3),
                seconds: 4,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let restored: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, restored);
    }
}
