// Core types shared across the simulation.
//
// Defines the agent identifier, facing direction, the full behavioral state
// enum (`Behavior`), and the player-assignable skill enum (`Skill`). All
// types derive `Serialize`/`Deserialize` for state snapshots and replay
// streams.
//
// **Critical constraint: determinism.** `LemmingId` values are allocated
// from a monotonic counter owned by the population — never reused, never
// derived from hashing or entropy. Replay events address agents by these
// stable ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a lemming agent.
///
/// Monotonically allocated at spawn time and never reused, so a replay
/// event recorded against an id can only ever resolve to the agent it was
/// recorded for (or to nothing, if that agent is already gone).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LemmingId(pub u32);

impl fmt::Display for LemmingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LemmingId({})", self.0)
    }
}

/// Identifier embedded in trap/exit stencil cells, dispatching collisions
/// to the matching entry of the level's object table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u8);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

/// Horizontal facing of an agent.
///
/// `None` is used by stationary terminal states (splatting, drowning),
/// where the sprite has no mirrored variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    None,
}

impl Direction {
    /// Horizontal step delta: -1, +1, or 0.
    pub fn dx(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::None => 0,
        }
    }

    /// The opposite facing. `None` flips to itself.
    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }
}

/// The agent's current behavioral state — the "type" of the state machine.
///
/// Transitions between variants happen exclusively inside the per-tick
/// animate function (`lemming.rs`) or through the validated skill gate
/// (`sim.rs`). No other code writes this field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Behavior {
    Walker,
    Faller,
    Climber,
    /// One-cycle transitional state between a climb and level ground.
    ClimberToWalker,
    Floater,
    /// Opening frames of the umbrella before steady floating.
    FloaterStart,
    Jumper,
    Builder,
    /// Shrug animation after the twelfth builder step.
    BuilderEnd,
    Digger,
    Basher,
    Miner,
    Stopper,
    /// A stopper with a live explosion countdown; keeps its field stamped.
    BomberStopper,
    Bomber,
    /// Terminal: walked into the exit, animating out.
    Exiting,
    /// Terminal: landed too hard.
    Splat,
    /// Terminal: water trap.
    Drowning,
    /// Terminal: caught by a killing trap object.
    Trapped,
}

impl Behavior {
    /// All variants, for resource-table validation.
    pub const ALL: [Behavior; 19] = [
        Behavior::Walker,
        Behavior::Faller,
        Behavior::Climber,
        Behavior::ClimberToWalker,
        Behavior::Floater,
        Behavior::FloaterStart,
        Behavior::Jumper,
        Behavior::Builder,
        Behavior::BuilderEnd,
        Behavior::Digger,
        Behavior::Basher,
        Behavior::Miner,
        Behavior::Stopper,
        Behavior::BomberStopper,
        Behavior::Bomber,
        Behavior::Exiting,
        Behavior::Splat,
        Behavior::Drowning,
        Behavior::Trapped,
    ];

    /// Terminal states: the agent is doomed and accepts no further skills
    /// (apart from the idempotent nuke no-op).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Behavior::Exiting | Behavior::Splat | Behavior::Drowning | Behavior::Trapped
        )
    }

    /// States from which a new working skill may be assigned.
    ///
    /// The gate for DIGGER/MINER/BASHER/BUILDER/STOPPER requests: anything
    /// outside this set must refuse them.
    pub fn can_change_skill(self) -> bool {
        matches!(
            self,
            Behavior::Walker
                | Behavior::Basher
                | Behavior::Builder
                | Behavior::BuilderEnd
                | Behavior::Digger
                | Behavior::Miner
        )
    }

    /// States eligible to leave through an exit.
    pub fn can_exit(self) -> bool {
        matches!(
            self,
            Behavior::Walker
                | Behavior::Jumper
                | Behavior::Basher
                | Behavior::Miner
                | Behavior::Builder
                | Behavior::Digger
        )
    }
}

/// A skill the player (or a replay stream) can request for an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Climber,
    Floater,
    Bomber,
    Stopper,
    Builder,
    Basher,
    Miner,
    Digger,
    /// Forced doom assignment used by the nuke sequence. Not a player
    /// panel skill, but it travels through the same gate.
    Nuke,
}

/// What a trap-class level object does to an agent that touches it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectEffect {
    /// Water: the agent drowns.
    Drown,
    /// Killing trap: the agent is consumed by the trap animation.
    Die,
    /// Level exit.
    Exit,
}
