// Read-only resource tables keyed by behavior.
//
// The resource provider contract: before a level starts, the sim is handed
// one `ResourceSet` describing, per behavior, the animation frame count,
// loop-vs-once mode, and — for the skills that need one — the destructive
// mask, its check twin, and the tick within the animation cycle at which
// the mask fires. The core treats all of this as immutable for the whole
// play session.
//
// A malformed table (missing mask, zero frame count) is fatal at load:
// `validate()` refuses to let a level start rather than run with partial
// mask data, since a silent fallback would desynchronize replays.
//
// The `builtin()` set carries stamp geometry equivalent to the original
// sprite-derived masks; an asset pipeline can supply its own set through
// the same struct.
//
// See also: `mask.rs` for the stamp type, `sim.rs` which validates the
// table in `SimState::new`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::mask::Mask;
use crate::types::{Behavior, Direction};

/// Ticks per original-game frame. All animation frame counts below are in
/// original frames; tick arithmetic multiplies by this.
pub const TIME_SCALE: u32 = 2;

/// Fatal resource-table problems. The sim refuses to start on any of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("no resource entry for behavior {0:?}")]
    MissingEntry(Behavior),
    #[error("behavior {0:?} requires a destructive mask but none is defined")]
    MissingMask(Behavior),
    #[error("behavior {0:?} has a zero frame count")]
    ZeroFrames(Behavior),
    #[error("behavior {behavior:?} has mask_step {step} outside its {frames}-frame cycle")]
    MaskStepOutOfCycle {
        behavior: Behavior,
        step: u32,
        frames: u32,
    },
}

/// Whether an animation repeats or plays through once and then triggers
/// its end-of-animation transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimMode {
    Loop,
    Once,
}

/// Destructive mask plus its check twin, in both facings. Both variants
/// are always derived from one source bitmap — the left-facing stamps are
/// horizontal mirrors, never separate drawings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillMasks {
    right: Mask,
    left: Mask,
}

impl SkillMasks {
    /// Build both facings from the right-facing source bitmap.
    pub fn from_source(source: Mask) -> Self {
        let left = source.flipped();
        Self {
            right: source,
            left,
        }
    }

    /// The destructive stamp for the given facing. `Direction::None`
    /// resolves to the right-facing stamp (used by the direction-agnostic
    /// stopper field and explosion crater).
    pub fn stamp(&self, dir: Direction) -> &Mask {
        match dir {
            Direction::Left => &self.left,
            Direction::Right | Direction::None => &self.right,
        }
    }

    /// The indestructibility-check stamp. Same bitmap as the destructive
    /// one by construction; kept as a separate accessor because the two
    /// roles query different stencil bits.
    pub fn check_stamp(&self, dir: Direction) -> &Mask {
        self.stamp(dir)
    }
}

/// Per-behavior resource entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BehaviorResource {
    /// Animation frames (original-game frames; one cycle lasts
    /// `frames * TIME_SCALE` ticks).
    pub frames: u32,
    pub mode: AnimMode,
    /// Stamp pair for destructive/stopper behaviors.
    pub masks: Option<SkillMasks>,
    /// Tick index within the cycle at which the mask fires.
    pub mask_step: u32,
}

impl BehaviorResource {
    fn animated(frames: u32, mode: AnimMode) -> Self {
        Self {
            frames,
            mode,
            masks: None,
            mask_step: 0,
        }
    }

    fn with_mask(frames: u32, mode: AnimMode, source: Mask, mask_step: u32) -> Self {
        Self {
            frames,
            mode,
            masks: Some(SkillMasks::from_source(source)),
            mask_step,
        }
    }

    /// Length of one full animation cycle in ticks.
    pub fn cycle_ticks(&self) -> u32 {
        self.frames * TIME_SCALE
    }
}

/// The complete behavior-keyed resource table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceSet {
    table: BTreeMap<Behavior, BehaviorResource>,
    /// Entry served for a behavior missing from the table. `validate()`
    /// guarantees this is never reached after a successful load; it exists
    /// so lookups stay infallible inside the tick.
    fallback: BehaviorResource,
}

/// Behaviors that must carry a mask pair.
const MASKED: [Behavior; 5] = [
    Behavior::Basher,
    Behavior::Miner,
    Behavior::Digger,
    Behavior::Bomber,
    Behavior::Stopper,
];

impl ResourceSet {
    /// The built-in stamp set, geometry-equivalent to the original
    /// sprite-derived masks.
    pub fn builtin() -> Self {
        let mut table = BTreeMap::new();

        table.insert(
            Behavior::Walker,
            BehaviorResource::animated(8, AnimMode::Loop),
        );
        table.insert(
            Behavior::Faller,
            BehaviorResource::animated(4, AnimMode::Loop),
        );
        table.insert(
            Behavior::Climber,
            BehaviorResource::animated(8, AnimMode::Loop),
        );
        table.insert(
            Behavior::ClimberToWalker,
            BehaviorResource::animated(8, AnimMode::Once),
        );
        table.insert(
            Behavior::FloaterStart,
            BehaviorResource::animated(4, AnimMode::Once),
        );
        table.insert(
            Behavior::Floater,
            BehaviorResource::animated(8, AnimMode::Loop),
        );
        table.insert(
            Behavior::Jumper,
            BehaviorResource::animated(1, AnimMode::Loop),
        );
        table.insert(
            Behavior::Builder,
            BehaviorResource::animated(16, AnimMode::Loop),
        );
        table.insert(
            Behavior::BuilderEnd,
            BehaviorResource::animated(8, AnimMode::Once),
        );
        // Digger shaft is two rows deep per stroke, slightly wider than
        // the body.
        table.insert(
            Behavior::Digger,
            BehaviorResource::with_mask(
                16,
                AnimMode::Loop,
                Mask::solid(9, 2, -4, -1),
                8 * TIME_SCALE,
            ),
        );
        // Basher swing bites 6 px forward over the body, stopping one
        // row short of the foot so the tunnel keeps its floor.
        table.insert(
            Behavior::Basher,
            BehaviorResource::with_mask(
                16,
                AnimMode::Loop,
                Mask::solid(6, 9, 1, 9),
                5 * TIME_SCALE,
            ),
        );
        // Miner pick reaches forward and below foot level.
        table.insert(
            Behavior::Miner,
            BehaviorResource::with_mask(
                16,
                AnimMode::Loop,
                Mask::solid(6, 12, 1, 9),
                4 * TIME_SCALE,
            ),
        );
        table.insert(
            Behavior::Stopper,
            BehaviorResource::with_mask(16, AnimMode::Loop, Mask::solid(8, 10, -4, 9), 0),
        );
        table.insert(
            Behavior::BomberStopper,
            BehaviorResource::animated(16, AnimMode::Loop),
        );
        table.insert(
            Behavior::Bomber,
            BehaviorResource::with_mask(16, AnimMode::Once, crater_mask(), 0),
        );
        table.insert(
            Behavior::Exiting,
            BehaviorResource::animated(8, AnimMode::Once),
        );
        table.insert(
            Behavior::Splat,
            BehaviorResource::animated(16, AnimMode::Once),
        );
        table.insert(
            Behavior::Drowning,
            BehaviorResource::animated(16, AnimMode::Once),
        );
        table.insert(
            Behavior::Trapped,
            BehaviorResource::animated(16, AnimMode::Once),
        );

        Self {
            table,
            fallback: BehaviorResource::animated(1, AnimMode::Loop),
        }
    }

    /// Fatal-at-load validation: every behavior present, non-zero frame
    /// counts, masks where the state machine requires them, mask timing
    /// inside the cycle.
    pub fn validate(&self) -> Result<(), ResourceError> {
        for behavior in Behavior::ALL {
            let entry = self
                .table
                .get(&behavior)
                .ok_or(ResourceError::MissingEntry(behavior))?;
            if entry.frames == 0 {
                return Err(ResourceError::ZeroFrames(behavior));
            }
            if entry.masks.is_some() && entry.mask_step >= entry.cycle_ticks() {
                return Err(ResourceError::MaskStepOutOfCycle {
                    behavior,
                    step: entry.mask_step,
                    frames: entry.frames,
                });
            }
        }
        for behavior in MASKED {
            let entry = &self.table[&behavior];
            if entry.masks.is_none() {
                return Err(ResourceError::MissingMask(behavior));
            }
        }
        Ok(())
    }

    /// Look up a behavior's entry. Infallible inside the tick; a table
    /// that passed `validate()` never serves the fallback.
    pub fn of(&self, behavior: Behavior) -> &BehaviorResource {
        self.table.get(&behavior).unwrap_or(&self.fallback)
    }

    /// Mutable access for tests and custom providers.
    pub fn entry_mut(&mut self, behavior: Behavior) -> Option<&mut BehaviorResource> {
        self.table.get_mut(&behavior)
    }
}

/// Round explosion crater, 14 px across, centered a little above the foot
/// so the blast bites both up into the body and down into the floor.
fn crater_mask() -> Mask {
    let diameter = 14i32;
    let radius_sq = 49;
    let mut rows = Vec::with_capacity(diameter as usize);
    for row in 0..diameter {
        let mut bits = 0u32;
        for col in 0..diameter {
            let dx = 2 * col - (diameter - 1);
            let dy = 2 * row - (diameter - 1);
            // Compare against the squared diameter since dx/dy are doubled.
            if dx * dx + dy * dy <= 4 * radius_sq {
                bits |= 1 << col;
            }
        }
        rows.push(bits);
    }
    Mask::from_rows(rows, diameter as u32, -7, 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stencil::{Stencil, cell};

    #[test]
    fn builtin_set_validates() {
        assert!(ResourceSet::builtin().validate().is_ok());
    }

    #[test]
    fn missing_mask_is_fatal() {
        let mut set = ResourceSet::builtin();
        set.entry_mut(Behavior::Basher).unwrap().masks = None;
        assert_eq!(
            set.validate(),
            Err(ResourceError::MissingMask(Behavior::Basher))
        );
    }

    #[test]
    fn zero_frames_is_fatal() {
        let mut set = ResourceSet::builtin();
        set.entry_mut(Behavior::Walker).unwrap().frames = 0;
        assert_eq!(
            set.validate(),
            Err(ResourceError::ZeroFrames(Behavior::Walker))
        );
    }

    #[test]
    fn mask_step_must_sit_inside_cycle() {
        let mut set = ResourceSet::builtin();
        set.entry_mut(Behavior::Digger).unwrap().mask_step = 1000;
        assert!(matches!(
            set.validate(),
            Err(ResourceError::MaskStepOutOfCycle { .. })
        ));
    }

    #[test]
    fn basher_stamps_reach_ahead_in_both_facings() {
        let set = ResourceSet::builtin();
        let masks = set.of(Behavior::Basher).masks.as_ref().unwrap();

        let mut stencil = Stencil::new(64, 64);
        for x in 0..64 {
            for y in 0..64 {
                stencil.set_bits(x, y, cell::BRICK);
            }
        }
        let right = masks.stamp(crate::types::Direction::Right);
        let erased = right.erase(&mut stencil, 30, 40, 0, cell::STEEL);
        assert_eq!(erased, 54);
        // The bite lands ahead of the agent, not behind, and leaves the
        // foot row alone.
        assert!(!stencil.is_solid(31, 39));
        assert!(stencil.is_solid(31, 40));
        assert!(stencil.is_solid(29, 39));

        let left = masks.stamp(crate::types::Direction::Left);
        let erased = left.erase(&mut stencil, 30, 40, 0, cell::STEEL);
        assert_eq!(erased, 54);
        assert!(!stencil.is_solid(29, 39));
    }

    #[test]
    fn crater_is_symmetric_and_round() {
        let crater = crater_mask();
        assert_eq!(crater.width(), 14);
        assert_eq!(crater.height(), 14);
        // A symmetric stamp is its own mirror apart from the anchor.
        let mut stencil_a = Stencil::new(32, 32);
        let mut stencil_b = Stencil::new(32, 32);
        for x in 0..32 {
            for y in 0..32 {
                stencil_a.set_bits(x, y, cell::BRICK);
                stencil_b.set_bits(x, y, cell::BRICK);
            }
        }
        let a = crater.erase(&mut stencil_a, 16, 16, 0, 0);
        let b = crater.flipped().erase(&mut stencil_b, 16, 16, 0, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn lookup_is_total_over_all_behaviors() {
        let set = ResourceSet::builtin();
        for behavior in Behavior::ALL {
            assert!(set.of(behavior).frames >= 1);
        }
    }
}
