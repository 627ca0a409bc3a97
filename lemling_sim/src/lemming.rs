// The per-agent behavioral state machine — the heart of the simulation.
//
// A `Lemming` is a pixel position, a facing, a `Behavior`, and a handful
// of counters whose meaning depends on the behavior. Once per tick every
// live agent runs `animate()` against the shared world context, in a
// fixed priority order:
//
//   1. explosion countdown (may convert the agent to a bomber),
//   2. level-border clamp (turn around at the horizontal edges),
//   3. per-behavior physics (one arm per variant, explicit dispatch),
//   4. trap/exit stencil override,
//   5. animation frame advance, with end-of-animation transitions for
//      once-mode behaviors.
//
// ## Coordinate convention
//
// (x, y) is the agent's foot pixel, and a grounded agent's foot pixel is
// *inside* the top brick of whatever it stands on. All probes below are
// phrased against that convention; `walk()` documents the one wrinkle
// (a one-pixel air lip under a raised ledge still reads as a rise, which
// is exactly the shape a builder-step seam has).
//
// **Critical constraint: determinism.** `animate()` reads only the
// context it is handed. No randomness, no wall clock, no global state;
// two agents with equal fields produce equal successors against equal
// worlds.
//
// See also: `population.rs` for spawn/sweep ordering, `sim.rs` for the
// skill-request gate that feeds `assign_skill`.

use serde::{Deserialize, Serialize};

use crate::event::{SimEvent, SimEventKind, SoundCue};
use crate::level::LevelDescriptor;
use crate::resources::{AnimMode, ResourceSet, TIME_SCALE};
use crate::stencil::{Stencil, cell};
use crate::types::{Behavior, Direction, LemmingId, ObjectEffect, Skill};

/// Walker horizontal speed, px per tick.
const WALKER_STEP: i32 = 1;
/// Faller vertical speed, px per tick.
const FALLER_STEP: u32 = 3;
/// Floater vertical speed, px per tick.
const FLOATER_STEP: u32 = 1;
/// Largest drop a walker absorbs by just stepping down.
const FALL_TOLERANCE: u32 = 8;
/// Accumulated fall at which a floater's umbrella opens.
const FLOAT_TRIGGER: u32 = 32;
/// Largest rise a walker steps up instantly.
const RISE_INSTANT_MAX: u32 = 2;
/// Largest rise handled by a jump; anything taller is an obstacle.
const RISE_JUMP_MAX: u32 = 13;
/// Jump ascent speed, px per tick.
const JUMPER_ASCENT: u32 = 2;
/// Headroom a climber needs above the wall top to hoist itself up.
const CLIMB_HEADROOM: u32 = 10;
/// Steps in a full staircase.
const BUILDER_STEPS: u32 = 12;
/// Step at which the running-out warning cue fires.
const BUILDER_WARN_STEP: u32 = 9;
/// Length of one staircase brick, px.
const BUILDER_BRICK_LEN: u32 = 6;
/// Tick within the builder cycle at which the brick is laid.
const BUILDER_PAINT_TICK: u32 = 9 * TIME_SCALE;
/// Horizontal / vertical advance per completed builder cycle.
const BUILDER_DX: i32 = 4;
const BUILDER_DY: i32 = 2;
/// Horizontal advance per basher or miner swing.
const SWING_DX: i32 = 2;

/// Everything `animate()` may read or mutate besides the agent itself.
/// Built fresh by the sim for each agent pass; never stored.
pub(crate) struct AgentContext<'a> {
    pub stencil: &'a mut Stencil,
    pub resources: &'a ResourceSet,
    pub level: &'a LevelDescriptor,
    pub tick: u64,
    pub ticks_per_second: u32,
    /// Fuse length applied by a bomber/nuke assignment, in ticks.
    pub fuse_ticks: u32,
    pub events: &'a mut Vec<SimEvent>,
}

impl AgentContext<'_> {
    fn emit(&mut self, kind: SimEventKind) {
        self.events.push(SimEvent {
            tick: self.tick,
            kind,
        });
    }

    fn emit_sound(&mut self, cue: SoundCue) {
        self.emit(SimEventKind::Sound(cue));
    }
}

/// One simulated agent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lemming {
    pub id: LemmingId,
    /// Foot pixel.
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub behavior: Behavior,
    /// Ticks into the current animation cycle.
    frame_tick: u32,
    /// Behavior-dependent counter: accumulated fall pixels for fallers,
    /// remaining ascent for jumpers, steps laid for builders.
    counter: u32,
    /// Remaining fuse ticks, if a bomber/nuke assignment is live.
    explode_ticks: Option<u32>,
    pub can_float: bool,
    pub can_climb: bool,
    /// Marked for removal by the post-tick sweep.
    pub has_died: bool,
    /// Reached the exit; removed and counted by the sweep.
    pub has_left: bool,
    /// Has received the forced nuke assignment (idempotence guard).
    pub nuke: bool,
    /// Anchor of the live stopper field, if one is stamped.
    stopper_field: Option<(i32, i32)>,
}

impl Lemming {
    /// A freshly released agent: falling, facing right.
    pub fn new(id: LemmingId, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            dir: Direction::Right,
            behavior: Behavior::Faller,
            frame_tick: 0,
            counter: 0,
            explode_ticks: None,
            can_float: false,
            can_climb: false,
            has_died: false,
            has_left: false,
            nuke: false,
            stopper_field: None,
        }
    }

    /// Seconds left on the fuse, for the countdown digit overlay.
    pub fn countdown_seconds(&self, ticks_per_second: u32) -> Option<u32> {
        self.explode_ticks
            .map(|ticks| ticks.div_ceil(ticks_per_second))
    }

    /// Whether a stopper field is currently stamped for this agent.
    pub fn has_stopper_field(&self) -> bool {
        self.stopper_field.is_some()
    }

    /// Switch behavior, resetting the animation cycle and counter.
    fn become_behavior(&mut self, behavior: Behavior) {
        self.behavior = behavior;
        self.frame_tick = 0;
        self.counter = 0;
    }

    /// Advance the agent by one simulation tick.
    pub(crate) fn animate(&mut self, ctx: &mut AgentContext<'_>) {
        if self.has_died || self.has_left {
            return;
        }

        self.tick_fuse(ctx);
        self.clamp_to_borders(ctx);

        match self.behavior {
            Behavior::Walker => self.walk(ctx),
            Behavior::Faller => self.fall(ctx, FALLER_STEP, true),
            Behavior::FloaterStart => self.fall(ctx, FALLER_STEP, false),
            Behavior::Floater => self.fall(ctx, FLOATER_STEP, false),
            Behavior::Jumper => self.jump(ctx),
            Behavior::Climber => self.climb(ctx),
            Behavior::Builder => self.build(ctx),
            Behavior::Digger => self.dig(ctx),
            Behavior::Basher => self.bash(ctx),
            Behavior::Miner => self.mine(ctx),
            Behavior::Stopper | Behavior::BomberStopper => self.block(ctx),
            // Oh-no pose: stand, or keep dropping if the floor is gone.
            // Landing never changes the behavior; the fuse already burnt.
            Behavior::Bomber => {
                let free = ctx.stencil.free_below(self.x, self.y, FALLER_STEP);
                self.y += free.min(FALLER_STEP) as i32;
            }
            // ClimberToWalker hangs in place until the hoist finishes;
            // terminal behaviors only animate out.
            Behavior::ClimberToWalker
            | Behavior::BuilderEnd
            | Behavior::Exiting
            | Behavior::Splat
            | Behavior::Drowning
            | Behavior::Trapped => {}
        }

        self.check_objects(ctx);
        self.advance_frame(ctx);
    }

    // -- step 1: explosion countdown ------------------------------------

    fn tick_fuse(&mut self, ctx: &mut AgentContext<'_>) {
        let Some(remaining) = self.explode_ticks else {
            return;
        };
        let remaining = remaining.saturating_sub(1);
        self.explode_ticks = Some(remaining);

        if remaining == 0 {
            self.explode_ticks = None;
            if self.behavior.is_terminal() {
                // Already doomed by other means; the fuse fizzles.
                return;
            }
            // A stopper's field stays stamped through the oh-no frames;
            // it is cleared at detonation.
            self.become_behavior(Behavior::Bomber);
        } else if remaining % ctx.ticks_per_second == 0 {
            let seconds = remaining / ctx.ticks_per_second;
            ctx.emit(SimEventKind::CountdownDigit {
                lemming: self.id,
                seconds,
            });
        }
    }

    // -- step 2: border clamp -------------------------------------------

    fn clamp_to_borders(&mut self, ctx: &AgentContext<'_>) {
        let width = ctx.stencil.width() as i32;
        if self.x < 0 {
            self.x = 0;
            self.dir = Direction::Right;
        } else if self.x >= width {
            self.x = width - 1;
            self.dir = Direction::Left;
        }
    }

    // -- step 3: per-behavior physics -----------------------------------

    /// True if the stopper field at the probed cell turns an agent moving
    /// in `dir` back. The two half-fields are direction-selective so an
    /// agent standing inside the field can still walk out of it.
    fn stopper_blocks(bits: u32, dir: Direction) -> bool {
        match dir {
            Direction::Right => bits & cell::STOPPER_LEFT != 0,
            Direction::Left => bits & cell::STOPPER_RIGHT != 0,
            Direction::None => false,
        }
    }

    /// How many pixels the foot would rise when stepping to column `x2`.
    /// Zero means level ground or a drop. A raised ledge with one pixel
    /// of air under the foot row still reads as a rise, which is the
    /// exact shape of a builder-step seam.
    fn rise_to(stencil: &Stencil, x2: i32, y: i32) -> u32 {
        let limit = RISE_JUMP_MAX + 2;
        if stencil.is_solid(x2, y) {
            stencil.rise_at(x2, y, limit).saturating_sub(1)
        } else if stencil.is_solid(x2, y - 1) {
            stencil.rise_at(x2, y - 1, limit)
        } else {
            0
        }
    }

    fn walk(&mut self, ctx: &mut AgentContext<'_>) {
        let x2 = self.x + self.dir.dx() * WALKER_STEP;
        if Self::stopper_blocks(ctx.stencil.get(x2, self.y), self.dir) {
            self.dir = self.dir.flipped();
            return;
        }

        let rise = Self::rise_to(ctx.stencil, x2, self.y);
        if rise > RISE_JUMP_MAX {
            // A wall: climb it or turn back.
            if self.can_climb {
                self.become_behavior(Behavior::Climber);
            } else {
                self.dir = self.dir.flipped();
            }
        } else if rise > RISE_INSTANT_MAX {
            self.x = x2;
            self.become_behavior(Behavior::Jumper);
            self.counter = rise;
        } else if rise > 0 {
            self.x = x2;
            self.y -= rise as i32;
        } else if ctx.stencil.is_solid(x2, self.y) {
            // Level ground.
            self.x = x2;
        } else {
            // A drop: step down a slope, or start falling.
            let free = ctx.stencil.free_below(x2, self.y, FALL_TOLERANCE + 1);
            self.x = x2;
            if free > FALL_TOLERANCE {
                self.become_behavior(Behavior::Faller);
            } else {
                self.y += free as i32;
            }
        }
    }

    /// Shared descent for fallers, floaters, and airborne bombers.
    /// `splats` selects the landing rule: fallers compare accumulated
    /// fall against the level's limit, floaters always land soft.
    fn fall(&mut self, ctx: &mut AgentContext<'_>, step: u32, splats: bool) {
        if self.behavior == Behavior::Faller
            && self.can_float
            && self.counter >= FLOAT_TRIGGER
        {
            self.become_behavior(Behavior::FloaterStart);
            return;
        }

        let free = ctx.stencil.free_below(self.x, self.y, step + 1);
        if free == 0 && ctx.stencil.is_solid(self.x, self.y) {
            self.land(ctx, splats);
            return;
        }
        if self.y >= ctx.stencil.height() as i32 {
            // Fell out of the level.
            ctx.emit_sound(SoundCue::Die);
            self.has_died = true;
            return;
        }
        if free <= step {
            self.y += free as i32;
            self.counter = self.counter.saturating_add(free);
            self.land(ctx, splats);
        } else {
            // free is either step + 1 or the off-grid sentinel; both mean
            // a full step of open air.
            self.y += step as i32;
            self.counter = self.counter.saturating_add(step);
        }
    }

    fn land(&mut self, ctx: &mut AgentContext<'_>, splats: bool) {
        // Boundary is inclusive on the survive side: a fall of exactly
        // the limit is walked off.
        if splats && self.counter > ctx.level.max_fall_distance {
            ctx.emit_sound(SoundCue::Splat);
            self.become_behavior(Behavior::Splat);
        } else {
            self.become_behavior(Behavior::Walker);
        }
    }

    fn jump(&mut self, ctx: &mut AgentContext<'_>) {
        // A field stamped mid-jump still turns the jumper back.
        if Self::stopper_blocks(ctx.stencil.get(self.x, self.y), self.dir) {
            self.dir = self.dir.flipped();
            self.become_behavior(Behavior::Walker);
            return;
        }
        // The jumper rides up the ledge face it is stepping onto; the
        // ledge column itself is solid, so there is no clearance probe —
        // the ascent was already bounded when the jump started.
        let ascent = self.counter.min(JUMPER_ASCENT);
        self.y -= ascent as i32;
        self.counter -= ascent;
        if self.counter == 0 {
            self.become_behavior(Behavior::Walker);
        }
    }

    fn climb(&mut self, ctx: &mut AgentContext<'_>) {
        let wall_x = self.x + self.dir.dx();
        // One pixel every other tick.
        if self.frame_tick % 2 == 0 {
            return;
        }
        // The off-grid reads above row 0 are "solid", so the top edge
        // must end the ascent explicitly or a top-flush wall would be
        // climbed forever.
        if self.y - 1 >= 0 && ctx.stencil.is_solid(wall_x, self.y - 1) {
            self.y -= 1;
            return;
        }
        // Wall top (or the level's top edge) reached: hoist if there is
        // headroom on the plateau, otherwise peel off backwards.
        if ctx.stencil.free_above(wall_x, self.y, CLIMB_HEADROOM) >= CLIMB_HEADROOM {
            self.become_behavior(Behavior::ClimberToWalker);
        } else {
            self.dir = self.dir.flipped();
            self.become_behavior(Behavior::Faller);
        }
    }

    fn build(&mut self, ctx: &mut AgentContext<'_>) {
        let res = ctx.resources.of(Behavior::Builder);
        if self.frame_tick == BUILDER_PAINT_TICK {
            // Lay a two-row brick; the end-of-cycle move puts the foot
            // inside its top row, and the two-row thickness keeps each
            // seam solid so walkers can follow the staircase up.
            for row in 1..=BUILDER_DY {
                ctx.stencil
                    .paint_step(self.x, self.y - row, self.dir.dx(), BUILDER_BRICK_LEN);
            }
        } else if self.frame_tick == res.cycle_ticks() - 1 {
            self.x += self.dir.dx() * BUILDER_DX;
            self.y -= BUILDER_DY;
            self.counter += 1;

            let head = ctx.stencil.get(self.x, self.y - 1);
            let here = ctx.stencil.get(self.x, self.y);
            if head & cell::BRICK != 0 || Self::stopper_blocks(here, self.dir) {
                // Bumped a ceiling, wall, or stopper field.
                ctx.emit_sound(SoundCue::HitObstruction);
                self.dir = self.dir.flipped();
                self.become_behavior(Behavior::Walker);
            } else if self.counter == BUILDER_WARN_STEP {
                ctx.emit_sound(SoundCue::BuilderWarning);
            } else if self.counter >= BUILDER_STEPS {
                self.become_behavior(Behavior::BuilderEnd);
            }
        }
    }

    fn dig(&mut self, ctx: &mut AgentContext<'_>) {
        // The pit floor can be removed from under a digger by a basher
        // or an explosion.
        if !ctx.stencil.is_solid(self.x, self.y) && !ctx.stencil.is_solid(self.x, self.y + 1) {
            self.become_behavior(Behavior::Faller);
            return;
        }
        let res = ctx.resources.of(Behavior::Digger);
        if self.frame_tick != res.mask_step {
            return;
        }
        let Some(masks) = res.masks.as_ref() else {
            return;
        };
        let stamp = masks.stamp(Direction::None);
        if stamp.check(ctx.stencil, self.x, self.y, 0, cell::STEEL) {
            ctx.emit_sound(SoundCue::HitObstruction);
            self.become_behavior(Behavior::Walker);
            return;
        }
        if !stamp.overlaps_terrain(ctx.stencil, self.x, self.y, 0) {
            self.become_behavior(Behavior::Faller);
            return;
        }
        stamp.erase(ctx.stencil, self.x, self.y, 0, cell::STEEL);
        self.y += stamp.height() as i32;
    }

    /// Stencil bits that forbid a horizontal destructive skill working in
    /// direction `dir`: steel always, plus the matching one-way wall.
    fn dig_filter(dir: Direction) -> u32 {
        cell::STEEL
            | match dir {
                Direction::Left => cell::NO_DIG_LEFT,
                Direction::Right => cell::NO_DIG_RIGHT,
                Direction::None => 0,
            }
    }

    fn bash(&mut self, ctx: &mut AgentContext<'_>) {
        if !ctx.stencil.is_solid(self.x, self.y) {
            self.become_behavior(Behavior::Faller);
            return;
        }
        let res = ctx.resources.of(Behavior::Basher);
        if self.frame_tick != res.mask_step {
            return;
        }
        let Some(masks) = res.masks.as_ref() else {
            return;
        };
        let filter = Self::dig_filter(self.dir);
        let stamp = masks.stamp(self.dir);
        if Self::stopper_blocks(ctx.stencil.get(self.x + self.dir.dx() * SWING_DX, self.y), self.dir)
        {
            self.dir = self.dir.flipped();
            self.become_behavior(Behavior::Walker);
            return;
        }
        if masks.check_stamp(self.dir).check(ctx.stencil, self.x, self.y, 0, filter) {
            ctx.emit_sound(SoundCue::HitObstruction);
            self.dir = self.dir.flipped();
            self.become_behavior(Behavior::Walker);
            return;
        }
        if !stamp.overlaps_terrain(ctx.stencil, self.x, self.y, 0) {
            // Broke through; walk on.
            self.become_behavior(Behavior::Walker);
            return;
        }
        stamp.erase(ctx.stencil, self.x, self.y, 0, filter);
        self.x += self.dir.dx() * SWING_DX;
    }

    fn mine(&mut self, ctx: &mut AgentContext<'_>) {
        let res = ctx.resources.of(Behavior::Miner);
        if self.frame_tick != res.mask_step {
            // Between swings a miner can still lose its floor.
            if ctx.stencil.free_below(self.x, self.y, 3) >= 3 {
                self.become_behavior(Behavior::Faller);
            }
            return;
        }
        let Some(masks) = res.masks.as_ref() else {
            return;
        };
        let filter = Self::dig_filter(self.dir);
        let stamp = masks.stamp(self.dir);
        if Self::stopper_blocks(ctx.stencil.get(self.x + self.dir.dx() * SWING_DX, self.y), self.dir)
        {
            self.dir = self.dir.flipped();
            self.become_behavior(Behavior::Walker);
            return;
        }
        if masks.check_stamp(self.dir).check(ctx.stencil, self.x, self.y, 0, filter) {
            ctx.emit_sound(SoundCue::HitObstruction);
            self.dir = self.dir.flipped();
            self.become_behavior(Behavior::Walker);
            return;
        }
        stamp.erase(ctx.stencil, self.x, self.y, 0, filter);
        // A swing carries the miner down its gallery.
        self.x += self.dir.dx() * SWING_DX;
        self.y += 1;
        if !stamp.overlaps_terrain(ctx.stencil, self.x, self.y, 0)
            && !ctx.stencil.is_solid(self.x, self.y)
        {
            self.become_behavior(Behavior::Faller);
        }
    }

    fn block(&mut self, ctx: &mut AgentContext<'_>) {
        // A stopper only ever leaves its post when the ground under it is
        // dug or blasted away.
        if !ctx.stencil.is_solid(self.x, self.y) {
            self.release_stopper_field(ctx);
            self.become_behavior(Behavior::Faller);
        }
    }

    /// Clear the stamped stopper field, if one is live. Every stamp gets
    /// exactly one clear, through here.
    fn release_stopper_field(&mut self, ctx: &mut AgentContext<'_>) {
        let Some((fx, fy)) = self.stopper_field.take() else {
            return;
        };
        if let Some(masks) = ctx.resources.of(Behavior::Stopper).masks.as_ref() {
            masks.stamp(Direction::None).clear_stopper(ctx.stencil, fx, fy);
        }
    }

    // -- step 4: trap/exit override -------------------------------------

    fn check_objects(&mut self, ctx: &mut AgentContext<'_>) {
        if self.has_died || self.behavior.is_terminal() || self.behavior == Behavior::Bomber {
            return;
        }
        let bits = ctx.stencil.get(self.x, self.y);
        if bits & cell::TRAP != 0 {
            let Some(object) = ctx.level.object(cell::object(bits)) else {
                return;
            };
            let cue = object.cue;
            match object.effect {
                ObjectEffect::Drown => {
                    ctx.emit_sound(cue);
                    self.release_stopper_field(ctx);
                    self.become_behavior(Behavior::Drowning);
                }
                ObjectEffect::Die => {
                    ctx.emit_sound(cue);
                    self.release_stopper_field(ctx);
                    self.become_behavior(Behavior::Trapped);
                }
                ObjectEffect::Exit => {}
            }
        } else if bits & cell::EXIT != 0 && self.behavior.can_exit() {
            if let Some(object) = ctx.level.object(cell::object(bits)) {
                ctx.emit_sound(object.cue);
            }
            self.become_behavior(Behavior::Exiting);
        }
    }

    // -- step 5: frame advance ------------------------------------------

    fn advance_frame(&mut self, ctx: &mut AgentContext<'_>) {
        if self.has_died || self.has_left {
            return;
        }
        let res = ctx.resources.of(self.behavior);
        self.frame_tick += 1;
        if self.frame_tick < res.cycle_ticks() {
            return;
        }
        match res.mode {
            AnimMode::Loop => self.frame_tick = 0,
            AnimMode::Once => {
                self.frame_tick = res.cycle_ticks() - 1;
                self.finish_once(ctx);
            }
        }
    }

    /// End-of-animation transition for once-mode behaviors.
    fn finish_once(&mut self, ctx: &mut AgentContext<'_>) {
        match self.behavior {
            Behavior::ClimberToWalker => {
                // Hoist complete: step onto the plateau.
                self.x += self.dir.dx();
                self.become_behavior(Behavior::Walker);
            }
            Behavior::FloaterStart => self.become_behavior(Behavior::Floater),
            Behavior::BuilderEnd => self.become_behavior(Behavior::Walker),
            Behavior::Bomber => self.detonate(ctx),
            Behavior::Exiting => self.has_left = true,
            Behavior::Splat | Behavior::Drowning | Behavior::Trapped => self.has_died = true,
            _ => {}
        }
    }

    fn detonate(&mut self, ctx: &mut AgentContext<'_>) {
        self.release_stopper_field(ctx);
        if let Some(masks) = ctx.resources.of(Behavior::Bomber).masks.as_ref() {
            masks
                .stamp(Direction::None)
                .erase(ctx.stencil, self.x, self.y, 0, cell::STEEL);
        }
        ctx.emit(SimEventKind::Explosion {
            x: self.x,
            y: self.y,
        });
        ctx.emit_sound(SoundCue::Explosion);
        self.has_died = true;
    }

    // -- skill assignment ------------------------------------------------

    /// Apply a validated skill request. Returns whether the request was
    /// accepted; a refusal is a normal outcome the caller turns into a
    /// `SkillRefused` cue, never an error.
    pub(crate) fn assign_skill(&mut self, skill: Skill, ctx: &mut AgentContext<'_>) -> bool {
        if self.has_died || self.has_left {
            return false;
        }
        match skill {
            // Permanent abilities: assignable to any live agent, once.
            Skill::Climber => {
                if self.can_climb || self.behavior.is_terminal() {
                    return false;
                }
                self.can_climb = true;
                true
            }
            Skill::Floater => {
                if self.can_float || self.behavior.is_terminal() {
                    return false;
                }
                self.can_float = true;
                true
            }
            Skill::Bomber | Skill::Nuke => self.start_fuse(skill, ctx),
            Skill::Stopper => {
                if !self.behavior.can_change_skill() || !ctx.stencil.is_solid(self.x, self.y) {
                    return false;
                }
                if let Some(masks) = ctx.resources.of(Behavior::Stopper).masks.as_ref() {
                    let stamp = masks.stamp(Direction::None);
                    // Overlapping fields would wipe each other's shared
                    // columns when the first stopper is released.
                    if stamp.check(ctx.stencil, self.x, self.y, 0, cell::STOPPER_ANY) {
                        return false;
                    }
                    stamp.set_stopper(ctx.stencil, self.x, self.y);
                    self.stopper_field = Some((self.x, self.y));
                }
                self.become_behavior(Behavior::Stopper);
                true
            }
            Skill::Builder => self.change_working_skill(Behavior::Builder),
            Skill::Basher => self.change_working_skill(Behavior::Basher),
            Skill::Miner => self.change_working_skill(Behavior::Miner),
            Skill::Digger => self.change_working_skill(Behavior::Digger),
        }
    }

    fn change_working_skill(&mut self, behavior: Behavior) -> bool {
        if !self.behavior.can_change_skill() || self.behavior == behavior {
            return false;
        }
        self.become_behavior(behavior);
        true
    }

    fn start_fuse(&mut self, skill: Skill, ctx: &mut AgentContext<'_>) -> bool {
        if skill == Skill::Nuke {
            if self.nuke {
                return false;
            }
            self.nuke = true;
            if self.behavior.is_terminal() {
                // Doomed anyway; accept as a no-op so the nuke sweep
                // never stalls on a dying agent.
                return true;
            }
        } else {
            if self.explode_ticks.is_some() {
                return false;
            }
            if self.behavior.is_terminal() {
                // Doomed anyway; accept without arming a fuse.
                return true;
            }
        }
        if self.explode_ticks.is_none() {
            self.explode_ticks = Some(ctx.fuse_ticks);
            ctx.emit(SimEventKind::CountdownDigit {
                lemming: self.id,
                seconds: ctx.fuse_ticks.div_ceil(ctx.ticks_per_second),
            });
            if self.behavior == Behavior::Stopper {
                // Keep the field stamped while the fuse burns.
                self.behavior = Behavior::BomberStopper;
                self.frame_tick = 0;
            }
        }
        true
    }
}
