// lemling_sim — pure Rust Lemmings-style simulation library.
//
// This crate contains all simulation logic for Lemling: the pixel-level
// collision stencil, the destructive stamp masks, the per-agent
// behavioral state machine, the population and release gate, the skill
// assignment / replay log, and the fixed-timestep clock. It has zero
// rendering or audio dependencies and can be tested, benchmarked, and
// run headless.
//
// Module overview:
// - `sim.rs`:        Top-level SimState, tick loop, input/event processing.
// - `stencil.rs`:    Dense per-pixel obstacle grid (the level's spatial truth).
// - `mask.rs`:       Stamp bitmaps — destructive erasure, stopper fields, blocked-action checks.
// - `lemming.rs`:    The per-agent state machine (~20 behaviors, one match arm each).
// - `population.rs`: Spawn gate, entry rotation, post-tick sweep, nuke ordering.
// - `replay.rs`:     Input event log — record on accept, re-inject on playback.
// - `clock.rs`:      Fixed-timestep frame driver and tick-driven time limit.
// - `level.rs`:      LevelDescriptor — the terrain provider contract.
// - `resources.rs`:  Per-behavior animation/mask tables — the resource provider contract.
// - `event.rs`:      Fire-and-forget output cues (sound, particles, counters).
// - `config.rs`:     Engine tuning scalars.
// - `types.rs`:      Agent/object ids, Direction, Behavior, Skill.
//
// A front end wraps this library for rendering and input; that boundary
// is enforced at the compiler level — this crate cannot depend on frame
// timing, sprites, or audio.
//
// **Critical constraint: determinism.** The simulation is a pure
// function: `(state, inputs) -> (new_state, events)`. There is no
// randomness at all — not even a seeded PRNG — no system time, no OS
// entropy, and no `HashMap` in simulation state. Use `BTreeMap` for
// ordered collections.

pub mod clock;
pub mod config;
pub mod event;
pub mod lemming;
pub mod level;
pub mod mask;
pub mod population;
pub mod replay;
pub mod resources;
pub mod sim;
pub mod stencil;
pub mod types;
