// The world context and tick entry point.
//
// `SimState` owns everything a running level is: stencil, population,
// clock, resource tables, replay log, counters. There is no global
// mutable state anywhere in this crate; two `SimState` values built from
// the same level and fed the same inputs walk through bit-identical
// histories.
//
// ## Tick order
//
// `tick()` runs one simulation step in a fixed order: queued inputs
// (live or replayed) → entry hatch / spawn gate → per-agent animate in
// spawn order → sweep → nuke stagger → time-limit countdown. The order
// is part of the determinism contract; reordering any two phases changes
// traces.
//
// ## Input paths
//
// All player intent funnels through the public input methods
// (`try_set_skill`, `set_release_rate`, `nuke`, `set_scroll`). Unpaused,
// they apply immediately — which is the same injection point playback
// uses, the boundary between two ticks. Paused, they queue and apply at
// the start of the next real tick. In playback mode live input is
// ignored wholesale.
//
// See also: `lemming.rs` for what one agent does inside the tick,
// `replay.rs` for the log being fed or drained here.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::clock::Clock;
use crate::config::SimConfig;
use crate::event::{SimEvent, SimEventKind, SoundCue};
use crate::lemming::AgentContext;
use crate::level::{LevelDescriptor, LevelError};
use crate::population::Population;
use crate::replay::{InputMode, ReplayEventKind, ReplayLog};
use crate::resources::{ResourceError, ResourceSet};
use crate::stencil::Stencil;
use crate::types::{LemmingId, Skill};

/// Fatal problems constructing or snapshotting a sim. Nothing in here
/// occurs during a tick; a started level only ever reports outcomes
/// through events.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// How a finished level turned out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Still running.
    Open,
    Won,
    Lost,
}

/// One running (or finished) level session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimState {
    config: SimConfig,
    level: LevelDescriptor,
    stencil: Stencil,
    population: Population,
    resources: ResourceSet,
    clock: Clock,
    replay: ReplayLog,
    input_mode: InputMode,
    /// Inputs received while paused, applied at the next real tick.
    pending: Vec<ReplayEventKind>,
    /// Ticks until the entry hatch finishes opening.
    door_countdown: u32,
    door_open: bool,
    nuke_active: bool,
    rescued: u32,
    scroll_x: i32,
    outcome: Outcome,
}

impl SimState {
    /// Build a session from a level and a resource set. Both are
    /// validated here; a sim that constructs successfully never fails
    /// mid-tick.
    pub fn new(
        level: LevelDescriptor,
        resources: ResourceSet,
        config: SimConfig,
    ) -> Result<Self, SimError> {
        level.validate()?;
        resources.validate()?;
        let stencil = level.build_stencil();
        let population = Population::new(level.num_lemmings, level.release_rate, level.entries.len());
        let clock = Clock::new(
            config.ticks_per_second,
            level.time_limit_seconds,
            level.superlemming,
        );
        log::debug!(
            "level '{}' starting: {} lemmings, rescue {}, rate {}",
            level.name,
            level.num_lemmings,
            level.num_to_rescue,
            level.release_rate
        );
        Ok(Self {
            door_countdown: config.entry_open_ticks,
            config,
            level,
            stencil,
            population,
            resources,
            clock,
            replay: ReplayLog::new(),
            input_mode: InputMode::Record,
            pending: Vec::new(),
            door_open: false,
            nuke_active: false,
            rescued: 0,
            scroll_x: 0,
            outcome: Outcome::Open,
        })
    }

    /// Rebuild the session for playback of a recorded log: same level,
    /// same resources, fresh world, inputs drawn from the log.
    pub fn new_playback(
        level: LevelDescriptor,
        resources: ResourceSet,
        config: SimConfig,
        mut replay: ReplayLog,
    ) -> Result<Self, SimError> {
        let mut sim = Self::new(level, resources, config)?;
        replay.rewind();
        sim.replay = replay;
        sim.input_mode = InputMode::Playback;
        Ok(sim)
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    pub fn stencil(&self) -> &Stencil {
        &self.stencil
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn replay_log(&self) -> &ReplayLog {
        &self.replay
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn rescued(&self) -> u32 {
        self.rescued
    }

    pub fn scroll_x(&self) -> i32 {
        self.scroll_x
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn pause(&mut self, paused: bool) {
        self.clock.paused = paused;
    }

    /// Agents under the player cursor, oldest first.
    pub fn lemmings_under_cursor(&self, x: i32, y: i32) -> SmallVec<[LemmingId; 4]> {
        self.population.under_cursor(x, y, self.config.cursor_radius)
    }

    fn fuse_ticks(&self) -> u32 {
        self.config.bomber_fuse_seconds * self.config.ticks_per_second
    }

    // -- input methods ---------------------------------------------------

    /// Request a skill for an agent. Refusals are normal outcomes: the
    /// return value (and a `SkillRefused` cue) is all the caller gets.
    pub fn try_set_skill(&mut self, lemming: LemmingId, skill: Skill, events: &mut Vec<SimEvent>) -> bool {
        if self.input_mode == InputMode::Playback || self.outcome != Outcome::Open {
            return false;
        }
        let kind = ReplayEventKind::AssignSkill { lemming, skill };
        if self.clock.paused {
            // Queued; validated when the clock moves again.
            self.pending.push(kind);
            return self.population.get(lemming).is_some();
        }
        self.apply_event(kind, true, events)
    }

    pub fn set_release_rate(&mut self, rate: u32, events: &mut Vec<SimEvent>) {
        if self.input_mode == InputMode::Playback {
            return;
        }
        let kind = ReplayEventKind::SetReleaseRate(rate);
        if self.clock.paused {
            self.pending.push(kind);
        } else {
            self.apply_event(kind, true, events);
        }
    }

    /// Start the nuke sequence: spawning stops and every other tick one
    /// agent in spawn order receives the forced doom assignment.
    pub fn nuke(&mut self, events: &mut Vec<SimEvent>) {
        if self.input_mode == InputMode::Playback || self.nuke_active {
            return;
        }
        let kind = ReplayEventKind::Nuke;
        if self.clock.paused {
            self.pending.push(kind);
        } else {
            self.apply_event(kind, true, events);
        }
    }

    pub fn set_scroll(&mut self, x: i32, events: &mut Vec<SimEvent>) {
        if self.input_mode == InputMode::Playback {
            return;
        }
        let kind = ReplayEventKind::SetScroll(x);
        if self.clock.paused {
            self.pending.push(kind);
        } else {
            self.apply_event(kind, true, events);
        }
    }

    /// Apply one input event. `live` distinguishes fresh input (which is
    /// recorded when accepted) from playback injection (which is not).
    fn apply_event(&mut self, kind: ReplayEventKind, live: bool, events: &mut Vec<SimEvent>) -> bool {
        let tick = self.clock.tick;
        let accepted = match kind {
            ReplayEventKind::AssignSkill { lemming, skill } => {
                let accepted = match self.population.get_mut(lemming) {
                    Some(agent) => {
                        let mut ctx = AgentContext {
                            stencil: &mut self.stencil,
                            resources: &self.resources,
                            level: &self.level,
                            tick,
                            ticks_per_second: self.config.ticks_per_second,
                            fuse_ticks: self.config.bomber_fuse_seconds
                                * self.config.ticks_per_second,
                            events: &mut *events,
                        };
                        agent.assign_skill(skill, &mut ctx)
                    }
                    None => false,
                };
                let cue = if accepted {
                    SoundCue::SkillAssigned
                } else {
                    SoundCue::SkillRefused
                };
                events.push(SimEvent {
                    tick,
                    kind: SimEventKind::Sound(cue),
                });
                accepted
            }
            ReplayEventKind::SetReleaseRate(rate) => {
                self.population.set_release_rate(rate);
                true
            }
            ReplayEventKind::Nuke => {
                if self.nuke_active {
                    false
                } else {
                    log::debug!("nuke activated at tick {tick}");
                    self.nuke_active = true;
                    true
                }
            }
            ReplayEventKind::SetScroll(x) => {
                self.scroll_x = x;
                true
            }
        };
        if accepted && live {
            self.replay.record(tick, kind);
        }
        accepted
    }

    // -- the tick --------------------------------------------------------

    /// Run one simulation tick, appending everything that happened to
    /// `events`.
    pub fn tick(&mut self, events: &mut Vec<SimEvent>) {
        if self.outcome != Outcome::Open {
            return;
        }
        let tick = self.clock.tick;

        // Phase 1: inputs. Live queued input and replayed input are
        // mutually exclusive by mode.
        let due: Vec<ReplayEventKind> = match self.input_mode {
            InputMode::Record => std::mem::take(&mut self.pending),
            InputMode::Playback => self.replay.take_due(tick),
        };
        let live = self.input_mode == InputMode::Record;
        for kind in due {
            self.apply_event(kind, live, events);
        }

        // Phase 2: entry hatch and spawn gate.
        if !self.door_open {
            if self.door_countdown == 0 {
                self.door_open = true;
                events.push(SimEvent {
                    tick,
                    kind: SimEventKind::Sound(SoundCue::DoorOpen),
                });
            } else {
                self.door_countdown -= 1;
            }
        }
        if self.door_open && !self.nuke_active {
            if let Some((lemming, entry)) = self.population.tick_release() {
                if let Some(&(ex, ey)) = self.level.entries.get(entry) {
                    let id = lemming.id;
                    self.population.insert(lemming, ex, ey);
                    events.push(SimEvent {
                        tick,
                        kind: SimEventKind::LemmingSpawned { lemming: id, entry },
                    });
                }
            }
        }

        // Phase 3: animate every agent, in spawn order.
        {
            let mut ctx = AgentContext {
                stencil: &mut self.stencil,
                resources: &self.resources,
                level: &self.level,
                tick,
                ticks_per_second: self.config.ticks_per_second,
                fuse_ticks: self.config.bomber_fuse_seconds * self.config.ticks_per_second,
                events: &mut *events,
            };
            for agent in self.population.iter_mut() {
                agent.animate(&mut ctx);
            }
        }

        // Phase 4: sweep the dead and the rescued.
        let swept = self.population.sweep();
        for id in swept.rescued {
            self.rescued += 1;
            events.push(SimEvent {
                tick,
                kind: SimEventKind::LemmingRescued {
                    lemming: id,
                    total_rescued: self.rescued,
                },
            });
        }
        for id in swept.died {
            events.push(SimEvent {
                tick,
                kind: SimEventKind::LemmingDied { lemming: id },
            });
        }

        // Phase 5: nuke stagger, one forced assignment every other tick.
        if self.nuke_active && tick % 2 == 0 {
            let fuse_ticks = self.fuse_ticks();
            if let Some(agent) = self.population.first_not_nuked_mut() {
                let mut ctx = AgentContext {
                    stencil: &mut self.stencil,
                    resources: &self.resources,
                    level: &self.level,
                    tick,
                    ticks_per_second: self.config.ticks_per_second,
                    fuse_ticks,
                    events: &mut *events,
                };
                agent.assign_skill(Skill::Nuke, &mut ctx);
            }
        }

        // Phase 6: time limit.
        if self.clock.consume_time() && !self.config.cheat_no_time_limit {
            events.push(SimEvent {
                tick,
                kind: SimEventKind::TimeExpired,
            });
            self.finish(tick, events);
        }

        if self.outcome == Outcome::Open
            && self.door_open
            && self.population.is_empty()
            && (self.population.fully_spawned() || self.nuke_active)
        {
            self.finish(tick, events);
        }

        self.clock.tick += 1;
    }

    fn finish(&mut self, tick: u64, events: &mut Vec<SimEvent>) {
        self.outcome = if self.rescued >= self.level.num_to_rescue {
            Outcome::Won
        } else {
            Outcome::Lost
        };
        events.push(SimEvent {
            tick,
            kind: SimEventKind::LevelFinished {
                rescued: self.rescued,
                needed: self.level.num_to_rescue,
            },
        });
        log::debug!(
            "level '{}' finished at tick {tick}: {:?}, {}/{} rescued",
            self.level.name,
            self.outcome,
            self.rescued,
            self.level.num_to_rescue
        );
    }

    /// Advance one rendered frame: 1, 3, or 5 ticks depending on the
    /// clock mode, zero while paused.
    pub fn run_frame(&mut self, events: &mut Vec<SimEvent>) {
        for _ in 0..self.clock.ticks_per_frame() {
            if self.outcome != Outcome::Open {
                break;
            }
            self.tick(events);
        }
    }

    // -- snapshots -------------------------------------------------------

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }
}
