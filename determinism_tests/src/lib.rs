// Test-only level construction and trace capture for the end-to-end
// simulation tests.
//
// `LevelBuilder` assembles real `LevelDescriptor` values and `start()`
// boots a real `SimState` — every scenario in `tests/` exercises the
// same code paths as a live game session. The only test-specific code
// here is the per-tick fingerprinting used to compare two runs.
//
// See also: `tests/full_level.rs` for the scenarios.

use lemling_sim::config::SimConfig;
use lemling_sim::event::{SimEvent, SoundCue};
use lemling_sim::level::{LevelDescriptor, LevelObject, Rect, TerrainKind, TerrainSpan};
use lemling_sim::resources::ResourceSet;
use lemling_sim::sim::SimState;
use lemling_sim::types::{ObjectEffect, ObjectId};

/// Fluent builder for test levels.
pub struct LevelBuilder {
    level: LevelDescriptor,
    next_object: u8,
}

impl LevelBuilder {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            level: LevelDescriptor {
                name: name.into(),
                width,
                height,
                terrain: Vec::new(),
                entries: Vec::new(),
                objects: Vec::new(),
                max_fall_distance: 56,
                num_lemmings: 1,
                num_to_rescue: 1,
                release_rate: 99,
                time_limit_seconds: 600,
                superlemming: false,
            },
            next_object: 1,
        }
    }

    /// Solid brick floor from `y` down to the bottom edge.
    pub fn floor(self, y: i32) -> Self {
        let width = self.level.width;
        let height = self.level.height;
        self.span(Rect::new(0, y, width, height - y as u32), TerrainKind::Brick)
    }

    pub fn span(mut self, rect: Rect, kind: TerrainKind) -> Self {
        self.level.terrain.push(TerrainSpan { rect, kind });
        self
    }

    pub fn entry(mut self, x: i32, y: i32) -> Self {
        self.level.entries.push((x, y));
        self
    }

    pub fn exit(mut self, rect: Rect) -> Self {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        self.level.objects.push(LevelObject {
            id,
            effect: ObjectEffect::Exit,
            cue: SoundCue::Exit,
            region: rect,
        });
        self
    }

    pub fn water(mut self, rect: Rect) -> Self {
        let id = ObjectId(self.next_object);
        self.next_object += 1;
        self.level.objects.push(LevelObject {
            id,
            effect: ObjectEffect::Drown,
            cue: SoundCue::Drown,
            region: rect,
        });
        self
    }

    pub fn lemmings(mut self, total: u32, to_rescue: u32) -> Self {
        self.level.num_lemmings = total;
        self.level.num_to_rescue = to_rescue;
        self
    }

    pub fn release_rate(mut self, rate: u32) -> Self {
        self.level.release_rate = rate;
        self
    }

    pub fn max_fall(mut self, pixels: u32) -> Self {
        self.level.max_fall_distance = pixels;
        self
    }

    pub fn time_limit(mut self, seconds: u32) -> Self {
        self.level.time_limit_seconds = seconds;
        self
    }

    pub fn build(self) -> LevelDescriptor {
        self.level
    }
}

/// Boot a live session with the built-in resources and default config.
pub fn start(level: LevelDescriptor) -> SimState {
    SimState::new(level, ResourceSet::builtin(), SimConfig::default())
        .expect("test level must validate")
}

/// Run `ticks` ticks, collecting every emitted event.
pub fn run_ticks(sim: &mut SimState, ticks: u32) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        sim.tick(&mut events);
    }
    events
}

/// One line describing every live agent: id, position, direction,
/// behavior. Equal fingerprints at every tick mean equal traces.
pub fn population_fingerprint(sim: &SimState) -> String {
    sim.population()
        .iter()
        .map(|l| format!("{}@{},{}:{:?}:{:?}", l.id.0, l.x, l.y, l.dir, l.behavior))
        .collect::<Vec<_>>()
        .join(";")
}

/// Run `ticks` ticks, capturing the fingerprint after each one.
pub fn run_and_fingerprint(sim: &mut SimState, ticks: u32) -> Vec<String> {
    let mut trace = Vec::with_capacity(ticks as usize);
    let mut events = Vec::new();
    for _ in 0..ticks {
        sim.tick(&mut events);
        trace.push(population_fingerprint(sim));
    }
    trace
}
