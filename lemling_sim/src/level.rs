// Level terrain provider contract.
//
// A `LevelDescriptor` is everything the sim needs from the (excluded)
// asset pipeline: rectangular terrain spans, entry points, the trap/exit
// object table, and the level scalars (lemming count, rescue quota,
// release rate, time limit, maximum survivable fall). `build_stencil()`
// rasterizes the description into a fresh `Stencil`; restarting a level
// just rasterizes again, which is what makes a restart bit-identical to
// the first attempt.
//
// Validation is fatal at load (`LevelError`): a level with no entries or
// an object region hanging outside the grid never starts.
//
// See also: `stencil.rs` for the cell bit layout, `sim.rs` which owns a
// copy of the scalars for the play session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::event::SoundCue;
use crate::stencil::{Stencil, cell};
use crate::types::{ObjectEffect, ObjectId};

/// Fatal problems with a level description.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level dimensions {width}x{height} are degenerate")]
    DegenerateSize { width: u32, height: u32 },
    #[error("level has no entry points")]
    NoEntries,
    #[error("entry {index} at ({x}, {y}) lies outside the level")]
    EntryOutOfBounds { index: usize, x: i32, y: i32 },
    #[error("object {0} region lies outside the level")]
    ObjectOutOfBounds(ObjectId),
    #[error("duplicate object id {0}")]
    DuplicateObject(ObjectId),
}

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && py >= self.y
            && px < self.x + self.width as i32
            && py < self.y + self.height as i32
    }

    fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width as i32 <= width as i32
            && self.y + self.height as i32 <= height as i32
    }
}

/// Kinds of terrain a span rasterizes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Ordinary destructible brick.
    Brick,
    /// Indestructible steel (still brick for collision purposes).
    Steel,
    /// Brick that leftward-working skills must not destroy.
    OneWayLeft,
    /// Brick that rightward-working skills must not destroy.
    OneWayRight,
}

impl TerrainKind {
    fn cell_bits(self) -> u32 {
        match self {
            TerrainKind::Brick => cell::BRICK,
            TerrainKind::Steel => cell::BRICK | cell::STEEL,
            TerrainKind::OneWayLeft => cell::BRICK | cell::NO_DIG_LEFT,
            TerrainKind::OneWayRight => cell::BRICK | cell::NO_DIG_RIGHT,
        }
    }
}

/// One rectangular terrain piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainSpan {
    pub rect: Rect,
    pub kind: TerrainKind,
}

/// One trap or exit object: a stencil region plus the behavior dispatched
/// when an agent's collision point enters it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    pub id: ObjectId,
    pub effect: ObjectEffect,
    pub cue: SoundCue,
    pub region: Rect,
}

/// Complete level description as supplied by the terrain provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub terrain: Vec<TerrainSpan>,
    /// Spawn points; the foot of a freshly released faller lands on the
    /// entry position itself.
    pub entries: Vec<(i32, i32)>,
    pub objects: Vec<LevelObject>,
    /// Largest accumulated fall (pixels) a regular faller survives.
    /// The boundary is inclusive on the survive side.
    pub max_fall_distance: u32,
    pub num_lemmings: u32,
    pub num_to_rescue: u32,
    /// 1..=99, higher is faster.
    pub release_rate: u32,
    pub time_limit_seconds: u32,
    /// Level-wide triple-speed flag.
    pub superlemming: bool,
}

impl LevelDescriptor {
    /// Validate the description. Called once by `SimState::new`; a level
    /// that fails here never starts.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width == 0 || self.height == 0 {
            return Err(LevelError::DegenerateSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.entries.is_empty() {
            return Err(LevelError::NoEntries);
        }
        for (index, &(x, y)) in self.entries.iter().enumerate() {
            if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
                return Err(LevelError::EntryOutOfBounds { index, x, y });
            }
        }
        let mut seen = BTreeMap::new();
        for object in &self.objects {
            if seen.insert(object.id, ()).is_some() {
                return Err(LevelError::DuplicateObject(object.id));
            }
            if !object.region.fits_in(self.width, self.height) {
                return Err(LevelError::ObjectOutOfBounds(object.id));
            }
        }
        Ok(())
    }

    /// Rasterize the terrain description into a fresh stencil. Spans
    /// paint in declaration order; object regions stamp their class bits
    /// and embedded id on top.
    pub fn build_stencil(&self) -> Stencil {
        let mut stencil = Stencil::new(self.width, self.height);
        for span in &self.terrain {
            let bits = span.kind.cell_bits();
            for dy in 0..span.rect.height as i32 {
                for dx in 0..span.rect.width as i32 {
                    stencil.set_bits(span.rect.x + dx, span.rect.y + dy, bits);
                }
            }
        }
        for object in &self.objects {
            let class = match object.effect {
                ObjectEffect::Exit => cell::EXIT,
                ObjectEffect::Drown | ObjectEffect::Die => cell::TRAP,
            };
            for dy in 0..object.region.height as i32 {
                for dx in 0..object.region.width as i32 {
                    let x = object.region.x + dx;
                    let y = object.region.y + dy;
                    let existing = stencil.get(x, y);
                    stencil.put(x, y, cell::with_object(existing | class, object.id));
                }
            }
        }
        stencil
    }

    /// Look up the object table entry for an embedded id.
    pub fn object(&self, id: ObjectId) -> Option<&LevelObject> {
        self.objects.iter().find(|object| object.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_level() -> LevelDescriptor {
        LevelDescriptor {
            name: "flat".into(),
            width: 100,
            height: 60,
            terrain: vec![TerrainSpan {
                rect: Rect::new(0, 50, 100, 4),
                kind: TerrainKind::Brick,
            }],
            entries: vec![(50, 10)],
            objects: Vec::new(),
            max_fall_distance: 56,
            num_lemmings: 10,
            num_to_rescue: 1,
            release_rate: 99,
            time_limit_seconds: 120,
            superlemming: false,
        }
    }

    #[test]
    fn flat_level_validates_and_rasterizes() {
        let level = flat_level();
        level.validate().unwrap();
        let stencil = level.build_stencil();
        assert!(stencil.is_solid(0, 50));
        assert!(stencil.is_solid(99, 53));
        assert!(!stencil.is_solid(50, 49));
    }

    #[test]
    fn no_entries_is_fatal() {
        let mut level = flat_level();
        level.entries.clear();
        assert_eq!(level.validate(), Err(LevelError::NoEntries));
    }

    #[test]
    fn entry_outside_grid_is_fatal() {
        let mut level = flat_level();
        level.entries.push((200, 10));
        assert!(matches!(
            level.validate(),
            Err(LevelError::EntryOutOfBounds { index: 1, .. })
        ));
    }

    #[test]
    fn object_regions_stamp_class_and_id() {
        let mut level = flat_level();
        level.objects.push(LevelObject {
            id: ObjectId(3),
            effect: ObjectEffect::Exit,
            cue: SoundCue::Exit,
            region: Rect::new(70, 44, 10, 6),
        });
        level.validate().unwrap();
        let stencil = level.build_stencil();
        let bits = stencil.get(75, 46);
        assert_ne!(bits & cell::EXIT, 0);
        assert_eq!(cell::object(bits), ObjectId(3));
    }

    #[test]
    fn duplicate_object_ids_are_fatal() {
        let mut level = flat_level();
        for _ in 0..2 {
            level.objects.push(LevelObject {
                id: ObjectId(1),
                effect: ObjectEffect::Die,
                cue: SoundCue::Trap,
                region: Rect::new(10, 40, 4, 4),
            });
        }
        assert_eq!(
            level.validate(),
            Err(LevelError::DuplicateObject(ObjectId(1)))
        );
    }

    #[test]
    fn errors_name_the_offending_object() {
        let err = LevelError::DuplicateObject(ObjectId(3));
        assert_eq!(err.to_string(), "duplicate object id ObjectId(3)");
        let err = LevelError::ObjectOutOfBounds(ObjectId(7));
        assert_eq!(err.to_string(), "object ObjectId(7) region lies outside the level");
    }

    #[test]
    fn overhanging_object_is_fatal() {
        let mut level = flat_level();
        level.objects.push(LevelObject {
            id: ObjectId(2),
            effect: ObjectEffect::Drown,
            cue: SoundCue::Drown,
            region: Rect::new(95, 55, 10, 10),
        });
        assert_eq!(
            level.validate(),
            Err(LevelError::ObjectOutOfBounds(ObjectId(2)))
        );
    }
}
