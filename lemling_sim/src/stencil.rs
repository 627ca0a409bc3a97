// Per-pixel obstacle mask for the level — the "stencil".
//
// The stencil is a dense width x height grid with one `u32` bitfield cell
// per level pixel, stored as a flat row-major `Vec`. Agents read it for
// collision; diggers, bashers, miners, builders, stoppers, and explosions
// mutate it — but only ever through `Mask` operations (`mask.rs`) or the
// named helpers here (`paint_step`). No agent pokes raw bit patterns.
//
// ## Edge policy
//
// Reads clamp x into `[0, width)`. Vertical out-of-bounds is asymmetric by
// design, and the skill-transition thresholds are tuned against it:
// - above the top edge a probe reports *solid* (forbids climbing past the
//   level ceiling),
// - below the bottom edge a probe reports *empty* (falling through the
//   floor is possible and fatal), and `free_below` returns the
//   `FALL_DISTANCE_FORCE_FALL` sentinel (2x the walker fall tolerance)
//   as soon as its scan leaves the grid.
//
// See also: `mask.rs` for the stamp operations, `level.rs` which builds
// the initial stencil from the terrain description, `lemming.rs` for the
// probes' consumers.
//
// **Critical constraint: determinism.** The stencil is plain data mutated
// only from inside the tick; a fresh copy built from the same level
// description is bit-identical every time.

use serde::{Deserialize, Serialize};

use crate::types::ObjectId;

/// Cell flag bit positions.
pub mod cell {
    /// Destructible terrain is present at this pixel.
    pub const BRICK: u32 = 1 << 0;
    /// Indestructible: diggers/bashers/miners/explosions leave it alone.
    pub const STEEL: u32 = 1 << 1;
    /// One-way wall: must not be destroyed by leftward-working skills.
    pub const NO_DIG_LEFT: u32 = 1 << 2;
    /// One-way wall: must not be destroyed by rightward-working skills.
    pub const NO_DIG_RIGHT: u32 = 1 << 3;
    /// Stopper field, left half: turns agents travelling right.
    pub const STOPPER_LEFT: u32 = 1 << 4;
    /// Stopper field, right half: turns agents travelling left.
    pub const STOPPER_RIGHT: u32 = 1 << 5;
    /// Trap object region; the object id selects the trap behavior.
    pub const TRAP: u32 = 1 << 6;
    /// Exit object region.
    pub const EXIT: u32 = 1 << 7;

    /// Either stopper half.
    pub const STOPPER_ANY: u32 = STOPPER_LEFT | STOPPER_RIGHT;

    pub(crate) const OBJECT_SHIFT: u32 = 16;
    pub(crate) const OBJECT_MASK: u32 = 0xFF << OBJECT_SHIFT;

    /// Embed an object id into a trap/exit cell value.
    pub fn with_object(bits: u32, id: super::ObjectId) -> u32 {
        (bits & !OBJECT_MASK) | (u32::from(id.0) << OBJECT_SHIFT)
    }

    /// Extract the embedded object id from a cell value.
    pub fn object(bits: u32) -> super::ObjectId {
        super::ObjectId(((bits & OBJECT_MASK) >> OBJECT_SHIFT) as u8)
    }
}

/// Sentinel returned by [`Stencil::free_below`] when the downward scan
/// leaves the grid: exactly twice the walker's 8 px fall tolerance, so
/// every "should I fall?" comparison treats the void as a long drop.
pub const FALL_DISTANCE_FORCE_FALL: u32 = 16;

/// Dense per-pixel obstacle grid.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stencil {
    /// Flat storage: index = x + y * width.
    cells: Vec<u32>,
    width: u32,
    height: u32,
}

impl Stencil {
    /// Create an all-empty stencil of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let total = (width as usize) * (height as usize);
        Self {
            cells: vec![0; total],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Clamp an x coordinate into `[0, width)`.
    pub fn clamp_x(&self, x: i32) -> i32 {
        x.clamp(0, self.width.saturating_sub(1) as i32)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if y < 0 || y >= self.height as i32 {
            return None;
        }
        let x = self.clamp_x(x);
        Some(x as usize + y as usize * self.width as usize)
    }

    /// Read the cell at (x, y) under the edge policy: x clamps into range,
    /// y above the top reads as solid brick, y below the bottom as empty.
    pub fn get(&self, x: i32, y: i32) -> u32 {
        if y < 0 {
            return cell::BRICK;
        }
        match self.index(x, y) {
            Some(i) => self.cells[i],
            None => 0,
        }
    }

    /// True if the pixel holds terrain (brick or steel-backed brick).
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.get(x, y) & cell::BRICK != 0
    }

    /// OR the given bits into a cell. No-op below the bottom edge; above
    /// the top edge there is nothing to write to.
    pub fn set_bits(&mut self, x: i32, y: i32, bits: u32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] |= bits;
        }
    }

    /// Clear the given bits from a cell. No-op out of vertical bounds.
    pub fn clear_bits(&mut self, x: i32, y: i32, bits: u32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] &= !bits;
        }
    }

    /// Replace a cell outright. Used only by level construction; gameplay
    /// mutation goes through masks.
    pub(crate) fn put(&mut self, x: i32, y: i32, value: u32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    /// Number of free (non-brick) pixels in the column below (x, y),
    /// starting at the foot pixel itself, capped at `limit`.
    ///
    /// Returns [`FALL_DISTANCE_FORCE_FALL`] as soon as the scan leaves the
    /// grid — the original's off-grid sentinel, preserved verbatim.
    pub fn free_below(&self, x: i32, y: i32, limit: u32) -> u32 {
        for step in 0..limit {
            let yy = y + step as i32;
            if yy >= self.height as i32 {
                return FALL_DISTANCE_FORCE_FALL;
            }
            if self.is_solid(x, yy) {
                return step;
            }
        }
        limit
    }

    /// Number of free pixels in the column above (x, y - 1), capped at
    /// `limit`. The top edge counts as solid: a scan that reaches it stops
    /// there, which forbids climbing out of the level.
    pub fn free_above(&self, x: i32, y: i32, limit: u32) -> u32 {
        for step in 0..limit {
            let yy = y - 1 - step as i32;
            // get() reports brick above the top edge, so the boundary needs
            // no special case here.
            if self.get(x, yy) & cell::BRICK != 0 {
                return step;
            }
        }
        limit
    }

    /// Height of the terrain rise at column x relative to foot level y:
    /// the number of consecutive brick pixels at (x, y), (x, y-1), ...,
    /// capped at `limit`. Zero means no ground at foot level.
    pub fn rise_at(&self, x: i32, y: i32, limit: u32) -> u32 {
        for step in 0..limit {
            if !self.is_solid(x, y - step as i32) {
                return step;
            }
        }
        limit
    }

    /// Paint a builder step: a 1 px tall strip of brick, `len` pixels
    /// long, growing from `x` in direction `dx` (+1 right, -1 left) on
    /// row `y`. A decorative-debris stub in the original, but it mutates
    /// real brick so later diggers can remove it.
    pub fn paint_step(&mut self, x: i32, y: i32, dx: i32, len: u32) {
        for i in 0..len as i32 {
            self.set_bits(x + dx * (i + 1), y, cell::BRICK);
        }
    }
}
