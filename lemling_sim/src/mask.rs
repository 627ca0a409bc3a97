// Stamp bitmaps applied against the stencil.
//
// A `Mask` is an immutable per-(skill, direction) bitmap template. The
// destructive skills (basher, miner, digger, bomber) erase terrain through
// one, stoppers stamp their turn-around field through one, and every
// destructive mask has a check twin built from the same bitmap that asks
// "is this action blocked?" before anything is committed.
//
// A stamp is positioned relative to the agent's midpoint x and foot y:
// the left edge lands at `x + anchor`, the top row at `y - mid_y`, plus an
// optional caller-supplied row offset. Left-facing masks are the
// horizontal mirror of the right-facing source bitmap (`flipped()`), with
// the anchor mirrored to match — both variants always come from one
// drawing, never two.
//
// Applications are explicit about what they did: `erase` returns the
// number of pixels actually removed, so callers (and tests) can observe
// behavior without diffing a whole stencil.
//
// See also: `stencil.rs` for the cell bit layout and edge policy,
// `resources.rs` for the built-in stamp set.

use serde::{Deserialize, Serialize};

use crate::stencil::{Stencil, cell};

/// Immutable stamp bitmap with its alignment offsets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    width: u32,
    height: u32,
    /// One bit pattern per row; bit i is the pixel i columns from the
    /// stamp's left edge. Width is capped at 32 by construction.
    rows: Vec<u32>,
    /// Horizontal offset from the agent's midpoint x to the stamp's left
    /// edge, for a right-facing agent.
    anchor: i32,
    /// Vertical offset from the agent's foot y up to the stamp's top row.
    mid_y: i32,
}

impl Mask {
    /// Build a mask from string-art rows: '#' marks a stamp pixel, any
    /// other character is transparent. All rows must share one width,
    /// 1..=32 columns. Returns `None` on malformed input (resource
    /// validation turns that into a fatal load error).
    pub fn from_pattern(pattern: &[&str], anchor: i32, mid_y: i32) -> Option<Self> {
        let width = pattern.first()?.chars().count() as u32;
        if width == 0 || width > 32 {
            return None;
        }
        let mut rows = Vec::with_capacity(pattern.len());
        for line in pattern {
            if line.chars().count() as u32 != width {
                return None;
            }
            let mut bits = 0u32;
            for (i, ch) in line.chars().enumerate() {
                if ch == '#' {
                    bits |= 1 << i;
                }
            }
            rows.push(bits);
        }
        Some(Self {
            width,
            height: rows.len() as u32,
            rows,
            anchor,
            mid_y,
        })
    }

    /// Build a mask from precomputed row bit patterns (for stamps shaped
    /// programmatically, like the explosion crater).
    pub(crate) fn from_rows(rows: Vec<u32>, width: u32, anchor: i32, mid_y: i32) -> Self {
        debug_assert!(width >= 1 && width <= 32);
        Self {
            width,
            height: rows.len() as u32,
            rows,
            anchor,
            mid_y,
        }
    }

    /// A solid rectangular stamp.
    pub fn solid(width: u32, height: u32, anchor: i32, mid_y: i32) -> Self {
        debug_assert!(width >= 1 && width <= 32);
        let bits = if width == 32 {
            u32::MAX
        } else {
            (1u32 << width) - 1
        };
        Self {
            width,
            height,
            rows: vec![bits; height as usize],
            anchor,
            mid_y,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The horizontally mirrored variant, for left-facing agents. The
    /// anchor mirrors so that a stamp reaching ahead of a right-facing
    /// agent reaches ahead of a left-facing one too.
    pub fn flipped(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|bits| bits.reverse_bits() >> (32 - self.width))
            .collect();
        Self {
            width: self.width,
            height: self.height,
            rows,
            anchor: -(self.anchor + self.width as i32 - 1),
            mid_y: self.mid_y,
        }
    }

    /// Iterate the stamp's set pixels as level coordinates for an agent
    /// at (x, y) with the given extra row offset.
    fn pixels<'a>(
        &'a self,
        x: i32,
        y: i32,
        row_offset: i32,
    ) -> impl Iterator<Item = (i32, i32)> + 'a {
        let left = x + self.anchor;
        let top = y - self.mid_y + row_offset;
        self.rows.iter().enumerate().flat_map(move |(row, bits)| {
            (0..self.width)
                .filter(move |col| bits & (1 << col) != 0)
                .map(move |col| (left + col as i32, top + row as i32))
        })
    }

    /// Erase terrain under the stamp, skipping any pixel that carries a
    /// `filter` bit (steel, one-way walls). Returns how many pixels were
    /// actually erased.
    pub fn erase(&self, stencil: &mut Stencil, x: i32, y: i32, row_offset: i32, filter: u32) -> u32 {
        let mut erased = 0;
        for (px, py) in self.pixels(x, y, row_offset) {
            let bits = stencil.get(px, py);
            if bits & cell::BRICK != 0 && bits & filter == 0 {
                stencil.clear_bits(px, py, cell::BRICK);
                erased += 1;
            }
        }
        erased
    }

    /// True if any pixel under the stamp carries any of the `query` bits.
    /// This is the "would this action be blocked?" probe used before a
    /// destructive application commits.
    pub fn check(&self, stencil: &Stencil, x: i32, y: i32, row_offset: i32, query: u32) -> bool {
        self.pixels(x, y, row_offset)
            .any(|(px, py)| stencil.get(px, py) & query != 0)
    }

    /// True if any pixel under the stamp holds terrain — whether there is
    /// anything left for a destructive skill to consume.
    pub fn overlaps_terrain(&self, stencil: &Stencil, x: i32, y: i32, row_offset: i32) -> bool {
        self.check(stencil, x, y, row_offset, cell::BRICK)
    }

    /// Stamp a stopper field: columns left of the stamp's midline get
    /// STOPPER_LEFT (turning rightward travellers), the rest STOPPER_RIGHT.
    pub fn set_stopper(&self, stencil: &mut Stencil, x: i32, y: i32) {
        let mid_col = x + self.anchor + (self.width as i32) / 2;
        for (px, py) in self.pixels(x, y, 0) {
            let bit = if px < mid_col {
                cell::STOPPER_LEFT
            } else {
                cell::STOPPER_RIGHT
            };
            stencil.set_bits(px, py, bit);
        }
    }

    /// Remove both stopper halves under the stamp. Must be called exactly
    /// once per `set_stopper` — a dangling stopper field is a correctness
    /// bug, not a cosmetic one.
    pub fn clear_stopper(&self, stencil: &mut Stencil, x: i32, y: i32) {
        for (px, py) in self.pixels(x, y, 0) {
            stencil.clear_bits(px, py, cell::STOPPER_ANY);
        }
    }
}
