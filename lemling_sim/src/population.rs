// The agent collection: spawn gate, iteration order, post-tick sweep.
//
// Agents live in an insertion-ordered `Vec` — iteration order IS spawn
// order, and everything that touches "the first agent such that ..."
// (the nuke stagger, the legacy positional lookup) relies on it. Removal
// happens only in `sweep()`, after the whole animation pass of a tick,
// so an agent dying mid-tick never shifts the positions of agents that
// still have their turn coming.
//
// Ids are allocated from a plain monotonic counter and never reused.
//
// See also: `lemming.rs` for the per-agent tick, `sim.rs` for who calls
// what in which order.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::lemming::Lemming;
use crate::resources::TIME_SCALE;
use crate::types::LemmingId;

/// Entry rotation for exactly three entries, the original's quirk: the
/// middle entry feeds twice per round.
const THREE_ENTRY_ROTATION: [usize; 4] = [0, 1, 2, 1];

/// Ticks between spawns for a release rate in 1..=99.
pub fn release_interval_ticks(release_rate: u32) -> u32 {
    let rate = release_rate.clamp(1, 99);
    (4 + (99 - rate) / 2) * TIME_SCALE
}

/// What `sweep()` removed this tick.
#[derive(Debug, Default)]
pub struct SweepResult {
    pub rescued: SmallVec<[LemmingId; 4]>,
    pub died: SmallVec<[LemmingId; 4]>,
}

/// All live agents plus the spawn machinery.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    lemmings: Vec<Lemming>,
    next_id: u32,
    /// Agents released so far, capped by the level's lemming count.
    spawned: u32,
    max_spawn: u32,
    release_rate: u32,
    /// Ticks until the next release.
    release_countdown: u32,
    /// Index into the entry rotation (not into the entry list).
    rotation_step: usize,
    num_entries: usize,
}

impl Population {
    pub fn new(max_spawn: u32, release_rate: u32, num_entries: usize) -> Self {
        Self {
            lemmings: Vec::with_capacity(max_spawn as usize),
            next_id: 0,
            spawned: 0,
            max_spawn,
            release_rate,
            // First release comes the moment the hatch is open.
            release_countdown: 0,
            rotation_step: 0,
            num_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.lemmings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmings.is_empty()
    }

    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    /// True once every agent the level will ever have has been released.
    pub fn fully_spawned(&self) -> bool {
        self.spawned >= self.max_spawn
    }

    pub fn release_rate(&self) -> u32 {
        self.release_rate
    }

    /// Change the release rate. Takes effect from the next countdown
    /// reset; the countdown already running is left alone.
    pub fn set_release_rate(&mut self, rate: u32) {
        self.release_rate = rate.clamp(1, 99);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lemming> {
        self.lemmings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Lemming> {
        self.lemmings.iter_mut()
    }

    pub fn get(&self, id: LemmingId) -> Option<&Lemming> {
        self.lemmings.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LemmingId) -> Option<&mut Lemming> {
        self.lemmings.iter_mut().find(|l| l.id == id)
    }

    /// Stable id of the agent at a live list position. Upgrade path for
    /// positional event streams recorded by older builds.
    pub fn id_at_position(&self, position: usize) -> Option<LemmingId> {
        self.lemmings.get(position).map(|l| l.id)
    }

    /// The next entry index in rotation order. With exactly three
    /// entries the middle one feeds twice per round; any other count is
    /// a plain round-robin.
    fn next_entry(&mut self) -> usize {
        if self.num_entries == 0 {
            return 0;
        }
        let entry = if self.num_entries == 3 {
            THREE_ENTRY_ROTATION[self.rotation_step % THREE_ENTRY_ROTATION.len()]
        } else {
            self.rotation_step % self.num_entries
        };
        self.rotation_step += 1;
        entry
    }

    /// Run the release gate for one tick. Returns the entry index a new
    /// agent was released from, if the countdown elapsed.
    pub fn tick_release(&mut self) -> Option<(Lemming, usize)> {
        if self.fully_spawned() {
            return None;
        }
        if self.release_countdown > 0 {
            self.release_countdown -= 1;
            return None;
        }
        self.release_countdown = release_interval_ticks(self.release_rate);
        let entry = self.next_entry();
        let id = LemmingId(self.next_id);
        self.next_id += 1;
        self.spawned += 1;
        Some((Lemming::new(id, 0, 0), entry))
    }

    /// Add a released agent at its entry position.
    pub fn insert(&mut self, mut lemming: Lemming, x: i32, y: i32) {
        lemming.x = x;
        lemming.y = y;
        self.lemmings.push(lemming);
    }

    /// Remove exited and dead agents. Called once per tick, strictly
    /// after every agent has animated.
    pub fn sweep(&mut self) -> SweepResult {
        let mut result = SweepResult::default();
        self.lemmings.retain(|l| {
            if l.has_left {
                result.rescued.push(l.id);
                false
            } else if l.has_died {
                result.died.push(l.id);
                false
            } else {
                true
            }
        });
        result
    }

    /// The next agent the nuke sequence should doom: the first in spawn
    /// order that has not yet received its forced assignment.
    pub fn first_not_nuked_mut(&mut self) -> Option<&mut Lemming> {
        self.lemmings.iter_mut().find(|l| !l.nuke)
    }

    /// Agents whose foot pixel lies within a square cursor box. Hit
    /// order is population order, so the oldest agent wins ties.
    pub fn under_cursor(&self, cx: i32, cy: i32, radius: i32) -> SmallVec<[LemmingId; 4]> {
        self.lemmings
            .iter()
            .filter(|l| (l.x - cx).abs() <= radius && (l.y - cy).abs() <= radius)
            .map(|l| l.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_spawns(pop: &mut Population, ticks: u32) -> Vec<usize> {
        let mut entries = Vec::new();
        for _ in 0..ticks {
            if let Some((lemming, entry)) = pop.tick_release() {
                pop.insert(lemming, 10, 10);
                entries.push(entry);
            }
        }
        entries
    }

    #[test]
    fn release_interval_scales_with_rate() {
        assert_eq!(release_interval_ticks(99), 4 * TIME_SCALE);
        assert_eq!(release_interval_ticks(1), 53 * TIME_SCALE);
        assert!(release_interval_ticks(50) > release_interval_ticks(80));
        // Out-of-range rates clamp rather than wrap.
        assert_eq!(release_interval_ticks(0), release_interval_ticks(1));
        assert_eq!(release_interval_ticks(200), release_interval_ticks(99));
    }

    #[test]
    fn first_release_is_immediate() {
        let mut pop = Population::new(5, 50, 1);
        assert!(pop.tick_release().is_some());
        assert!(pop.tick_release().is_none());
    }

    #[test]
    fn spawn_count_caps_at_level_total() {
        let mut pop = Population::new(3, 99, 1);
        drain_spawns(&mut pop, 200);
        assert_eq!(pop.spawned(), 3);
        assert!(pop.fully_spawned());
        assert_eq!(pop.len(), 3);
    }

    #[test]
    fn ids_are_monotonic_and_stable() {
        let mut pop = Population::new(4, 99, 1);
        drain_spawns(&mut pop, 100);
        let ids: Vec<u32> = pop.iter().map(|l| l.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(pop.id_at_position(2), Some(LemmingId(2)));
        assert_eq!(pop.id_at_position(9), None);
    }

    #[test]
    fn three_entries_rotate_middle_twice() {
        let mut pop = Population::new(8, 99, 3);
        let entries = drain_spawns(&mut pop, 1000);
        assert_eq!(entries, vec![0, 1, 2, 1, 0, 1, 2, 1]);
    }

    #[test]
    fn other_entry_counts_are_round_robin() {
        let mut pop = Population::new(4, 99, 2);
        let entries = drain_spawns(&mut pop, 1000);
        assert_eq!(entries, vec![0, 1, 0, 1]);
    }

    #[test]
    fn sweep_removes_dead_and_left_after_the_pass() {
        let mut pop = Population::new(3, 99, 1);
        drain_spawns(&mut pop, 100);
        pop.get_mut(LemmingId(0)).unwrap().has_died = true;
        pop.get_mut(LemmingId(2)).unwrap().has_left = true;
        let result = pop.sweep();
        assert_eq!(result.died.as_slice(), &[LemmingId(0)]);
        assert_eq!(result.rescued.as_slice(), &[LemmingId(2)]);
        assert_eq!(pop.len(), 1);
        assert!(pop.get(LemmingId(1)).is_some());
        // Positions shift, ids do not.
        assert_eq!(pop.id_at_position(0), Some(LemmingId(1)));
    }

    #[test]
    fn nuke_order_follows_spawn_order() {
        let mut pop = Population::new(3, 99, 1);
        drain_spawns(&mut pop, 100);
        let first = pop.first_not_nuked_mut().unwrap();
        assert_eq!(first.id, LemmingId(0));
        first.nuke = true;
        assert_eq!(pop.first_not_nuked_mut().unwrap().id, LemmingId(1));
    }

    #[test]
    fn cursor_query_uses_a_square_box() {
        let mut pop = Population::new(3, 99, 1);
        drain_spawns(&mut pop, 100);
        for (i, lem) in pop.iter_mut().enumerate() {
            lem.x = 10 * i as i32;
            lem.y = 50;
        }
        let hits = pop.under_cursor(10, 52, 6);
        assert_eq!(hits.as_slice(), &[LemmingId(1)]);
        assert!(pop.under_cursor(100, 100, 6).is_empty());
    }
}
