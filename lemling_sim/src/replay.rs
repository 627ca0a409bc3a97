// Input event log — the recording half of deterministic replays.
//
// Every state change a player can cause goes through exactly four event
// kinds, each tagged with the tick it applies at. In record mode the sim
// appends an event for every *accepted* change (refused skill requests
// are not recorded; replaying them would be a no-op anyway). In playback
// mode the log is the only input source: events are re-injected at their
// recorded ticks and live input is ignored. Same level, same log, same
// trace.
//
// Events address agents by stable `LemmingId`, never by list position —
// positions shift when agents die. `upgrade_positional` in `population`
// (`id_at_position`) covers streams recorded positionally by older
// builds.
//
// See also: `sim.rs` for the injection point, `event.rs` for the
// *output* event stream (which never feeds back into the sim).

use serde::{Deserialize, Serialize};

use crate::types::{LemmingId, Skill};

/// Where this tick's input comes from. The two are mutually exclusive:
/// a sim in playback ignores live calls, a sim recording never reads
/// the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// Live input, appended to the log as it is accepted.
    Record,
    /// Input replayed from the log; live input is ignored.
    Playback,
}

/// One recorded input, applied at `tick`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayEvent {
    pub tick: u64,
    pub kind: ReplayEventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReplayEventKind {
    AssignSkill { lemming: LemmingId, skill: Skill },
    SetReleaseRate(u32),
    Nuke,
    /// Recorded so a replay can reproduce the player's viewport; the
    /// sim itself only stores the value.
    SetScroll(i32),
}

/// Append-only event log with a playback cursor.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReplayLog {
    events: Vec<ReplayEvent>,
    /// Next event to inject during playback.
    cursor: usize,
}

impl ReplayLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    /// Record an accepted input. Ticks must be non-decreasing; an event
    /// recorded out of order is a caller bug and is dropped with a log
    /// line rather than corrupting the stream.
    pub fn record(&mut self, tick: u64, kind: ReplayEventKind) {
        if let Some(last) = self.events.last() {
            if tick < last.tick {
                log::warn!("dropping out-of-order replay event at tick {tick} (log is at {})", last.tick);
                return;
            }
        }
        self.events.push(ReplayEvent { tick, kind });
    }

    /// Rewind the playback cursor to the start of the log.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Pop every event due at `tick`. Events whose tick has already
    /// passed are skipped (they can only appear if the caller seeks),
    /// future events stay queued.
    pub fn take_due(&mut self, tick: u64) -> Vec<ReplayEventKind> {
        let mut due = Vec::new();
        while let Some(event) = self.events.get(self.cursor) {
            if event.tick > tick {
                break;
            }
            if event.tick == tick {
                due.push(event.kind);
            }
            self.cursor += 1;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_due_returns_events_in_recorded_order() {
        let mut log = ReplayLog::new();
        log.record(5, ReplayEventKind::SetReleaseRate(70));
        log.record(
            5,
            ReplayEventKind::AssignSkill {
                lemming: LemmingId(1),
                skill: Skill::Digger,
            },
        );
        log.record(9, ReplayEventKind::Nuke);

        assert!(log.take_due(4).is_empty());
        let due = log.take_due(5);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0], ReplayEventKind::SetReleaseRate(70));
        assert!(log.take_due(5).is_empty(), "events inject exactly once");
        assert_eq!(log.take_due(9), vec![ReplayEventKind::Nuke]);
    }

    #[test]
    fn rewind_replays_from_the_start() {
        let mut log = ReplayLog::new();
        log.record(3, ReplayEventKind::SetScroll(120));
        assert_eq!(log.take_due(3).len(), 1);
        log.rewind();
        assert_eq!(log.take_due(3).len(), 1);
    }

    #[test]
    fn out_of_order_records_are_dropped() {
        let mut log = ReplayLog::new();
        log.record(10, ReplayEventKind::Nuke);
        log.record(4, ReplayEventKind::SetReleaseRate(50));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn log_roundtrips_through_json() {
        let mut log = ReplayLog::new();
        log.record(
            7,
            ReplayEventKind::AssignSkill {
                lemming: LemmingId(2),
                skill: Skill::Floater,
            },
        );
        let json = serde_json::to_string(&log).unwrap();
        let restored: ReplayLog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.events(), log.events());
    }
}
