//! Per-row DP state (§3 "Cell", §4.2).

use crate::compound_event::CompoundEvent;
use crate::pitch::{Pitch, PitchSet};

/// Sentinel standing in for `-infinity`. Chosen with headroom (`i32::MIN/4`)
/// so repeated subtraction in the recurrence never overflows.
pub const NEG_INF: i32 = i32::MIN / 4;

/// Per-row, per-column alignment state. Value-typed: cells are never shared
/// between `cur_col` and `prev_col`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub value: i32,
    /// Time of the most recent match on this path, or `-1.0` if none.
    pub time: f64,
    /// Pitches already consumed from this row's CE, along this path.
    pub used: PitchSet,
    pub unused_count: u32,
    /// Count of leading grace pitches already matched in order. Tracked
    /// separately from `used` (§9 ornament ordering note).
    pub grace_progress: usize,
}

impl Cell {
    /// A fresh cell for `row`, as created on column initialization or on a
    /// path that starts a new row (V-path, or static's D-path on mismatch).
    pub fn new(value: i32, row: &CompoundEvent) -> Self {
        Cell {
            value,
            time: -1.0,
            used: PitchSet::new(),
            unused_count: row.expected,
            grace_progress: 0,
        }
    }

    /// The out-of-window sentinel: guarantees no recurrence will ever prefer
    /// reading it (§4.3 "out-of-window access").
    pub fn neg_infinity() -> Self {
        Cell {
            value: NEG_INF,
            time: -1.0,
            used: PitchSet::new(),
            unused_count: 0,
            grace_progress: 0,
        }
    }

    /// Marks `pitch` consumed and advances `time`, recomputing
    /// `unused_count` against `row`'s reward-bearing pitches
    /// (`chord ∪ trill \ ignore`).
    pub fn consume(&mut self, pitch: Pitch, time: f64, row: &CompoundEvent) {
        self.used.insert(pitch);
        self.time = time;
        self.recompute_unused_count(row);
    }

    pub fn recompute_unused_count(&mut self, row: &CompoundEvent) {
        let reward_bearing = row.chord_pitches.union(&row.trill_pitches).difference(&row.ignore_pitches);
        let consumed = self.used.intersection(&reward_bearing).len();
        self.unused_count = row.expected.saturating_sub(consumed);
    }
}
