//! The windowed DP engine (§2 item 3, §4.3, §4.4): two column vectors, a
//! sliding window over score rows, and the two recurrence strategies.
//!
//! Rows are 1-based throughout, matching the scenarios in §8 (`row=1` for
//! the first compound event). Row `r` corresponds to `score[r - 1]`.
//!
//! Three deliberate deviations from the literal prose of §3/§4.3/§4.4, made
//! to resolve internal inconsistencies in the source description, are
//! recorded in `DESIGN.md`:
//! - window bounds are treated as **closed** intervals (`[win_start,
//!   win_end]`) rather than half-open, which is the only reading under
//!   which `W = 2*win_half_len + 1` holds;
//! - the dynamic horizontal rule reads `prev_col[r]` (same row) rather than
//!   `prev_col[r - 1]`, which is the only reading under which a multi-pitch
//!   chord can accumulate reward across successive notes on one row;
//! - a column's winning row prefers a genuine candidate match over a
//!   tied-or-higher non-match row, since a non-match row's value is often a
//!   stale skip-carried baseline rather than anything earned this column.

use std::rc::Rc;

use crate::cell::{Cell, NEG_INF};
use crate::compound_event::CompoundEvent;
use crate::debug_log::{DebugEvent, DebugLog};
use crate::params::{Parameters, Strategy};
use crate::pitch::Pitch;

/// Which rule produced a row's horizontal value, needed both for emission
/// eligibility (§4.4.3: only C1/C2 rows are reportable) and for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Static diagonal, chord hit.
    Diagonal,
    /// Dynamic case C1: chord hit.
    ChordHit,
    /// Dynamic case C2: trill hit.
    TrillHit,
    /// Dynamic case C3: grace hit (never a candidate match).
    GraceHit,
    /// Dynamic case C4 / static vertical or horizontal skip.
    NoMatch,
}

impl RuleKind {
    fn is_reportable(self) -> bool {
        matches!(self, RuleKind::Diagonal | RuleKind::ChordHit | RuleKind::TrillHit)
    }
}

/// Per-row diagnostic values, reported to the debug log when one is attached.
/// Carried alongside `RowResult` rather than read back out of `Cell` because
/// several of these (the raw `V`/`H` values, the winning branch) don't
/// survive into the stored cell.
#[derive(Debug, Clone, Copy)]
struct RowDiag {
    expected: u32,
    v_value: i32,
    h_value: i32,
    h_case: &'static str,
    winner: &'static str,
    /// `(ioi, limit, ok)`, dynamic strategy only.
    timing: Option<(f64, f64, bool)>,
}

/// The outcome of filling one row during `process_note`.
#[derive(Debug, Clone, Copy)]
struct RowResult {
    cell: Cell,
    rule: RuleKind,
    diag: RowDiag,
}

/// What happened when a performance note was processed: the best row found
/// this column, and whether it qualifies as a candidate match.
#[derive(Debug, Clone, Copy)]
pub struct NoteOutcome {
    pub row: usize,
    pub value: i32,
    pub rule: RuleKind,
}

/// A single column of the DP matrix: a border cell (the row just before
/// `win_start`) plus one cell per active row, stored contiguously.
#[derive(Clone)]
struct Column {
    /// Row number stored at index 0 (the border row).
    base: usize,
    cells: Vec<Cell>,
}

impl Column {
    fn filled(base: usize, window_len: usize, value: i32, rows: &[CompoundEvent]) -> Self {
        let mut cells = Vec::with_capacity(window_len + 1);
        cells.push(Cell {
            value,
            time: -1.0,
            used: Default::default(),
            unused_count: 0,
            grace_progress: 0,
        });
        for i in 0..window_len {
            let cell = match rows.get(base + i) {
                Some(row_ce) => Cell::new(value, row_ce),
                None => Cell {
                    value,
                    time: -1.0,
                    used: Default::default(),
                    unused_count: 0,
                    grace_progress: 0,
                },
            };
            cells.push(cell);
        }
        Column { base, cells }
    }

    /// Reads `row`, returning the out-of-window sentinel if `row` is not
    /// covered by this column's allocated range (§4.3 "out-of-window
    /// access"), which naturally also covers the closed-interval border
    /// inclusion fix since the border is stored at index 0.
    fn get(&self, row: usize) -> Cell {
        if row < self.base {
            return Cell::neg_infinity();
        }
        let idx = row - self.base;
        self.cells.get(idx).copied().unwrap_or_else(Cell::neg_infinity)
    }

    fn set(&mut self, row: usize, cell: Cell) {
        let idx = row - self.base;
        self.cells[idx] = cell;
    }
}

/// The DP engine proper.
pub struct MatchMatrix {
    score: Rc<[CompoundEvent]>,
    params: Parameters,

    length: usize,
    win_center: usize,
    win_start: usize,
    win_end: usize,
    /// Rows below this one are considered permanently behind the
    /// performance and the window never retreats below it.
    start_point: usize,

    cur_col: Column,
    prev_col: Column,

    top_score: i32,
    top_row: usize,
}

impl MatchMatrix {
    pub fn new(score: Rc<[CompoundEvent]>, params: Parameters) -> Self {
        let length = score.len();
        let win_half_len = params.win_half_len.min(length.max(1));
        let win_center = (win_half_len + 1).min(length.max(1));
        let win_start = win_center.saturating_sub(win_half_len).max(1);
        let win_end = (win_center + win_half_len).min(length);
        let window_len = win_end.saturating_sub(win_start) + 1;

        // §4.3 initialization: cur_col all zero, prev_col all -inf. This is
        // the one place the uniform-reset rule used on every later swap does
        // not apply; it only happens once, here.
        let cur_col = Column::filled(win_start.saturating_sub(1), window_len, 0, &score);
        let prev_col = Column::filled(win_start.saturating_sub(1), window_len, NEG_INF, &score);

        MatchMatrix {
            score,
            params,
            length,
            win_center,
            win_start,
            win_end,
            start_point: 1,
            cur_col,
            prev_col,
            top_score: 0,
            top_row: 0,
        }
    }

    pub fn win_center(&self) -> usize {
        self.win_center
    }

    pub fn win_bounds(&self) -> (usize, usize) {
        (self.win_start, self.win_end)
    }

    pub fn top_score(&self) -> i32 {
        self.top_score
    }

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    /// Re-centers the window and exchanges the column buffers. `hint` is the
    /// caller's suggested new center (ignored under `Strategy::Static`,
    /// which derives its own center from the last column's best match).
    pub fn swap_to_new_column(&mut self, hint: Option<usize>) {
        let win_half_len = self.params.win_half_len.min(self.length.max(1));

        let mut new_center = match self.params.strategy {
            Strategy::Static => {
                if self.top_row >= self.win_start {
                    self.top_row
                } else {
                    self.win_center + 1
                }
            }
            Strategy::Dynamic => hint.unwrap_or(self.win_center + self.params.dynamic_lead),
        };

        let low = (self.start_point + win_half_len).min(self.length.max(1));
        let high = self.length.saturating_sub(win_half_len).max(1);
        let (low, high) = (low.min(high), low.max(high));
        new_center = new_center.clamp(low, high);

        self.win_center = new_center;
        self.win_start = self.win_center.saturating_sub(win_half_len).max(1);
        self.win_end = (self.win_center + win_half_len).min(self.length);
        let window_len = self.win_end.saturating_sub(self.win_start) + 1;
        let curbase = self.win_start.saturating_sub(1);

        let fresh = Column::filled(curbase, window_len, NEG_INF, &self.score);
        let old_cur = std::mem::replace(&mut self.cur_col, fresh);
        self.prev_col = old_cur;
    }

    fn row_ce(&self, row: usize) -> &CompoundEvent {
        &self.score[row - 1]
    }

    /// Processes one performance note against the current window, returning
    /// the best row found this column. The caller (`ScoreFollower`) decides
    /// whether that qualifies as a reportable match.
    ///
    /// "Best" ranks a genuine candidate match (`Diagonal`/`ChordHit`/
    /// `TrillHit`) over any non-match row regardless of raw value, since a
    /// non-match row's value is frequently a stale skip-carried baseline
    /// rather than anything earned this column (DESIGN.md). Within the same
    /// tier, the strictly higher value wins, and ties keep the earliest row.
    pub fn process_note(
        &mut self,
        pitch: Pitch,
        time: f64,
        debug_log: Option<&dyn DebugLog>,
    ) -> NoteOutcome {
        let mut best: Option<(usize, i32, RuleKind)> = None;

        for row in self.win_start..=self.win_end {
            let result = match self.params.strategy {
                Strategy::Static => self.static_row(row, pitch, time),
                Strategy::Dynamic => self.dynamic_row(row, pitch, time),
            };
            self.cur_col.set(row, result.cell);

            if let Some(log) = debug_log {
                log.record(DebugEvent::Cevent { row, expected: result.diag.expected });
                log.record(DebugEvent::Cell {
                    row,
                    value: result.cell.value,
                    unused_count: result.cell.unused_count,
                });
                if let Some((ioi, limit, ok)) = result.diag.timing {
                    log.record(DebugEvent::Timing { row, ioi, limit, ok });
                }
                log.record(DebugEvent::Vrule { row, value: result.diag.v_value });
                log.record(DebugEvent::Hrule {
                    row,
                    value: result.diag.h_value,
                    case: result.diag.h_case,
                });
                log.record(DebugEvent::Decision { row, winner: result.diag.winner });
            }

            let candidate = result.rule.is_candidate_match();
            let replace = match &best {
                None => true,
                Some((_, best_value, best_rule)) => match (candidate, best_rule.is_candidate_match()) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => result.cell.value > *best_value,
                },
            };
            if replace {
                best = Some((row, result.cell.value, result.rule));
            }
        }

        let (row, value, rule) = best.expect("non-empty window");
        self.start_point = self.start_point.max(row);
        // Gated on a genuine match, not the raw column max: re-centering
        // (`swap_to_new_column`'s static branch) should never jump the
        // window to a row that only won by carrying a stale skip value.
        // `>=`, matching the emission confidence check (DESIGN.md #12): a
        // fresh match that only ties the previous best still advances the
        // hint row, since it's at least as good a re-centering target.
        if rule.is_candidate_match() && value >= self.top_score {
            self.top_score = value;
            self.top_row = row;
        }
        NoteOutcome { row, value, rule }
    }

    fn static_row(&self, row: usize, pitch: Pitch, time: f64) -> RowResult {
        let ce = self.row_ce(row);
        let up = self.cur_col.get(row - 1);
        let h_src = self.prev_col.get(row);
        let d_src = self.prev_col.get(row - 1);

        let v = up.value.saturating_sub(self.params.scm);
        let h = h_src.value.saturating_sub(self.params.sce);
        let is_chord_hit = ce.chord_pitches.contains(pitch);
        let d = d_src.value.saturating_add(if is_chord_hit { 1 } else { -self.params.scw });

        let value = v.max(h).max(d);
        let d_is_max = d >= v && d >= h;

        let (cell, winner) = if value == d {
            let mut c = Cell::new(d, ce);
            c.time = d_src.time;
            if is_chord_hit {
                c.consume(pitch, time, ce);
            }
            c.value = d;
            (c, "D")
        } else if value == h {
            let mut c = h_src;
            c.value = h;
            (c, "H")
        } else {
            let mut c = Cell::new(v, ce);
            c.time = up.time;
            (c, "V")
        };

        let rule = if d_is_max && is_chord_hit {
            RuleKind::Diagonal
        } else {
            RuleKind::NoMatch
        };
        let diag = RowDiag {
            expected: ce.expected,
            v_value: v,
            h_value: h,
            h_case: if is_chord_hit { "chord" } else { "none" },
            winner,
            timing: None,
        };
        RowResult { cell, rule, diag }
    }

    fn dynamic_row(&self, row: usize, pitch: Pitch, time: f64) -> RowResult {
        let ce = self.row_ce(row);
        let up = self.cur_col.get(row - 1);
        // Corrected per DESIGN.md: same-row read, not `prev_col[row - 1]`.
        let prev = self.prev_col.get(row);

        let p = &self.params;

        // Vertical rule.
        let v_value = if row >= self.start_point {
            up.value.saturating_sub(p.dcm * up.unused_count as i32)
        } else {
            up.value
        };
        let mut v_cell = Cell::new(v_value, ce);
        v_cell.time = up.time;

        // Horizontal rule.
        let ioi = if prev.time >= 0.0 { time - prev.time } else { 0.0 };
        let prev_unused = prev.unused_count;
        let timing_limit = if prev_unused == ce.expected {
            p.grace_max_ioi
        } else {
            ce.time_span + 0.1
        };
        let timing_ok = prev.time < 0.0 || ioi < timing_limit;

        let (h_value, mut h_cell, h_rule, h_case) = if ce.chord_pitches.contains(pitch)
            && !prev.used.contains(pitch)
            && timing_ok
        {
            let mut c = prev;
            if ce.ignore_pitches.contains(pitch) {
                c.consume(pitch, time, ce);
                (prev.value, c, RuleKind::NoMatch, "chord-ignored")
            } else {
                c.consume(pitch, time, ce);
                (prev.value + p.dmc, c, RuleKind::ChordHit, "chord")
            }
        } else if ce.trill_pitches.contains(pitch)
            && (prev.used.is_empty() || ioi < p.trill_max_ioi)
        {
            let mut c = prev;
            if prev.used.contains(pitch) || ce.ignore_pitches.contains(pitch) {
                if !prev.used.contains(pitch) {
                    c.consume(pitch, time, ce);
                }
                (prev.value, c, RuleKind::NoMatch, "trill-repeat")
            } else {
                c.consume(pitch, time, ce);
                (prev.value + p.dmc, c, RuleKind::TrillHit, "trill")
            }
        } else if ce.grace_pitches.contains(&pitch)
            && (prev.used.is_empty() || ioi < p.grace_max_ioi)
        {
            let mut c = prev;
            let beyond_grace = !prev.used.intersection(&ce.chord_pitches).is_empty();
            if beyond_grace {
                (prev.value - p.dce, c, RuleKind::GraceHit, "grace-beyond")
            } else {
                c.grace_progress = (c.grace_progress + 1).min(ce.grace_pitches.len());
                (prev.value + p.dgc, c, RuleKind::GraceHit, "grace")
            }
        } else {
            let mut c = prev;
            c.time = prev.time;
            (prev.value - p.dce, c, RuleKind::NoMatch, "none")
        };
        h_cell.value = h_value;

        let (cell, rule, winner) = if h_value > v_value {
            (h_cell, h_rule, "H")
        } else if v_value > h_value {
            (v_cell, RuleKind::NoMatch, "V")
        } else if matches!(h_rule, RuleKind::ChordHit | RuleKind::TrillHit) {
            // Tie: V's value and path state win the cell, but the row still
            // produced a candidate match for emission purposes (§4.4.2, the
            // open question resolved literally in DESIGN.md).
            (v_cell, h_rule, "V")
        } else {
            (v_cell, RuleKind::NoMatch, "V")
        };

        let diag = RowDiag {
            expected: ce.expected,
            v_value,
            h_value,
            h_case,
            winner,
            timing: Some((ioi, timing_limit, timing_ok)),
        };
        RowResult { cell, rule, diag }
    }
}

impl RuleKind {
    pub fn is_candidate_match(self) -> bool {
        self.is_reportable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compound_event::CompoundEvent;
    use crate::params::Parameters;

    fn score_ces(pitches: &[Pitch]) -> Rc<[CompoundEvent]> {
        pitches
            .iter()
            .enumerate()
            .map(|(i, p)| CompoundEvent::chord(i as f64, [*p]).unwrap())
            .collect()
    }

    #[test]
    fn static_trivial_match_s1() {
        let score = score_ces(&[60, 62]);
        let params = Parameters {
            strategy: Strategy::Static,
            win_half_len: 1,
            ..Parameters::default()
        };
        let mut m = MatchMatrix::new(score, params);
        m.swap_to_new_column(None);
        let out = m.process_note(60, 0.0, None);
        assert_eq!(out.row, 1);
        assert!(out.rule.is_candidate_match());
        assert_eq!(out.value, 1);

        m.swap_to_new_column(None);
        let out = m.process_note(62, 1.0, None);
        assert_eq!(out.row, 2);
        assert_eq!(out.value, 2);
    }

    #[test]
    fn dynamic_trill_s4() {
        let mut ce = CompoundEvent::chord(0.0, [72]).unwrap();
        ce.trill_pitches.insert(74);
        ce.expected = 2;
        let score: Rc<[CompoundEvent]> = Rc::from(vec![ce]);
        let params = Parameters {
            strategy: Strategy::Dynamic,
            win_half_len: 1,
            ..Parameters::default()
        };
        let mut m = MatchMatrix::new(score, params);

        m.swap_to_new_column(Some(1));
        let out = m.process_note(72, 0.0, None);
        assert!(out.rule.is_candidate_match());

        m.swap_to_new_column(Some(1));
        let out = m.process_note(74, 0.05, None);
        assert!(out.rule.is_candidate_match());

        m.swap_to_new_column(Some(1));
        let out = m.process_note(72, 0.10, None);
        assert!(!out.rule.is_candidate_match(), "repeat should earn no further credit");

        m.swap_to_new_column(Some(1));
        let out = m.process_note(74, 0.15, None);
        assert!(!out.rule.is_candidate_match());
    }

    #[test]
    fn dynamic_timing_violation_s6() {
        let ce = CompoundEvent::chord(0.0, [60]).unwrap();
        let score: Rc<[CompoundEvent]> = Rc::from(vec![ce]);
        let params = Parameters {
            strategy: Strategy::Dynamic,
            win_half_len: 1,
            ..Parameters::default()
        };
        let mut m = MatchMatrix::new(score, params);

        m.swap_to_new_column(Some(1));
        let out = m.process_note(60, 0.0, None);
        assert!(out.rule.is_candidate_match());

        m.swap_to_new_column(Some(1));
        let out = m.process_note(60, 10.0, None);
        assert!(!out.rule.is_candidate_match());
    }
}
