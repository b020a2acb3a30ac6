//! Orchestrator: owns the score CEs and the `MatchMatrix`, groups incoming
//! notes under the static strategy, and produces match reports (§4.5).

use std::rc::Rc;

use crate::compound_event::CompoundEvent;
use crate::debug_log::{DebugEvent, DebugLog};
use crate::error::FollowError;
use crate::matcher::{MatchMatrix, RuleKind};
use crate::params::{Parameters, Strategy};
use crate::pitch::{check_pitch_range, Pitch};

/// One emitted alignment report (§3 "Match report").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchReport {
    pub row: usize,
    pub pitch: Pitch,
    pub perf_time: f64,
    pub score: i32,
}

pub struct ScoreFollower {
    score: Rc<[CompoundEvent]>,
    params: Parameters,
    matrix: MatchMatrix,

    last_evt_time: Option<f64>,
    input_count: u64,
    top_score: i32,
    top_row: usize,

    debug_log: Option<Box<dyn DebugLog>>,
}

impl ScoreFollower {
    pub fn new(score: Rc<[CompoundEvent]>, params: Parameters) -> Result<Self, FollowError> {
        let params = params.validate()?;
        let matrix = MatchMatrix::new(Rc::clone(&score), params);
        Ok(ScoreFollower {
            score,
            params,
            matrix,
            last_evt_time: None,
            input_count: 0,
            top_score: 0,
            top_row: 0,
            debug_log: None,
        })
    }

    pub fn with_debug_log(mut self, log: Box<dyn DebugLog>) -> Self {
        self.debug_log = Some(log);
        self
    }

    pub fn top_score(&self) -> i32 {
        self.top_score
    }

    pub fn top_row(&self) -> usize {
        self.top_row
    }

    pub fn input_count(&self) -> u64 {
        self.input_count
    }

    /// Current `[win_start, win_end]` (closed) range of active score rows.
    pub fn win_bounds(&self) -> (usize, usize) {
        self.matrix.win_bounds()
    }

    /// Switches strategy between notes, reinitializing both columns to the
    /// new strategy's zero state while preserving `win_center`.
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.params.strategy = strategy;
        let hint = self.matrix.win_center();
        self.matrix = MatchMatrix::new(Rc::clone(&self.score), self.params);
        self.matrix.swap_to_new_column(Some(hint));
    }

    pub fn reset(&mut self) {
        self.matrix = MatchMatrix::new(Rc::clone(&self.score), self.params);
        self.last_evt_time = None;
        self.input_count = 0;
        self.top_score = 0;
        self.top_row = 0;
    }

    /// Feeds one performance note. `perf_time` must be monotonically
    /// non-decreasing across calls.
    pub fn feed(&mut self, pitch: Pitch, perf_time: f64) -> Result<Option<MatchReport>, FollowError> {
        if self.score.is_empty() {
            return Err(FollowError::ScoreEmpty);
        }
        check_pitch_range(pitch)?;
        if let Some(previous) = self.last_evt_time {
            if perf_time < previous {
                return Err(FollowError::TimeGoesBackwards {
                    previous,
                    attempted: perf_time,
                });
            }
        }

        if let Some(log) = &self.debug_log {
            log.record(DebugEvent::Input { pitch, time: perf_time });
        }

        let starts_new_event = match self.params.strategy {
            Strategy::Dynamic => true,
            Strategy::Static => match self.last_evt_time {
                None => true,
                Some(last) => perf_time - last > self.params.epsilon,
            },
        };
        if starts_new_event {
            let hint = self.matrix.top_row().max(1) + self.params.dynamic_lead;
            self.matrix.swap_to_new_column(Some(hint));
        }
        self.last_evt_time = Some(perf_time);
        self.input_count += 1;

        let prior_top_score = self.top_score;
        let outcome = self.matrix.process_note(pitch, perf_time, self.debug_log.as_deref());

        if let Some(log) = &self.debug_log {
            log.record(DebugEvent::Dp { row: outcome.row, value: outcome.value });
        }

        // `>=`, not `>`: a row that only ties the prior best still reports
        // as long as it's a genuine candidate match (DESIGN.md #12).
        let is_report = outcome.rule.is_candidate_match()
            && outcome.value >= prior_top_score - self.params.confidence_slack;

        if outcome.value > self.top_score {
            self.top_score = outcome.value;
        }
        if is_report {
            self.top_row = outcome.row;
        }

        if is_report {
            let report = MatchReport {
                row: outcome.row,
                pitch,
                perf_time,
                score: outcome.value,
            };
            if let Some(log) = &self.debug_log {
                log.record(DebugEvent::Match {
                    row: report.row,
                    pitch: report.pitch,
                    time: report.perf_time,
                    score: report.score,
                });
            }
            Ok(Some(report))
        } else {
            if let Some(log) = &self.debug_log {
                log.record(DebugEvent::NoMatch {
                    reason: rule_reason(outcome.rule),
                });
            }
            Ok(None)
        }
    }
}

fn rule_reason(rule: RuleKind) -> &'static str {
    match rule {
        RuleKind::GraceHit => "grace",
        RuleKind::NoMatch => "no-match",
        _ => "unreported",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_score() -> Rc<[CompoundEvent]> {
        vec![
            CompoundEvent::chord(0.0, [60]).unwrap(),
            CompoundEvent::chord(1.0, [62]).unwrap(),
        ]
        .into()
    }

    #[test]
    fn s1_trivial_match() {
        let params = Parameters {
            strategy: Strategy::Static,
            win_half_len: 1,
            ..Parameters::default()
        };
        let mut follower = ScoreFollower::new(static_score(), params).unwrap();
        let r1 = follower.feed(60, 0.0).unwrap().unwrap();
        assert_eq!((r1.row, r1.pitch, r1.score), (1, 60, 1));
        let r2 = follower.feed(62, 1.0).unwrap().unwrap();
        assert_eq!((r2.row, r2.pitch, r2.score), (2, 62, 2));
    }

    #[test]
    fn s2_extra_note_produces_no_report() {
        let params = Parameters {
            strategy: Strategy::Static,
            win_half_len: 1,
            ..Parameters::default()
        };
        let mut follower = ScoreFollower::new(static_score(), params).unwrap();
        follower.feed(60, 0.0).unwrap();
        let extra = follower.feed(61, 0.5).unwrap();
        assert!(extra.is_none());
        let r = follower.feed(62, 1.0).unwrap().unwrap();
        assert_eq!(r.row, 2);
    }

    #[test]
    fn rejects_backwards_time() {
        let params = Parameters {
            strategy: Strategy::Static,
            ..Parameters::default()
        };
        let mut follower = ScoreFollower::new(static_score(), params).unwrap();
        follower.feed(60, 1.0).unwrap();
        let err = follower.feed(60, 0.5).unwrap_err();
        assert!(matches!(err, FollowError::TimeGoesBackwards { .. }));
    }

    #[test]
    fn rejects_empty_score() {
        let params = Parameters::default();
        let empty: Rc<[CompoundEvent]> = Rc::from(Vec::new());
        let mut follower = ScoreFollower::new(empty, params).unwrap();
        assert!(matches!(follower.feed(60, 0.0), Err(FollowError::ScoreEmpty)));
    }

    #[test]
    fn rejects_out_of_range_pitch() {
        let params = Parameters::default();
        let mut follower = ScoreFollower::new(static_score(), params).unwrap();
        assert!(matches!(
            follower.feed(200, 0.0),
            Err(FollowError::PitchOutOfRange(200))
        ));
    }

    #[test]
    fn empty_performance_yields_no_reports() {
        let params = Parameters::default();
        let follower = ScoreFollower::new(static_score(), params).unwrap();
        assert_eq!(follower.input_count(), 0);
    }
}
