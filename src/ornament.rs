//! Grouping of a raw note stream into compound events, and application of
//! the label stream's ornament sets onto those compound events (§4.1, §4.6).

use crate::compound_event::CompoundEvent;
use crate::error::FollowError;
use crate::label::{LabelEvent, LabelKind};
use crate::pitch::{Pitch, PitchSet};

/// A single note of the raw score note stream, prior to CE grouping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawNote {
    pub time: f64,
    pub pitch: Pitch,
}

/// A CE that has been grouped by epsilon but not yet decorated by labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCe {
    pub time: f64,
    pub time_span: f64,
    pub pitches: Vec<Pitch>,
}

/// Groups a left-to-right note stream into raw CEs: the first note starts a
/// CE, each subsequent note joins the current CE if it falls within
/// `epsilon` of the CE's start time, else starts a new one.
pub fn group_by_epsilon(notes: &[RawNote], epsilon: f64) -> Vec<RawCe> {
    let mut out: Vec<RawCe> = Vec::new();
    for note in notes {
        match out.last_mut() {
            Some(ce) if note.time - ce.time <= epsilon => {
                ce.time_span = note.time - ce.time;
                ce.pitches.push(note.pitch);
            }
            _ => out.push(RawCe {
                time: note.time,
                time_span: 0.0,
                pitches: vec![note.pitch],
            }),
        }
    }
    out
}

/// Result of applying the label stream to a raw CE sequence.
pub struct ResolveOutput {
    pub ces: Vec<CompoundEvent>,
    /// `(time, new_epsilon)` signals threaded forward for the caller to
    /// apply to subsequent grouping; this crate does not re-group itself.
    pub epsilon_changes: Vec<(f64, f64)>,
}

/// Pure helper producing, for each score CE, the derived ornament sets from
/// a label stream.
pub struct OrnamentResolver;

impl OrnamentResolver {
    /// Applies every label whose `[start, stop)` range covers `raw_ce.time`
    /// to the corresponding CE. `grace insert` labels materialize an
    /// additional grace-only CE immediately preceding the host CE.
    pub fn resolve(
        raw_ces: Vec<RawCe>,
        labels: &[LabelEvent],
    ) -> Result<ResolveOutput, FollowError> {
        let mut ces = Vec::with_capacity(raw_ces.len());
        let mut epsilon_changes = Vec::new();

        for raw in raw_ces {
            let covering: Vec<&LabelEvent> =
                labels.iter().filter(|l| l.covers(raw.time)).collect();

            let mut trill_pitches = PitchSet::new();
            let mut grace_pitches: Vec<Pitch> = Vec::new();
            let mut ignore_pitches = PitchSet::new();

            for label in &covering {
                match &label.kind {
                    LabelKind::Trill(pitches) => {
                        trill_pitches = trill_pitches.union(&PitchSet::from_iter(pitches.iter().copied()));
                    }
                    LabelKind::Grace(pitches) => grace_pitches.extend(pitches.iter().copied()),
                    LabelKind::Ignore(pitches) => {
                        ignore_pitches = ignore_pitches.union(&PitchSet::from_iter(pitches.iter().copied()));
                    }
                    LabelKind::Epsilon(value) => epsilon_changes.push((raw.time, *value)),
                    LabelKind::GraceInsert(pitches) => {
                        ces.push(CompoundEvent::grace_insert(raw.time, pitches.clone())?);
                    }
                }
            }

            let chord_pitches = PitchSet::from_iter(raw.pitches.iter().copied());
            ces.push(CompoundEvent::new(
                raw.time,
                raw.time_span,
                chord_pitches,
                trill_pitches,
                grace_pitches,
                ignore_pitches,
            )?);
        }

        Ok(ResolveOutput { ces, epsilon_changes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(time: f64, pitch: Pitch) -> RawNote {
        RawNote { time, pitch }
    }

    #[test]
    fn groups_notes_within_epsilon() {
        let notes = [note(0.0, 60), note(0.02, 64), note(1.0, 67)];
        let ces = group_by_epsilon(&notes, 0.075);
        assert_eq!(ces.len(), 2);
        assert_eq!(ces[0].pitches, vec![60, 64]);
        assert_eq!(ces[1].pitches, vec![67]);
    }

    #[test]
    fn applies_trill_label_to_covering_ce() {
        let raw = vec![RawCe {
            time: 0.0,
            time_span: 0.0,
            pitches: vec![72],
        }];
        let labels = vec![LabelEvent {
            kind: LabelKind::Trill(vec![74]),
            start: 0.0,
            stop: 1.0,
        }];
        let out = OrnamentResolver::resolve(raw, &labels).unwrap();
        assert_eq!(out.ces.len(), 1);
        assert!(out.ces[0].trill_pitches.contains(74));
        assert_eq!(out.ces[0].expected, 2);
    }

    #[test]
    fn grace_insert_creates_preceding_standalone_ce() {
        let raw = vec![RawCe {
            time: 1.0,
            time_span: 0.0,
            pitches: vec![60],
        }];
        let labels = vec![LabelEvent {
            kind: LabelKind::GraceInsert(vec![59]),
            start: 0.0,
            stop: 2.0,
        }];
        let out = OrnamentResolver::resolve(raw, &labels).unwrap();
        assert_eq!(out.ces.len(), 2);
        assert_eq!(out.ces[0].grace_pitches, vec![59]);
        assert_eq!(out.ces[0].expected, 0);
        assert!(out.ces[1].chord_pitches.contains(60));
    }

    #[test]
    fn epsilon_label_is_threaded_not_applied() {
        let raw = vec![RawCe {
            time: 0.0,
            time_span: 0.0,
            pitches: vec![60],
        }];
        let labels = vec![LabelEvent {
            kind: LabelKind::Epsilon(0.2),
            start: 0.0,
            stop: 1.0,
        }];
        let out = OrnamentResolver::resolve(raw, &labels).unwrap();
        assert_eq!(out.epsilon_changes, vec![(0.0, 0.2)]);
    }
}
