//! Score compound events: chord-like alignment units carrying ornament sets.

use crate::error::FollowError;
use crate::pitch::{check_pitch_range, Pitch, PitchSet};

/// An immutable, already-validated unit of the score: a set of simultaneous
/// (or epsilon-grouped) notes plus whatever ornament decorates them.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundEvent {
    pub time: f64,
    pub time_span: f64,
    pub chord_pitches: PitchSet,
    pub trill_pitches: PitchSet,
    pub grace_pitches: Vec<Pitch>,
    pub ignore_pitches: PitchSet,
    pub expected: u32,
}

impl CompoundEvent {
    /// Constructs and validates a CE. `expected` is derived here, once, per
    /// §3: `|chord \ ignore| + |trill \ ignore|`. Grace notes are excluded.
    pub fn new(
        time: f64,
        time_span: f64,
        chord_pitches: PitchSet,
        trill_pitches: PitchSet,
        grace_pitches: Vec<Pitch>,
        ignore_pitches: PitchSet,
    ) -> Result<Self, FollowError> {
        if time_span < 0.0 {
            return Err(FollowError::InvariantViolated(format!(
                "time_span must be >= 0, got {time_span}"
            )));
        }
        for p in chord_pitches
            .iter()
            .chain(trill_pitches.iter())
            .chain(grace_pitches.iter().copied())
            .chain(ignore_pitches.iter())
        {
            check_pitch_range(p)?;
        }
        let expected = chord_pitches.difference(&ignore_pitches).len()
            + trill_pitches.difference(&ignore_pitches).len();
        Ok(CompoundEvent {
            time,
            time_span,
            chord_pitches,
            trill_pitches,
            grace_pitches,
            ignore_pitches,
            expected,
        })
    }

    /// A CE with no decoration: a plain chord (or a single note, for a
    /// chord of size one).
    pub fn chord(time: f64, pitches: impl IntoIterator<Item = Pitch>) -> Result<Self, FollowError> {
        CompoundEvent::new(
            time,
            0.0,
            PitchSet::from_iter(pitches),
            PitchSet::new(),
            Vec::new(),
            PitchSet::new(),
        )
    }

    /// A `grace insert` CE: structurally a CE (occupies a row, addressable,
    /// participates in the window) but carries only `grace_pitches`.
    /// Per the resolved open question (§4.1/§9 of the design notes) it does
    /// NOT inherit `trill_pitches` or `ignore_pitches` from the host CE it
    /// precedes.
    pub fn grace_insert(time: f64, grace_pitches: Vec<Pitch>) -> Result<Self, FollowError> {
        CompoundEvent::new(
            time,
            0.0,
            PitchSet::new(),
            PitchSet::new(),
            grace_pitches,
            PitchSet::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_excludes_ignored_and_grace() {
        let ce = CompoundEvent::new(
            0.0,
            0.0,
            PitchSet::from_iter([60, 64]),
            PitchSet::from_iter([67]),
            vec![59],
            PitchSet::from_iter([64]),
        )
        .unwrap();
        // chord \ ignore = {60}; trill \ ignore = {67}; grace excluded.
        assert_eq!(ce.expected, 2);
    }

    #[test]
    fn grace_insert_has_no_chord_or_expected() {
        let ce = CompoundEvent::grace_insert(0.0, vec![59, 61]).unwrap();
        assert_eq!(ce.expected, 0);
        assert!(ce.chord_pitches.is_empty());
        assert!(ce.trill_pitches.is_empty());
        assert!(ce.ignore_pitches.is_empty());
        assert_eq!(ce.grace_pitches, vec![59, 61]);
    }

    #[test]
    fn rejects_negative_time_span() {
        assert!(CompoundEvent::new(
            0.0,
            -0.1,
            PitchSet::new(),
            PitchSet::new(),
            Vec::new(),
            PitchSet::new()
        )
        .is_err());
    }

    #[test]
    fn rejects_out_of_range_pitch_in_chord() {
        let mut chord = PitchSet::new();
        chord.insert(60);
        // PitchSet can't itself hold >127, so test via a grace pitch vec
        // which is the only place an out-of-range value can sneak in.
        let result = CompoundEvent::new(0.0, 0.0, chord, PitchSet::new(), vec![200], PitchSet::new());
        assert!(matches!(result, Err(FollowError::PitchOutOfRange(200))));
    }
}
