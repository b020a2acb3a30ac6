//! Typed error hierarchy for the score-following core.
//!
//! Every fallible operation returns `Result<_, FollowError>`; the engine never
//! panics outside of `#[cfg(test)]` code. Callers at the application boundary
//! are free to fold this into their own `anyhow`-based error handling.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FollowError {
    #[error("feed() called before the score has any compound events")]
    ScoreEmpty,

    #[error("performance time went backwards: previous={previous}, attempted={attempted}")]
    TimeGoesBackwards { previous: f64, attempted: f64 },

    #[error("pitch {0} is out of MIDI range 0..=127")]
    PitchOutOfRange(u8),

    #[error("unknown strategy tag: {0:?}")]
    StrategyUnknown(String),

    #[error("internal invariant violated: {0}")]
    InvariantViolated(String),
}
