//! Windowed dynamic-programming score-following core.
//!
//! Aligns an incoming stream of performed musical notes against a
//! pre-known score, one note at a time, under either of two interchangeable
//! recurrence strategies (`static`, `dynamic`) that trade simplicity for
//! ornament-awareness. See `SPEC_FULL.md` for the full design and
//! `DESIGN.md` for the grounding ledger.

pub mod cell;
pub mod compound_event;
pub mod debug_log;
pub mod error;
pub mod label;
pub mod matcher;
pub mod ornament;
pub mod params;
pub mod pitch;

mod follower;

pub use compound_event::CompoundEvent;
pub use error::FollowError;
pub use follower::{MatchReport, ScoreFollower};
pub use label::{LabelEvent, LabelKind};
pub use ornament::{group_by_epsilon, OrnamentResolver, RawCe, RawNote};
pub use params::{Clock, Parameters, Strategy};
pub use pitch::{Pitch, PitchSet};
