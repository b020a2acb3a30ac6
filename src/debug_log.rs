//! Per-instance structured diagnostic logging (§4.8, §6).
//!
//! No global mutable state: a `ScoreFollower` holds an `Option<Box<dyn
//! DebugLog>>`. When `None`, no `DebugEvent` is ever constructed, so
//! disabling the log cannot change which `MatchReport`s are produced (P5).

use std::sync::Mutex;

/// One structured record kind per column, matching the byte-stable schema
/// named in §6.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugEvent<'a> {
    Input { pitch: u8, time: f64 },
    Cevent { row: usize, expected: u32 },
    Cell { row: usize, value: i32, unused_count: u32 },
    Timing { row: usize, ioi: f64, limit: f64, ok: bool },
    Vrule { row: usize, value: i32 },
    Hrule { row: usize, value: i32, case: &'a str },
    Decision { row: usize, winner: &'a str },
    Dp { row: usize, value: i32 },
    Match { row: usize, pitch: u8, time: f64, score: i32 },
    NoMatch { reason: &'a str },
}

pub trait DebugLog {
    fn record(&self, event: DebugEvent<'_>);
}

/// The default, zero-cost sink: drops every event.
pub struct NullDebugLog;

impl DebugLog for NullDebugLog {
    fn record(&self, _event: DebugEvent<'_>) {}
}

/// An in-memory collector used by this crate's own tests to assert on the
/// diagnostic stream without piping it through a real logger.
#[derive(Default)]
pub struct VecDebugLog {
    events: Mutex<Vec<String>>,
}

impl VecDebugLog {
    pub fn new() -> Self {
        VecDebugLog::default()
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl DebugLog for VecDebugLog {
    fn record(&self, event: DebugEvent<'_>) {
        self.events.lock().unwrap().push(format!("{event:?}"));
    }
}
