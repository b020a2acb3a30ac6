//! Parsed form of the out-of-scope label stream (§3, §6).
//!
//! No textual parser is implemented here; these types are the contract
//! `OrnamentResolver::resolve` consumes. A host-side loader is expected to
//! turn the five textual label forms into these values.

use crate::pitch::Pitch;

#[derive(Debug, Clone, PartialEq)]
pub struct LabelEvent {
    pub kind: LabelKind,
    pub start: f64,
    pub stop: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LabelKind {
    Trill(Vec<Pitch>),
    Grace(Vec<Pitch>),
    GraceInsert(Vec<Pitch>),
    Ignore(Vec<Pitch>),
    Epsilon(f64),
}

impl LabelEvent {
    pub fn covers(&self, time: f64) -> bool {
        self.start <= time && time < self.stop
    }
}
