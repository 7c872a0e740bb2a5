//! Note data model — the unit the scheduler dispatches.
//!
//! A [`Note`] is validated once at the session boundary. After that every
//! beat value it carries is finite and non-negative.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque note identifier, kept as text.
///
/// The controller may send either a string or a number; both are accepted
/// and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawNoteId", into = "String")]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NoteId> for String {
    fn from(id: NoteId) -> Self {
        id.0
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNoteId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<RawNoteId> for NoteId {
    fn from(raw: RawNoteId) -> Self {
        match raw {
            RawNoteId::Text(s) => NoteId(s),
            RawNoteId::Integer(i) => NoteId(i.to_string()),
            RawNoteId::Float(f) => NoteId(f.to_string()),
        }
    }
}

/// Why a note was refused at the session boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteError {
    /// `start` was NaN or infinite.
    NonFiniteStart(f64),
    /// `duration` was NaN or infinite.
    NonFiniteDuration(f64),
}

impl fmt::Display for NoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteError::NonFiniteStart(v) => write!(f, "note start is not finite: {v}"),
            NoteError::NonFiniteDuration(v) => write!(f, "note duration is not finite: {v}"),
        }
    }
}

impl std::error::Error for NoteError {}

/// A single note of the score.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Stable identifier from the editor.
    pub id: NoteId,
    /// Symbolic pitch name such as `"C4"` or `"F#5"`. Passed through untouched.
    pub pitch: String,
    /// Beat position, `>= 0`.
    pub start: f64,
    /// Length in beats, `>= 0`.
    pub duration: f64,
}

impl Note {
    /// Build a note, clamping negative beat values to zero.
    ///
    /// Non-finite values are rejected rather than clamped.
    pub fn new(
        id: impl Into<NoteId>,
        pitch: impl Into<String>,
        start: f64,
        duration: f64,
    ) -> Result<Self, NoteError> {
        if !start.is_finite() {
            return Err(NoteError::NonFiniteStart(start));
        }
        if !duration.is_finite() {
            return Err(NoteError::NonFiniteDuration(duration));
        }
        if start < 0.0 || duration < 0.0 {
            log::debug!("clamping negative beat values on note (start {start}, duration {duration})");
        }
        Ok(Self {
            id: id.into(),
            pitch: pitch.into(),
            start: start.max(0.0),
            duration: duration.max(0.0),
        })
    }
}
