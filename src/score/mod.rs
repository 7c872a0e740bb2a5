//! Score storage — validated notes and a beat-ordered index with a read cursor.
//!
//! The [`ScoreIndex`] is loaded once per session and is read-only afterwards.
//! Its cursor only moves forward during playback; a seek is the one operation
//! that rewinds it.

pub mod index;
pub mod note;

pub use index::{Collect, ScoreIndex};
pub use note::{Note, NoteError, NoteId};

/// Tolerance, in beats, applied to every beat comparison against the score.
///
/// Beat positions come from UI snapping, so anything closer than this is the
/// same position.
pub const BEAT_EPSILON: f64 = 1e-6;
