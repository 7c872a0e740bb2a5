//! Lookahead — a real-time note scheduler for beat-timed scores.
//!
//! A controller loads a score, starts playback, and steers it with seek and
//! tempo changes. On every tick the scheduler emits the notes whose onsets
//! fall inside a short horizon ahead of the current beat, stamped with the
//! audio-clock time at which the renderer should sound them.

pub mod config;
pub mod protocol;
pub mod scheduler;
pub mod score;
pub mod sink;
pub mod timing;
