//! Time domains — pacing clocks and the beat ↔ audio-time mapping.
//!
//! Three clocks meet here. Beats are musical time. Audio time is the
//! downstream renderer's clock in seconds, only ever received from the
//! controller. Pacing time is a local monotonic reading in milliseconds used
//! to estimate the current beat between ticks. [`TimeBase`] ties the three
//! together through a single anchor that is rebased on start, seek and tempo
//! change.

pub mod clock;
pub mod time_base;

pub use clock::{ManualClock, MonotonicClock, PacingClock};
pub use time_base::{validate_bpm, TempoError, TimeBase};
