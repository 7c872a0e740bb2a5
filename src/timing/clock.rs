//! Pacing clocks.
//!
//! Elapsed pacing time must always be measured against a clock that is local
//! to the scheduling context. Mixing readings from clocks with different
//! origins skews the estimated beat by the origin difference.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic millisecond clock owned by the scheduling context.
pub trait PacingClock {
    /// Milliseconds since this clock's origin. Never decreases.
    fn now_ms(&self) -> f64;
}

/// Wall-clock pacing backed by [`Instant`].
///
/// Create it on the thread that schedules so its origin belongs to that
/// context.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PacingClock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for deterministic tests and offline rendering.
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    ms_bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// A clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute reading. Readings earlier than the current one are ignored.
    pub fn set_ms(&self, ms: f64) {
        let current = self.now_ms();
        if ms > current {
            self.ms_bits.store(ms.to_bits(), Ordering::SeqCst);
        }
    }

    /// Move the clock forward.
    pub fn advance_ms(&self, ms: f64) {
        self.set_ms(self.now_ms() + ms.max(0.0));
    }

    /// Move the clock forward by seconds.
    pub fn advance_secs(&self, secs: f64) {
        self.advance_ms(secs * 1000.0);
    }
}

impl PacingClock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.ms_bits.load(Ordering::SeqCst))
    }
}

impl<C: PacingClock + ?Sized> PacingClock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}
