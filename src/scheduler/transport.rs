//! Per-session transport state.

use std::time::Duration;

use super::phase::Phase;
use crate::timing::TimeBase;

/// Shortest pacing interval between ticks.
pub const MIN_TICK: Duration = Duration::from_millis(10);

/// Playback parameters and progress of one session.
#[derive(Debug, Clone)]
pub struct TransportState {
    /// Tempo and the beat / audio / pacing anchor.
    pub time_base: TimeBase,
    /// Horizon ahead of the current beat, in seconds.
    pub lookahead_sec: f64,
    /// Pacing interval between refills, in seconds.
    pub tick_sec: f64,
    /// Beat at which playback ends. `None` plays until stopped.
    pub max_end_beat: Option<f64>,
    /// Highest beat already considered for emission.
    pub frontier_beat: f64,
    pub phase: Phase,
}

impl TransportState {
    /// A freshly armed session with its frontier at the anchor beat.
    pub fn armed(
        time_base: TimeBase,
        lookahead_sec: f64,
        tick_sec: f64,
        max_end_beat: Option<f64>,
    ) -> Self {
        Self {
            frontier_beat: time_base.start_beat(),
            time_base,
            lookahead_sec,
            tick_sec,
            max_end_beat,
            phase: Phase::Armed,
        }
    }

    /// End boundary, or +∞ when unbounded.
    pub fn stop_beat(&self) -> f64 {
        self.max_end_beat.unwrap_or(f64::INFINITY)
    }

    /// Lookahead horizon measured from `now_beat`.
    pub fn horizon_beat(&self, now_beat: f64) -> f64 {
        now_beat + self.time_base.seconds_to_beats(self.lookahead_sec)
    }

    /// `max(10 ms, floor(tick_sec · 1000) ms)`.
    pub fn tick_interval(&self) -> Duration {
        let ms = (self.tick_sec * 1000.0).floor();
        let ms = if ms.is_finite() && ms > 0.0 { ms as u64 } else { 0 };
        Duration::from_millis(ms).max(MIN_TICK)
    }
}
