//! Beat ↔ audio-time mapping with rebasing.
//!
//! A [`TimeBase`] is an anchor: the beat `start_beat` sounds at audio time
//! `base_audio_time`, and that instant was observed locally at pacing reading
//! `base_pacing_ms`. Everything else is derived from the anchor and the tempo.
//!
//! The type never reads a clock itself. Callers pass the pacing reading in,
//! so a whole tick works from one reading and one tempo.

use std::fmt;

/// Rejected tempo value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoError(pub f64);

impl fmt::Display for TempoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tempo must be finite and positive, got {}", self.0)
    }
}

impl std::error::Error for TempoError {}

/// Check that a tempo is usable.
pub fn validate_bpm(bpm: f64) -> Result<f64, TempoError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(bpm)
    } else {
        Err(TempoError(bpm))
    }
}

/// Anchor and tempo shared by the musical, audio, and pacing clocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBase {
    bpm: f64,
    start_beat: f64,
    base_audio_time: f64,
    base_pacing_ms: f64,
}

impl TimeBase {
    /// Anchor `start_beat` at `base_audio_time`, observed at `pacing_now_ms`.
    pub fn new(
        bpm: f64,
        start_beat: f64,
        base_audio_time: f64,
        pacing_now_ms: f64,
    ) -> Result<Self, TempoError> {
        Ok(Self {
            bpm: validate_bpm(bpm)?,
            start_beat: start_beat.max(0.0),
            base_audio_time: base_audio_time.max(0.0),
            base_pacing_ms: pacing_now_ms,
        })
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    #[inline]
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    #[inline]
    pub fn start_beat(&self) -> f64 {
        self.start_beat
    }

    #[inline]
    pub fn base_audio_time(&self) -> f64 {
        self.base_audio_time
    }

    #[inline]
    pub fn base_pacing_ms(&self) -> f64 {
        self.base_pacing_ms
    }

    #[inline]
    pub fn beats_per_second(&self) -> f64 {
        self.bpm / 60.0
    }

    // -------------------------------
    // MARK: Conversions
    // -------------------------------

    /// Audio-clock time at which `beat` sounds.
    #[inline]
    pub fn beat_to_audio_time(&self, beat: f64) -> f64 {
        self.base_audio_time + (beat - self.start_beat) / self.beats_per_second()
    }

    /// Inverse of [`beat_to_audio_time`](Self::beat_to_audio_time).
    #[inline]
    pub fn audio_time_to_beat(&self, audio_time: f64) -> f64 {
        self.start_beat + (audio_time - self.base_audio_time) * self.beats_per_second()
    }

    /// Seconds covered by `beats` at the current tempo.
    #[inline]
    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats / self.beats_per_second()
    }

    /// Beats covered by `seconds` at the current tempo.
    #[inline]
    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.beats_per_second()
    }

    /// Current beat estimated from elapsed pacing time.
    ///
    /// Clamped so a reading older than the anchor never reports a beat before it.
    #[inline]
    pub fn now_beat(&self, pacing_now_ms: f64) -> f64 {
        let elapsed_ms = (pacing_now_ms - self.base_pacing_ms).max(0.0);
        self.start_beat + elapsed_ms / 1000.0 * self.beats_per_second()
    }

    // -------------------------------
    // MARK: Rebasing
    // -------------------------------

    /// Audio-clock reading implied by the anchor at `pacing_now_ms`.
    ///
    /// Both clocks run in real time, so the audio clock has moved on by the
    /// same amount of wall time as the pacing clock since the anchor.
    pub fn estimated_audio_time(&self, pacing_now_ms: f64) -> f64 {
        self.base_audio_time + (pacing_now_ms - self.base_pacing_ms).max(0.0) / 1000.0
    }

    /// Re-anchor at playback start.
    ///
    /// `resume_beat` will sound at `resume_audio_time`, and the pacing anchor
    /// is taken now. When `resume_audio_time` lies ahead of `audio_now` the
    /// pacing anchor is pushed forward by the same amount, so the estimated
    /// beat holds at `resume_beat` until the audio clock gets there.
    pub fn rebase_at_start(
        &mut self,
        resume_beat: f64,
        resume_audio_time: f64,
        audio_now: f64,
        pacing_now_ms: f64,
    ) {
        let lead_ms = (resume_audio_time - audio_now).max(0.0) * 1000.0;
        self.start_beat = resume_beat.max(0.0);
        self.base_audio_time = resume_audio_time.max(0.0);
        self.base_pacing_ms = pacing_now_ms + lead_ms;
    }

    /// Re-anchor so `new_start_beat` sounds at `audio_now`.
    pub fn rebase_at_seek(&mut self, new_start_beat: f64, audio_now: f64, pacing_now_ms: f64) {
        self.start_beat = new_start_beat.max(0.0);
        self.base_audio_time = audio_now.max(0.0);
        self.base_pacing_ms = pacing_now_ms;
    }

    /// Change tempo without a jump in the audible position.
    ///
    /// The beat playing at `pacing_now_ms` becomes the new anchor, at the audio
    /// time it had under the old tempo, and only then does the tempo change.
    /// An invalid tempo leaves everything untouched.
    pub fn update_bpm(&mut self, new_bpm: f64, pacing_now_ms: f64) -> Result<(), TempoError> {
        let new_bpm = validate_bpm(new_bpm)?;
        let beat = self.now_beat(pacing_now_ms);
        let audio = self.beat_to_audio_time(beat);
        self.start_beat = beat;
        self.base_audio_time = audio;
        self.base_pacing_ms = pacing_now_ms;
        self.bpm = new_bpm;
        Ok(())
    }

    /// Change tempo keeping the current anchor.
    ///
    /// Continuity holds at `start_beat` only; use while the transport is not
    /// advancing.
    pub fn set_bpm(&mut self, new_bpm: f64) -> Result<(), TempoError> {
        self.bpm = validate_bpm(new_bpm)?;
        Ok(())
    }
}
