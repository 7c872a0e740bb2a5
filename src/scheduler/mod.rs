//! Lookahead scheduler — the single-threaded playback state machine.
//!
//! The [`LookaheadScheduler`] owns the session (transport state + score) and
//! does two things: applies control messages and runs ticks. Each tick works
//! out the beat window `[frontier, min(now + lookahead, end)]`, pulls the
//! notes starting inside it from the [`ScoreIndex`], stamps them with audio
//! times through the [`TimeBase`], and hands one batch to the sink.
//!
//! The scheduler does **not** own a timer. [`runtime`] drives it from a
//! dedicated thread; tests drive it by hand with a
//! [`ManualClock`](crate::timing::ManualClock).

pub mod phase;
pub mod runtime;
pub mod transport;

pub use phase::Phase;
pub use runtime::{ControlSender, RuntimeError, SchedulerHandle};
pub use transport::{TransportState, MIN_TICK};

use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::protocol::{ControlMessage, InitParams, OutboundMessage, ScheduledEvent, StatusReport};
use crate::score::{Note, NoteError, ScoreIndex};
use crate::sink::EventSink;
use crate::timing::{validate_bpm, PacingClock, TimeBase};

/// Slack, in beats, before the end beat at which playback counts as finished.
///
/// Covers the last tick landing a fraction of a millisecond short of the end.
pub const END_GUARD_BEATS: f64 = 1e-4;

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing happened.
    Idle,
    /// Window advanced; `emitted` notes went out.
    Advanced { emitted: usize },
    /// Reached the end beat. `emitted` notes went out first.
    Ended { emitted: usize },
}

struct Session {
    transport: TransportState,
    score: ScoreIndex,
    /// Latest audio time handed to the sink, for the monotonic guard.
    last_audio_time: Option<f64>,
}

/// Playback scheduler over one session at a time.
pub struct LookaheadScheduler<C: PacingClock> {
    clock: C,
    config: SchedulerConfig,
    session: Option<Session>,
}

impl<C: PacingClock> LookaheadScheduler<C> {
    /// Create a scheduler with no session.
    ///
    /// `clock` must be local to the context that will call into the scheduler.
    pub fn new(clock: C, config: SchedulerConfig) -> Self {
        Self {
            clock,
            config,
            session: None,
        }
    }

    // -------------------------------
    // MARK: Control messages
    // -------------------------------

    /// Apply one control message.
    ///
    /// Returns `false` when the message was ignored: not accepted in the
    /// current phase, or carrying values that cannot be used. Ignored
    /// messages leave the state untouched.
    pub fn handle(&mut self, message: ControlMessage, sink: &mut dyn EventSink) -> bool {
        let kind = message.kind();
        let accepted = match message {
            ControlMessage::Init(params) => self.init(params),
            ControlMessage::Start { base_audio_time } => self.start(base_audio_time),
            ControlMessage::Stop => self.stop(),
            ControlMessage::Seek {
                start_beat,
                base_audio_time,
            } => self.seek(start_beat, base_audio_time),
            ControlMessage::UpdateBpm { bpm } => self.update_bpm(bpm),
            ControlMessage::Ping => {
                emit(sink, OutboundMessage::Pong);
                true
            }
            ControlMessage::Status => {
                emit(sink, OutboundMessage::Status(self.status()));
                true
            }
            // Owned by the runtime loop.
            ControlMessage::Quit => false,
        };
        if !accepted {
            log::debug!("ignored {kind} in phase {}", self.phase());
        }
        accepted
    }

    fn init(&mut self, params: InitParams) -> bool {
        let notes: Result<Vec<Note>, NoteError> =
            params.notes.into_iter().map(|n| n.into_note()).collect();
        let notes = match notes {
            Ok(notes) => notes,
            Err(e) => {
                log::debug!("dropping init: {e}");
                return false;
            }
        };
        if !params.start_beat.is_finite() || !params.base_audio_time.is_finite() {
            log::debug!("dropping init: non-finite start beat or audio time");
            return false;
        }
        let max_end_beat = match params.max_end_beat {
            Some(beat) if !beat.is_finite() => {
                log::debug!("dropping init: non-finite end beat");
                return false;
            }
            other => other.map(|beat| beat.max(0.0)),
        };

        let bpm = validate_bpm(params.bpm).unwrap_or_else(|e| {
            let fallback = self.bpm().unwrap_or(self.config.default_bpm);
            log::debug!("{e}, keeping {fallback}");
            fallback
        });
        let lookahead_sec = params
            .lookahead_sec
            .filter(|v| valid_positive(*v))
            .unwrap_or(self.config.lookahead_sec);
        let tick_sec = params
            .tick_sec
            .filter(|v| valid_positive(*v))
            .unwrap_or(self.config.tick_sec);

        let time_base = match TimeBase::new(
            bpm,
            params.start_beat,
            params.base_audio_time,
            self.clock.now_ms(),
        ) {
            Ok(tb) => tb,
            Err(e) => {
                log::debug!("dropping init: {e}");
                return false;
            }
        };

        let mut score = ScoreIndex::new();
        score.load(notes);

        log::info!(
            "session armed: {} notes, {bpm} bpm, start beat {}, end {:?}",
            score.len(),
            time_base.start_beat(),
            max_end_beat
        );
        self.session = Some(Session {
            transport: TransportState::armed(time_base, lookahead_sec, tick_sec, max_end_beat),
            score,
            last_audio_time: None,
        });
        true
    }

    fn start(&mut self, base_audio_time: Option<f64>) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.transport.phase.can_start() {
            return false;
        }
        let transport = &mut session.transport;
        let resume_beat = transport.frontier_beat;
        let audio_now = base_audio_time
            .filter(|t| t.is_finite())
            .unwrap_or_else(|| transport.time_base.estimated_audio_time(now_ms));
        // Notes up to the frontier are already out; resume no earlier than
        // the audio time the frontier had under the old anchor.
        let resume_audio_time = if transport.phase == Phase::Ended {
            transport
                .time_base
                .beat_to_audio_time(resume_beat)
                .max(audio_now)
        } else {
            audio_now
        };
        transport
            .time_base
            .rebase_at_start(resume_beat, resume_audio_time, audio_now, now_ms);
        transport.phase = Phase::Running;
        log::info!("playback started at beat {resume_beat}, audio time {resume_audio_time}");
        true
    }

    fn stop(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.transport.phase != Phase::Running {
            return false;
        }
        session.transport.phase = Phase::Ended;
        log::info!("playback stopped at beat {}", session.transport.frontier_beat);
        true
    }

    fn seek(&mut self, start_beat: f64, base_audio_time: f64) -> bool {
        if !start_beat.is_finite() || !base_audio_time.is_finite() {
            return false;
        }
        let now_ms = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.transport.phase.can_seek() {
            return false;
        }
        let transport = &mut session.transport;
        transport
            .time_base
            .rebase_at_seek(start_beat, base_audio_time, now_ms);
        transport.frontier_beat = transport.time_base.start_beat();
        session.score.seek(transport.frontier_beat);
        session.last_audio_time = None;
        if transport.phase == Phase::Ended {
            transport.phase = Phase::Armed;
        }
        log::info!("seeked to beat {}", transport.frontier_beat);
        true
    }

    fn update_bpm(&mut self, bpm: f64) -> bool {
        let now_ms = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let time_base = &mut session.transport.time_base;
        let result = if session.transport.phase == Phase::Running {
            time_base.update_bpm(bpm, now_ms)
        } else {
            time_base.set_bpm(bpm)
        };
        match result {
            Ok(()) => {
                log::info!("tempo now {bpm} bpm from beat {}", time_base.start_beat());
                true
            }
            Err(e) => {
                log::debug!("tempo change rejected: {e}");
                false
            }
        }
    }

    // -------------------------------
    // MARK: Tick
    // -------------------------------

    /// Refill the sink up to the lookahead horizon.
    ///
    /// Safe to call at any time; outside `Running` it does nothing, which
    /// also absorbs a timer firing just after `stop`.
    pub fn tick(&mut self, sink: &mut dyn EventSink) -> TickOutcome {
        let now_ms = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Idle;
        };
        if session.transport.phase != Phase::Running {
            return TickOutcome::Idle;
        }

        let time_base = session.transport.time_base;
        let now_beat = time_base.now_beat(now_ms);
        let stop_beat = session.transport.stop_beat();
        let window_end = session.transport.horizon_beat(now_beat).min(stop_beat);
        let frontier = session.transport.frontier_beat;

        let mut emitted = 0;
        if window_end > frontier {
            let bps = time_base.beats_per_second();
            let mut events = Vec::new();
            for note in session.score.collect(frontier, window_end) {
                let mut audio_time = time_base.beat_to_audio_time(note.start);
                if let Some(last) = session.last_audio_time {
                    if audio_time < last {
                        log::debug!(
                            "note {} at {audio_time}s would precede {last}s, holding",
                            note.id
                        );
                        audio_time = last;
                    }
                }
                session.last_audio_time = Some(audio_time);
                events.push(ScheduledEvent {
                    pitch: note.pitch.clone(),
                    audio_time,
                    duration_sec: (note.duration / bps).max(0.0),
                });
            }
            emitted = events.len();
            if !events.is_empty() {
                emit(sink, OutboundMessage::Events { events });
            }
            session.transport.frontier_beat = window_end;
        }

        if now_beat >= stop_beat - END_GUARD_BEATS {
            session.transport.phase = Phase::Ended;
            log::info!("playback reached end beat {stop_beat}");
            emit(sink, OutboundMessage::Ended);
            return TickOutcome::Ended { emitted };
        }
        TickOutcome::Advanced { emitted }
    }

    // -------------------------------
    // MARK: Accessors
    // -------------------------------

    pub fn phase(&self) -> Phase {
        self.session
            .as_ref()
            .map_or(Phase::Idle, |s| s.transport.phase)
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// Pacing interval while running; `None` when there is nothing to tick.
    pub fn tick_interval(&self) -> Option<Duration> {
        self.session
            .as_ref()
            .filter(|s| s.transport.phase == Phase::Running)
            .map(|s| s.transport.tick_interval())
    }

    pub fn transport(&self) -> Option<&TransportState> {
        self.session.as_ref().map(|s| &s.transport)
    }

    pub fn score(&self) -> Option<&ScoreIndex> {
        self.session.as_ref().map(|s| &s.score)
    }

    pub fn bpm(&self) -> Option<f64> {
        self.transport().map(|t| t.time_base.bpm())
    }

    pub fn frontier_beat(&self) -> Option<f64> {
        self.transport().map(|t| t.frontier_beat)
    }

    /// Current beat estimated from the pacing clock.
    pub fn now_beat(&self) -> Option<f64> {
        let now_ms = self.clock.now_ms();
        self.transport().map(|t| t.time_base.now_beat(now_ms))
    }

    /// Audio time of `beat` under the current anchor and tempo.
    pub fn beat_to_audio_time(&self, beat: f64) -> Option<f64> {
        self.transport().map(|t| t.time_base.beat_to_audio_time(beat))
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            phase: self.phase(),
            bpm: self.bpm(),
            now_beat: self.now_beat(),
            frontier_beat: self.frontier_beat(),
            cursor: self.score().map_or(0, |s| s.cursor()),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

fn valid_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Fire-and-forget: a failed send is logged and the session carries on.
fn emit(sink: &mut dyn EventSink, message: OutboundMessage) {
    let kind = message.kind();
    if let Err(e) = sink.send(message) {
        log::warn!("dropped outbound {kind}: {e}");
    }
}
