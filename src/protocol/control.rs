//! Inbound control messages.
//!
//! Unknown `type` values and missing fields fail to decode, which is how the
//! scheduler drops malformed input without touching its state. Value-level
//! checks (tempo range, finite beats) happen later, at the session boundary.

use serde::{Deserialize, Serialize};

use super::ProtocolError;
use crate::score::{Note, NoteError, NoteId};

/// A note as the controller submits it. Not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNote {
    pub id: NoteId,
    pub pitch: String,
    pub start: f64,
    pub duration: f64,
}

impl WireNote {
    pub fn new(id: impl Into<NoteId>, pitch: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            id: id.into(),
            pitch: pitch.into(),
            start,
            duration,
        }
    }

    /// Validate into a session [`Note`].
    pub fn into_note(self) -> Result<Note, NoteError> {
        Note::new(self.id, self.pitch, self.start, self.duration)
    }
}

/// Parameters of an `init` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitParams {
    pub bpm: f64,
    pub start_beat: f64,
    pub notes: Vec<WireNote>,
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub lookahead_sec: Option<f64>,
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub tick_sec: Option<f64>,
    /// `null` or absent means unbounded playback.
    #[serde(default)]
    pub max_end_beat: Option<f64>,
    pub base_audio_time: f64,
}

impl InitParams {
    /// Session parameters with the usual lookahead and tick, unbounded.
    pub fn new(bpm: f64, start_beat: f64, notes: Vec<WireNote>, base_audio_time: f64) -> Self {
        Self {
            bpm,
            start_beat,
            notes,
            lookahead_sec: None,
            tick_sec: None,
            max_end_beat: None,
            base_audio_time,
        }
    }

    pub fn with_lookahead_sec(mut self, lookahead_sec: f64) -> Self {
        self.lookahead_sec = Some(lookahead_sec);
        self
    }

    pub fn with_tick_sec(mut self, tick_sec: f64) -> Self {
        self.tick_sec = Some(tick_sec);
        self
    }

    pub fn with_max_end_beat(mut self, max_end_beat: f64) -> Self {
        self.max_end_beat = Some(max_end_beat);
        self
    }
}

/// A command from the controller to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlMessage {
    /// Replace the score and arm a new session.
    Init(InitParams),

    /// Begin periodic ticks. An audio reading re-anchors the session.
    #[serde(rename_all = "camelCase")]
    Start {
        #[serde(default)]
        base_audio_time: Option<f64>,
    },

    /// Cancel ticks without emitting `ended`.
    Stop,

    /// Jump to a beat, anchored at the given audio time.
    #[serde(rename_all = "camelCase")]
    Seek { start_beat: f64, base_audio_time: f64 },

    /// Change tempo without a jump in the audible position.
    UpdateBpm { bpm: f64 },

    /// Liveness probe, answered with `pong`.
    Ping,

    /// Ask for a `status` report.
    Status,

    /// Shut the scheduling thread down.
    Quit,
}

impl ControlMessage {
    /// `start` without re-anchoring.
    pub fn start() -> Self {
        ControlMessage::Start {
            base_audio_time: None,
        }
    }

    /// `start` anchored at `audio_now`.
    pub fn start_at(audio_now: f64) -> Self {
        ControlMessage::Start {
            base_audio_time: Some(audio_now),
        }
    }

    /// Decode one JSON message.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Encode as a single JSON line (no trailing newline).
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Init(_) => "init",
            ControlMessage::Start { .. } => "start",
            ControlMessage::Stop => "stop",
            ControlMessage::Seek { .. } => "seek",
            ControlMessage::UpdateBpm { .. } => "updateBpm",
            ControlMessage::Ping => "ping",
            ControlMessage::Status => "status",
            ControlMessage::Quit => "quit",
        }
    }
}
