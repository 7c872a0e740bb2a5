//! Outbound messages — what the sink receives from the scheduler.

use serde::{Deserialize, Serialize};

use super::ProtocolError;
use crate::scheduler::Phase;

/// One note dispatch, timed on the audio clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub pitch: String,
    /// Absolute audio-clock time in seconds.
    pub audio_time: f64,
    pub duration_sec: f64,
}

/// Snapshot of the scheduler, answered to a `status` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub phase: Phase,
    pub bpm: Option<f64>,
    pub now_beat: Option<f64>,
    pub frontier_beat: Option<f64>,
    pub cursor: usize,
}

/// A message from the scheduler to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// The scheduling context is up and accepts messages.
    Ready,
    /// One non-empty lookahead batch, in ascending beat order.
    Events { events: Vec<ScheduledEvent> },
    /// Playback reached its end beat.
    Ended,
    /// Answer to `ping`.
    Pong,
    /// Answer to `status`.
    Status(StatusReport),
    /// The scheduling context has shut down. Always the last message.
    Exit,
}

impl OutboundMessage {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Ready => "ready",
            OutboundMessage::Events { .. } => "events",
            OutboundMessage::Ended => "ended",
            OutboundMessage::Pong => "pong",
            OutboundMessage::Status(_) => "status",
            OutboundMessage::Exit => "exit",
        }
    }

    /// Events carried by an `events` batch; empty for anything else.
    pub fn events(&self) -> &[ScheduledEvent] {
        match self {
            OutboundMessage::Events { events } => events,
            _ => &[],
        }
    }
}
