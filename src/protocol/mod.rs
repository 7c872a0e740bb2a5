//! Message protocol between the controller, the scheduler, and the sink.
//!
//! Every message is one JSON object tagged by a `type` field. Inbound
//! [`ControlMessage`]s drive the scheduler; outbound [`OutboundMessage`]s are
//! what the sink receives. On a byte stream each message occupies one line.

pub mod control;
pub mod outbound;

pub use control::{ControlMessage, InitParams, WireNote};
pub use outbound::{OutboundMessage, ScheduledEvent, StatusReport};

use std::fmt;

/// Failure to decode or encode a protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Not JSON, unknown `type`, or missing/invalid fields.
    Malformed(String),
    /// Serialization failed.
    Encode(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed(e) => write!(f, "malformed message: {e}"),
            ProtocolError::Encode(e) => write!(f, "failed to encode message: {e}"),
        }
    }
}

impl std::error::Error for ProtocolError {}
