//! OSC sink — sends outbound messages to a synthesizer over UDP.
//!
//! An `events` batch becomes one bundle of `<prefix>/note` messages carrying
//! `[pitch, audioTime, durationSec]`. Everything else is a single message at
//! `<prefix>/<type>`.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use rosc::{encoder, OscBundle, OscMessage, OscPacket, OscTime, OscType};

use super::{EventSink, SinkError};
use crate::protocol::{OutboundMessage, ScheduledEvent};

/// Default address prefix for outbound OSC messages.
pub const DEFAULT_ADDRESS_PREFIX: &str = "/lookahead";

/// OSC time tag meaning "immediately".
const IMMEDIATE: OscTime = OscTime {
    seconds: 0,
    fractional: 1,
};

/// UDP socket bound to an ephemeral port, sending to one target.
pub struct OscSink {
    socket: UdpSocket,
    target: SocketAddr,
    prefix: String,
}

impl OscSink {
    /// Bind a local socket and resolve the target address.
    pub fn connect(target: &str, prefix: impl Into<String>) -> io::Result<Self> {
        let target = target.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no address for OSC target")
        })?;
        let bind = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind)?;
        Ok(Self {
            socket,
            target,
            prefix: prefix.into(),
        })
    }

    /// Resolved target address.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl EventSink for OscSink {
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError> {
        let packet = to_packet(&self.prefix, &message);
        let bytes = encoder::encode(&packet).map_err(|e| SinkError::Io(e.to_string()))?;
        self.socket
            .send_to(&bytes, self.target)
            .map(|_| ())
            .map_err(|e| SinkError::Io(e.to_string()))
    }
}

/// Translate an outbound message into its OSC form.
pub fn to_packet(prefix: &str, message: &OutboundMessage) -> OscPacket {
    match message {
        OutboundMessage::Events { events } => OscPacket::Bundle(OscBundle {
            timetag: IMMEDIATE,
            content: events.iter().map(|e| note_message(prefix, e)).collect(),
        }),
        OutboundMessage::Status(report) => OscPacket::Message(OscMessage {
            addr: format!("{prefix}/status"),
            args: vec![
                OscType::String(report.phase.to_string()),
                OscType::Double(report.bpm.unwrap_or(0.0)),
                OscType::Double(report.now_beat.unwrap_or(0.0)),
                OscType::Double(report.frontier_beat.unwrap_or(0.0)),
                OscType::Long(report.cursor as i64),
            ],
        }),
        other => OscPacket::Message(OscMessage {
            addr: format!("{prefix}/{}", other.kind()),
            args: Vec::new(),
        }),
    }
}

fn note_message(prefix: &str, event: &ScheduledEvent) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: format!("{prefix}/note"),
        args: vec![
            OscType::String(event.pitch.clone()),
            OscType::Double(event.audio_time),
            OscType::Double(event.duration_sec),
        ],
    })
}
