//! Sinks — where outbound messages go.
//!
//! The scheduler never blocks on a sink and never waits for acknowledgement.
//! A failed send is reported back as a [`SinkError`]; the scheduler logs it
//! and keeps the session alive so later emissions can get through.

pub mod channel;
pub mod json_lines;
pub mod osc;
pub mod ring;

pub use channel::{outbound_channel, ChannelSink, OutboundReceiver};
pub use json_lines::JsonLineSink;
pub use osc::OscSink;
pub use ring::{event_ring, EventConsumer, RingSink};

use std::fmt;

use crate::protocol::OutboundMessage;

/// Why a message did not reach the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkError {
    /// The receiving side is gone.
    Disconnected,
    /// A bounded queue has no free slot.
    Full,
    /// Writing or encoding failed.
    Io(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Disconnected => write!(f, "sink disconnected"),
            SinkError::Full => write!(f, "sink queue is full"),
            SinkError::Io(e) => write!(f, "sink i/o error: {e}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Fire-and-forget destination for outbound messages.
pub trait EventSink {
    /// Hand one message over. Must not block.
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError>;
}

/// Collecting sink, mostly for tests and offline rendering.
impl EventSink for Vec<OutboundMessage> {
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError> {
        self.push(message);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError> {
        (**self).send(message)
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError> {
        (**self).send(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_collects_in_order() {
        let mut sink: Vec<OutboundMessage> = Vec::new();
        sink.send(OutboundMessage::Ready).unwrap();
        sink.send(OutboundMessage::Ended).unwrap();
        assert_eq!(sink, vec![OutboundMessage::Ready, OutboundMessage::Ended]);
    }

    #[test]
    fn boxed_and_borrowed_sinks_forward() {
        let mut boxed: Box<dyn EventSink> = Box::new(Vec::<OutboundMessage>::new());
        assert!(boxed.send(OutboundMessage::Pong).is_ok());

        let mut inner: Vec<OutboundMessage> = Vec::new();
        {
            let mut borrowed = &mut inner;
            EventSink::send(&mut borrowed, OutboundMessage::Pong).unwrap();
        }
        assert_eq!(inner, vec![OutboundMessage::Pong]);
    }

    #[test]
    fn sink_error_display() {
        assert_eq!(SinkError::Disconnected.to_string(), "sink disconnected");
        assert_eq!(SinkError::Full.to_string(), "sink queue is full");
        assert_eq!(
            SinkError::Io("broken pipe".to_string()).to_string(),
            "sink i/o error: broken pipe"
        );
    }
}
