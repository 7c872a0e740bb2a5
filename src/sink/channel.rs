//! Channel sink — mpsc-based bridge from the scheduling thread to any consumer thread.

use std::sync::mpsc;
use std::time::Duration;

use super::{EventSink, SinkError};
use crate::protocol::OutboundMessage;

/// Sender half, owned by the scheduler.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<OutboundMessage>,
}

impl EventSink for ChannelSink {
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError> {
        self.tx.send(message).map_err(|_| SinkError::Disconnected)
    }
}

/// Receiver half, held by whoever dispatches to the synthesizer.
pub struct OutboundReceiver {
    rx: mpsc::Receiver<OutboundMessage>,
}

impl OutboundReceiver {
    /// Non-blocking poll for the next message.
    pub fn poll(&self) -> Option<OutboundMessage> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<OutboundMessage> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain all pending messages.
    pub fn drain(&self) -> Vec<OutboundMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

/// Create a new outbound channel pair.
pub fn outbound_channel() -> (ChannelSink, OutboundReceiver) {
    let (tx, rx) = mpsc::channel();
    (ChannelSink { tx }, OutboundReceiver { rx })
}
