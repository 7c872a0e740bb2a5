//! Newline-delimited JSON sink, one outbound message per line.

use std::io::Write;

use super::{EventSink, SinkError};
use crate::protocol::OutboundMessage;

/// Writes each message as a JSON line and flushes immediately.
pub struct JsonLineSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLineSink<W> {
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError> {
        let line = message.to_json().map_err(|e| SinkError::Io(e.to_string()))?;
        writeln!(self.writer, "{line}").map_err(|e| SinkError::Io(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| SinkError::Io(e.to_string()))
    }
}
