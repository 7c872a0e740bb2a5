//! Ring sink — lock-free SPSC handoff to an in-process audio thread.
//!
//! The audio side drains with [`EventConsumer::pop`] from its callback and
//! never blocks or allocates on the queue itself.

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::{EventSink, SinkError};
use crate::protocol::OutboundMessage;

/// Producer half, owned by the scheduler.
pub struct RingSink {
    producer: HeapProd<OutboundMessage>,
}

impl EventSink for RingSink {
    fn send(&mut self, message: OutboundMessage) -> Result<(), SinkError> {
        self.producer
            .try_push(message)
            .map_err(|_| SinkError::Full)
    }
}

/// Consumer half, owned by the audio thread.
pub struct EventConsumer {
    consumer: HeapCons<OutboundMessage>,
}

impl EventConsumer {
    /// Take the oldest pending message.
    pub fn pop(&mut self) -> Option<OutboundMessage> {
        self.consumer.try_pop()
    }

    /// Number of messages waiting.
    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

/// Create a ring with room for `capacity` messages.
pub fn event_ring(capacity: usize) -> (RingSink, EventConsumer) {
    let rb = HeapRb::<OutboundMessage>::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (RingSink { producer }, EventConsumer { consumer })
}
