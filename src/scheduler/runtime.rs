//! Scheduler runtime — drives a [`LookaheadScheduler`] on a dedicated thread.
//!
//! Control messages and timer ticks are handled one at a time on the same
//! thread, so a tick never observes a half-applied control message. The loop
//! waits on its inbox with a timeout equal to the time left until the next
//! tick; while nothing is running it blocks on the inbox alone.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use super::{LookaheadScheduler, TickOutcome};
use crate::config::SchedulerConfig;
use crate::protocol::{ControlMessage, OutboundMessage};
use crate::sink::EventSink;
use crate::timing::{MonotonicClock, PacingClock};

enum Envelope {
    Control(ControlMessage),
    Shutdown,
}

/// Failure to start or reach the scheduling thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    Spawn(String),
    /// The scheduling thread has exited.
    Disconnected,
    /// The scheduling thread panicked outside a tick.
    Panicked,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Spawn(e) => write!(f, "failed to spawn scheduler thread: {e}"),
            RuntimeError::Disconnected => write!(f, "scheduler thread is gone"),
            RuntimeError::Panicked => write!(f, "scheduler thread panicked"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Cloneable inbox handle, for feeding the scheduler from other threads.
#[derive(Clone)]
pub struct ControlSender {
    tx: mpsc::Sender<Envelope>,
}

impl ControlSender {
    pub fn send(&self, message: ControlMessage) -> Result<(), RuntimeError> {
        self.tx
            .send(Envelope::Control(message))
            .map_err(|_| RuntimeError::Disconnected)
    }

    /// Decode and forward one JSON control message.
    ///
    /// Malformed input is dropped here and reported as `Ok`; only a dead
    /// scheduling thread is an error.
    pub fn send_json(&self, text: &str) -> Result<(), RuntimeError> {
        match ControlMessage::from_json(text) {
            Ok(message) => self.send(message),
            Err(e) => {
                log::debug!("dropping control message: {e}");
                Ok(())
            }
        }
    }

    /// Ask the loop to exit after the message it is handling.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Envelope::Shutdown);
    }
}

/// Owner of the scheduling thread. Dropping it shuts the thread down.
pub struct SchedulerHandle {
    sender: ControlSender,
    thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Start the scheduling thread with a monotonic pacing clock.
    ///
    /// `ready` is the first message the sink sees.
    pub fn spawn<S>(config: SchedulerConfig, sink: S) -> Result<Self, RuntimeError>
    where
        S: EventSink + Send + 'static,
    {
        Self::spawn_with_clock(config, MonotonicClock::new, sink)
    }

    /// Start the scheduling thread with a clock built on that thread.
    pub fn spawn_with_clock<C, F, S>(
        config: SchedulerConfig,
        make_clock: F,
        sink: S,
    ) -> Result<Self, RuntimeError>
    where
        C: PacingClock,
        F: FnOnce() -> C + Send + 'static,
        S: EventSink + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("lookahead-scheduler".to_string())
            .spawn(move || {
                let scheduler = LookaheadScheduler::new(make_clock(), config);
                run(rx, scheduler, sink);
            })
            .map_err(|e| RuntimeError::Spawn(e.to_string()))?;

        Ok(Self {
            sender: ControlSender { tx },
            thread: Some(thread),
        })
    }

    pub fn send(&self, message: ControlMessage) -> Result<(), RuntimeError> {
        self.sender.send(message)
    }

    pub fn send_json(&self, text: &str) -> Result<(), RuntimeError> {
        self.sender.send_json(text)
    }

    pub fn sender(&self) -> ControlSender {
        self.sender.clone()
    }

    /// Stop the loop and wait for it. `exit` is the last message sent.
    pub fn shutdown(mut self) -> Result<(), RuntimeError> {
        self.sender.shutdown();
        self.wait()
    }

    /// Wait for the loop to exit on its own (after `quit`).
    pub fn join(mut self) -> Result<(), RuntimeError> {
        self.wait()
    }

    fn wait(&mut self) -> Result<(), RuntimeError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| RuntimeError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.sender.shutdown();
            let _ = self.wait();
        }
    }
}

fn run<C: PacingClock, S: EventSink>(
    rx: mpsc::Receiver<Envelope>,
    mut scheduler: LookaheadScheduler<C>,
    mut sink: S,
) {
    send(&mut sink, OutboundMessage::Ready);
    log::info!("scheduler thread ready");

    let mut next_tick: Option<Instant> = None;
    loop {
        let envelope = match next_tick {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    None
                } else {
                    match rx.recv_timeout(deadline - now) {
                        Ok(envelope) => Some(envelope),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            }
            None => match rx.recv() {
                Ok(envelope) => Some(envelope),
                Err(_) => break,
            },
        };

        match envelope {
            Some(Envelope::Shutdown) | Some(Envelope::Control(ControlMessage::Quit)) => break,
            Some(Envelope::Control(message)) => {
                let was_running = scheduler.is_running();
                scheduler.handle(message, &mut sink);
                next_tick = match scheduler.tick_interval() {
                    // First tick of a run fires right away.
                    Some(_) if !was_running => Some(Instant::now()),
                    Some(_) => next_tick,
                    None => None,
                };
            }
            None => {
                let scheduled = next_tick.unwrap_or_else(Instant::now);
                tick(&mut scheduler, &mut sink);
                next_tick = scheduler.tick_interval().map(|interval| {
                    let now = Instant::now();
                    let deadline = scheduled + interval;
                    if deadline < now {
                        now + interval
                    } else {
                        deadline
                    }
                });
            }
        }
    }

    log::info!("scheduler thread exiting");
    send(&mut sink, OutboundMessage::Exit);
}

fn tick<C: PacingClock, S: EventSink>(scheduler: &mut LookaheadScheduler<C>, sink: &mut S) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| scheduler.tick(sink)));
    match result {
        Ok(TickOutcome::Ended { emitted }) => {
            log::debug!("final tick emitted {emitted} notes");
        }
        Ok(_) => {}
        Err(_) => log::error!("tick panicked; session left as is"),
    }
}

fn send<S: EventSink>(sink: &mut S, message: OutboundMessage) {
    let kind = message.kind();
    if let Err(e) = sink.send(message) {
        log::warn!("dropped outbound {kind}: {e}");
    }
}
