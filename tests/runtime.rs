//! The scheduling thread end to end: JSON in, outbound messages out, real time.

use std::thread;
use std::time::{Duration, Instant};

use assert_approx_eq::assert_approx_eq;

use lookahead::config::SchedulerConfig;
use lookahead::protocol::{ControlMessage, OutboundMessage};
use lookahead::scheduler::{Phase, SchedulerHandle};
use lookahead::sink::{outbound_channel, OutboundReceiver};

const WAIT: Duration = Duration::from_secs(3);

/// Next message that is not a lifecycle `ready`.
fn next(rx: &OutboundReceiver) -> OutboundMessage {
    loop {
        match rx.recv_timeout(WAIT) {
            Some(OutboundMessage::Ready) => continue,
            Some(message) => return message,
            None => panic!("no message within {WAIT:?}"),
        }
    }
}

#[test]
fn single_note_session_over_json() {
    let (sink, rx) = outbound_channel();
    let handle = SchedulerHandle::spawn(SchedulerConfig::default(), sink).unwrap();

    handle
        .send_json(
            r#"{"type":"init","bpm":120,"startBeat":0,
                "notes":[{"id":"a","pitch":"C4","start":0,"duration":1}],
                "lookaheadSec":0.35,"tickSec":0.05,"maxEndBeat":2,"baseAudioTime":10.0}"#,
        )
        .unwrap();
    let started = Instant::now();
    handle
        .send_json(r#"{"type":"start","baseAudioTime":10.0}"#)
        .unwrap();

    let OutboundMessage::Events { events } = next(&rx) else {
        panic!("expected the first batch");
    };
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].pitch, "C4");
    assert_approx_eq!(events[0].audio_time, 10.0);
    assert_approx_eq!(events[0].duration_sec, 0.5);

    assert_eq!(next(&rx), OutboundMessage::Ended);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(950), "ended after {elapsed:?}");

    handle.send_json(r#"{"type":"status"}"#).unwrap();
    let OutboundMessage::Status(report) = next(&rx) else {
        panic!("expected status");
    };
    assert_eq!(report.phase, Phase::Ended);
    assert_eq!(report.bpm, Some(120.0));
    assert_eq!(report.cursor, 1);

    handle.send_json(r#"{"type":"quit"}"#).unwrap();
    handle.join().unwrap();
    assert_eq!(next(&rx), OutboundMessage::Exit);
}

#[test]
fn stop_silences_the_session() {
    let (sink, rx) = outbound_channel();
    let handle = SchedulerHandle::spawn(SchedulerConfig::default(), sink).unwrap();

    let notes: Vec<String> = (0..64)
        .map(|i| format!(r#"{{"id":{i},"pitch":"C4","start":{},"duration":0.5}}"#, i as f64 * 0.5))
        .collect();
    handle
        .send_json(&format!(
            r#"{{"type":"init","bpm":240,"startBeat":0,"notes":[{}],"maxEndBeat":null,"baseAudioTime":0}}"#,
            notes.join(",")
        ))
        .unwrap();
    handle.send(ControlMessage::start()).unwrap();
    assert!(matches!(next(&rx), OutboundMessage::Events { .. }));

    handle.send(ControlMessage::Stop).unwrap();
    handle.send(ControlMessage::Ping).unwrap();
    // Anything queued before the stop drains ahead of the pong.
    while next(&rx) != OutboundMessage::Pong {}

    thread::sleep(Duration::from_millis(200));
    assert!(rx.drain().is_empty());

    handle.shutdown().unwrap();
    assert_eq!(next(&rx), OutboundMessage::Exit);
}

#[test]
fn malformed_input_leaves_state_alone() {
    let (sink, rx) = outbound_channel();
    let handle = SchedulerHandle::spawn(SchedulerConfig::default(), sink).unwrap();

    for bad in [
        "",
        "{}",
        r#"{"type":"init","bpm":120}"#,
        r#"{"type":"seek","startBeat":"soon","baseAudioTime":0}"#,
        r#"{"type":"fastForward"}"#,
    ] {
        handle.send_json(bad).unwrap();
    }
    handle.send(ControlMessage::Status).unwrap();
    let OutboundMessage::Status(report) = next(&rx) else {
        panic!("expected status");
    };
    assert_eq!(report.phase, Phase::Idle);
    assert_eq!(report.bpm, None);
}

#[test]
fn ring_sink_carries_batches() {
    let config = SchedulerConfig::default();
    let (sink, mut consumer) = config.event_ring();
    let handle = SchedulerHandle::spawn(config, sink).unwrap();

    handle
        .send_json(
            r#"{"type":"init","bpm":120,"startBeat":0,
                "notes":[{"id":"a","pitch":"A3","start":0,"duration":1},
                         {"id":"b","pitch":"A4","start":0.5,"duration":1}],
                "maxEndBeat":1,"baseAudioTime":0}"#,
        )
        .unwrap();
    handle.send(ControlMessage::start()).unwrap();

    let deadline = Instant::now() + WAIT;
    let mut seen = Vec::new();
    while !seen.contains(&OutboundMessage::Ended) {
        assert!(Instant::now() < deadline, "ring never saw ended: {seen:?}");
        match consumer.pop() {
            Some(message) => seen.push(message),
            None => thread::sleep(Duration::from_millis(5)),
        }
    }
    handle.shutdown().unwrap();

    assert_eq!(seen[0], OutboundMessage::Ready);
    let pitches: Vec<&str> = seen
        .iter()
        .flat_map(|m| m.events())
        .map(|e| e.pitch.as_str())
        .collect();
    assert_eq!(pitches, vec!["A3", "A4"]);
}

#[test]
fn tempo_change_over_the_wire_keeps_phase() {
    let (sink, rx) = outbound_channel();
    let handle = SchedulerHandle::spawn(SchedulerConfig::default(), sink).unwrap();

    handle
        .send_json(
            r#"{"type":"init","bpm":60,"startBeat":0,"notes":[],"baseAudioTime":0}"#,
        )
        .unwrap();
    handle.send(ControlMessage::start()).unwrap();
    thread::sleep(Duration::from_millis(300));

    handle.send(ControlMessage::Status).unwrap();
    let OutboundMessage::Status(before) = next(&rx) else {
        panic!("expected status");
    };
    handle.send(ControlMessage::UpdateBpm { bpm: 120.0 }).unwrap();
    handle.send(ControlMessage::Status).unwrap();
    let OutboundMessage::Status(after) = next(&rx) else {
        panic!("expected status");
    };

    assert_eq!(after.bpm, Some(120.0));
    let (before, after) = (before.now_beat.unwrap(), after.now_beat.unwrap());
    assert!(after >= before);
    // Only the time between the two status reads may separate them.
    assert!(after - before < 0.2, "jumped from {before} to {after}");
}
