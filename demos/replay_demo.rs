//! Demonstration of the drowsiness monitor on a synthetic drive.
//!
//! This example shows how to:
//! 1. Create a monitor with a channel-backed actuator
//! 2. Feed it face lifecycle events
//! 3. Receive the alerts it raises
//! 4. Query the shared face count and rapid blinking notification
//!
//! Run with: cargo run --example replay_demo

use drive_alive::{
    alarm::{ChannelActuator, NoopRenderSink},
    Config, FaceEvent, FaceId, FaceMonitor, Sample,
};

const FRAME_MS: i64 = 33;

fn main() {
    println!("drive-alive - Replay Demo");
    println!("=========================");
    println!();

    let (actuator, alerts) = ChannelActuator::channel();
    let mut monitor = FaceMonitor::new(Config::default(), actuator, NoopRenderSink);
    let face = FaceId(1);

    monitor.handle(FaceEvent::New { face, at_ms: 0 });
    println!("Faces tracked: {}", monitor.face_number());

    let mut events = Vec::new();
    let mut t = 0;

    // Alert driving with a normal blink every few seconds.
    for second in 0..6 {
        let blink_at = second * 3000 + 1500;
        while t < (second + 1) * 3000 {
            let closed = (blink_at..blink_at + 120).contains(&t);
            events.push(frame(face, closed, t));
            t += FRAME_MS;
        }
    }

    // Fatigue sets in: three quick blinks.
    for _ in 0..3 {
        for i in 0..30 {
            events.push(frame(face, i < 4, t));
            t += FRAME_MS;
        }
    }

    // Then the eyes close for almost a second.
    for _ in 0..30 {
        events.push(frame(face, true, t));
        t += FRAME_MS;
    }

    for event in events {
        let at = event.timestamp_ms();
        monitor.handle(event);
        while let Ok(alert) = alerts.try_recv() {
            println!(
                "[{:>6} ms] {} (blinking too fast: {})",
                alert.at_ms,
                alert.kind,
                monitor.is_blinking_too_fast(at)
            );
        }
    }

    monitor.handle(FaceEvent::Done { face, at_ms: t });
    println!();
    println!("Faces tracked: {}", monitor.face_number());
    println!();
    println!("{}", monitor.stats().summary());
}

fn frame(face: FaceId, closed: bool, at_ms: i64) -> FaceEvent {
    let sample = if closed {
        Sample::new(0.08, 0.12, at_ms)
    } else {
        Sample::new(0.92, 0.88, at_ms)
    };
    FaceEvent::update(face, sample)
}
