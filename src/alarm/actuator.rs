//! Alert events and the actuator that sounds them.

use crate::feed::types::FaceId;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;

/// The two independent drowsiness signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Eyes stayed closed past the allowed interval
    ProlongedClosure,
    /// Too many blinks in a short window
    RapidBlinking,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::ProlongedClosure => write!(f, "prolonged eye closure"),
            AlertKind::RapidBlinking => write!(f, "blinking too fast"),
        }
    }
}

/// A fired alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub face: FaceId,
    pub kind: AlertKind,
    pub at_ms: i64,
}

/// Something that can alert the driver.
///
/// Called synchronously from the frame path, so implementations must not
/// block for long.
pub trait Actuator {
    fn trigger(&self, alert: &AlertEvent);
}

impl<A: Actuator + ?Sized> Actuator for &A {
    fn trigger(&self, alert: &AlertEvent) {
        (**self).trigger(alert)
    }
}

/// Rings the terminal bell and prints the alert.
#[derive(Debug, Clone)]
pub struct TerminalAlarm {
    tone: Duration,
    bell: bool,
}

impl TerminalAlarm {
    pub fn new(tone: Duration, bell: bool) -> Self {
        Self { tone, bell }
    }
}

impl Actuator for TerminalAlarm {
    fn trigger(&self, alert: &AlertEvent) {
        let mut out = std::io::stdout().lock();
        if self.bell {
            let _ = write!(out, "\x07");
        }
        let _ = writeln!(
            out,
            "[{:>8} ms] ALERT face {}: {} (tone {} ms)",
            alert.at_ms,
            alert.face,
            alert.kind,
            self.tone.as_millis()
        );
    }
}

/// Forwards alerts to a channel, for consumers on another thread.
#[derive(Debug, Clone)]
pub struct ChannelActuator {
    sender: Sender<AlertEvent>,
}

impl ChannelActuator {
    /// Create an actuator and the receiving end of its channel.
    pub fn channel() -> (Self, Receiver<AlertEvent>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl Actuator for ChannelActuator {
    fn trigger(&self, alert: &AlertEvent) {
        if self.sender.send(*alert).is_err() {
            tracing::debug!("Alert receiver dropped, discarding {:?}", alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_actuator_forwards() {
        let (actuator, receiver) = ChannelActuator::channel();
        let alert = AlertEvent {
            face: FaceId(2),
            kind: AlertKind::RapidBlinking,
            at_ms: 1200,
        };
        actuator.trigger(&alert);
        assert_eq!(receiver.try_recv().unwrap(), alert);
    }

    #[test]
    fn test_channel_actuator_tolerates_dropped_receiver() {
        let (actuator, receiver) = ChannelActuator::channel();
        drop(receiver);
        actuator.trigger(&AlertEvent {
            face: FaceId(1),
            kind: AlertKind::ProlongedClosure,
            at_ms: 0,
        });
    }

    #[test]
    fn test_alert_wire_format() {
        let json = serde_json::to_string(&AlertEvent {
            face: FaceId(1),
            kind: AlertKind::ProlongedClosure,
            at_ms: 400,
        })
        .unwrap();
        assert_eq!(json, r#"{"face":1,"kind":"prolonged_closure","at_ms":400}"#);
    }
}
