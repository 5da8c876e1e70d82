//! Dispatch of face lifecycle events to sessions.
//!
//! [`FaceMonitor`] plays the role of the upstream tracker's callbacks: it
//! creates a [`FaceSession`] for each new face, routes samples to it, tears
//! it down when the face goes away, and forwards the results to the
//! actuator and the render sink.

use crate::alarm::{Actuator, AlertEvent, RenderSink};
use crate::config::Config;
use crate::core::registry::{create_shared_registry, SharedFaceRegistry};
use crate::core::session::{FaceSession, FrameOutcome};
use crate::feed::types::{FaceEvent, FaceId, Sample};
use crate::stats::{create_shared_stats, SharedMonitorStats};
use std::collections::HashMap;

/// Drives face sessions from lifecycle events.
pub struct FaceMonitor<A, R> {
    config: Config,
    registry: SharedFaceRegistry,
    sessions: HashMap<FaceId, FaceSession>,
    actuator: A,
    render: R,
    stats: SharedMonitorStats,
}

impl<A: Actuator, R: RenderSink> FaceMonitor<A, R> {
    /// Create a monitor with its own registry and statistics.
    pub fn new(config: Config, actuator: A, render: R) -> Self {
        let registry = create_shared_registry(&config);
        Self::with_shared(config, registry, create_shared_stats(), actuator, render)
    }

    /// Create a monitor that shares its registry and statistics with others.
    pub fn with_shared(
        config: Config,
        registry: SharedFaceRegistry,
        stats: SharedMonitorStats,
        actuator: A,
        render: R,
    ) -> Self {
        Self {
            config,
            registry,
            sessions: HashMap::new(),
            actuator,
            render,
            stats,
        }
    }

    /// Handle one lifecycle event, returning the alert it raised, if any.
    pub fn handle(&mut self, event: FaceEvent) -> Option<AlertEvent> {
        match event {
            FaceEvent::New { face, .. } => {
                self.on_new_face(face);
                None
            }
            FaceEvent::Update { face, .. } => {
                let sample = event.sample()?;
                self.on_sample(face, &sample).alert().map(|kind| AlertEvent {
                    face,
                    kind,
                    at_ms: sample.timestamp_ms,
                })
            }
            FaceEvent::Missing { face, .. } => {
                self.on_face_lost(face);
                None
            }
            FaceEvent::Done { face, .. } => {
                self.on_face_removed(face);
                None
            }
        }
    }

    /// A face started being tracked.
    pub fn on_new_face(&mut self, face: FaceId) {
        if let Some(session) = self.sessions.get_mut(&face) {
            if session.reacquire() {
                self.stats.record_face_acquired();
            } else {
                tracing::warn!("Face {} announced twice, ignoring", face);
            }
            return;
        }

        let session = FaceSession::acquire(face, self.registry.clone(), &self.config);
        self.sessions.insert(face, session);
        self.stats.record_face_acquired();
    }

    /// A new frame for a tracked face.
    pub fn on_sample(&mut self, face: FaceId, sample: &Sample) -> FrameOutcome {
        let Some(session) = self.sessions.get_mut(&face) else {
            tracing::warn!("Sample for unknown face {}, ignoring", face);
            return FrameOutcome::Inactive;
        };

        // The tracker may find a missing face again without announcing it.
        if session.reacquire() {
            self.stats.record_face_acquired();
        }

        let outcome = session.on_sample(sample);
        self.stats.record_outcome(&outcome);

        if let Some(valid_frame) = outcome.valid_frame() {
            self.render.update_face_frame(face, valid_frame);
        }

        if let Some(kind) = outcome.alert() {
            self.actuator.trigger(&AlertEvent {
                face,
                kind,
                at_ms: sample.timestamp_ms,
            });
        }

        outcome
    }

    /// The tracker lost sight of a face.
    pub fn on_face_lost(&mut self, face: FaceId) {
        match self.sessions.get_mut(&face) {
            Some(session) => {
                if session.on_face_lost() {
                    self.render.remove_face(face);
                }
            }
            None => tracing::warn!("Unknown face {} reported missing", face),
        }
    }

    /// Tracking of a face ended.
    pub fn on_face_removed(&mut self, face: FaceId) {
        match self.sessions.remove(&face) {
            Some(mut session) => {
                if session.on_face_removed() {
                    self.render.remove_face(face);
                }
            }
            None => tracing::warn!("Unknown face {} reported done", face),
        }
    }

    /// Number of faces currently tracked.
    pub fn face_number(&self) -> usize {
        self.registry.face_number()
    }

    /// Whether the rapid blinking notification is showing at `now_ms`.
    pub fn is_blinking_too_fast(&self, now_ms: i64) -> bool {
        self.registry.is_blinking_too_fast(now_ms)
    }

    pub fn session(&self, face: FaceId) -> Option<&FaceSession> {
        self.sessions.get(&face)
    }

    pub fn registry(&self) -> &SharedFaceRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &SharedMonitorStats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlertKind, ChannelActuator, NoopRenderSink};

    fn update(face: u32, left: f32, right: f32, at_ms: i64) -> FaceEvent {
        FaceEvent::update(FaceId(face), Sample::new(left, right, at_ms))
    }

    #[test]
    fn test_new_update_done() {
        let (actuator, alerts) = ChannelActuator::channel();
        let mut monitor = FaceMonitor::new(Config::default(), actuator, NoopRenderSink);

        monitor.handle(FaceEvent::New { face: FaceId(1), at_ms: 0 });
        assert_eq!(monitor.face_number(), 1);

        for t in [0, 100, 200, 300] {
            assert!(monitor.handle(update(1, 0.1, 0.1, t)).is_none());
        }
        let alert = monitor.handle(update(1, 0.1, 0.1, 400)).unwrap();
        assert_eq!(alert.kind, AlertKind::ProlongedClosure);
        assert_eq!(alerts.try_recv().unwrap(), alert);

        monitor.handle(FaceEvent::Done { face: FaceId(1), at_ms: 500 });
        assert_eq!(monitor.face_number(), 0);
        assert!(monitor.session(FaceId(1)).is_none());
    }

    #[test]
    fn test_unknown_face_is_ignored() {
        let (actuator, _alerts) = ChannelActuator::channel();
        let mut monitor = FaceMonitor::new(Config::default(), actuator, NoopRenderSink);

        assert!(monitor.handle(update(9, 0.1, 0.1, 0)).is_none());
        monitor.handle(FaceEvent::Missing { face: FaceId(9), at_ms: 0 });
        monitor.handle(FaceEvent::Done { face: FaceId(9), at_ms: 0 });
        assert_eq!(monitor.face_number(), 0);
    }

    #[test]
    fn test_update_after_missing_reacquires() {
        let (actuator, _alerts) = ChannelActuator::channel();
        let mut monitor = FaceMonitor::new(Config::default(), actuator, NoopRenderSink);

        monitor.handle(FaceEvent::New { face: FaceId(1), at_ms: 0 });
        monitor.handle(FaceEvent::Missing { face: FaceId(1), at_ms: 10 });
        assert_eq!(monitor.face_number(), 0);

        monitor.handle(update(1, 0.9, 0.9, 20));
        assert_eq!(monitor.face_number(), 1);
        assert_eq!(monitor.stats().stats().faces_acquired, 2);
    }
}
