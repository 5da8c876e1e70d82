//! Per-face analysis session.
//!
//! A session exists for as long as the upstream tracker follows one face:
//!
//! ```text
//!   acquire ──▶ Active ──lost──▶ Missing ──reacquire──▶ Active
//!                 │                 │
//!                 └─────removed─────┴──────▶ Ended
//! ```
//!
//! Entering `Active` counts the face in the shared registry and starts
//! from a clean closure state and blink history. Leaving it releases the
//! face exactly once and throws that state away. A session dropped while
//! still active releases its face too.

use crate::alarm::AlertKind;
use crate::config::Config;
use crate::core::blink_rate::{BlinkHistory, BlinkRateMonitor};
use crate::core::classifier::{BlinkClassifier, EyeState};
use crate::core::registry::SharedFaceRegistry;
use crate::core::watchdog::{ClosureState, ClosureWatchdog};
use crate::feed::types::{FaceId, Sample, SampleError};

/// Log the raw probabilities every this many frames.
const PROBABILITY_LOG_INTERVAL: u64 = 10;

/// Where a session is in the face lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Missing,
    Ended,
}

/// Analysis of one valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAnalysis {
    pub eye_state: EyeState,
    /// False when the frame should be flagged (red outline)
    pub valid_frame: bool,
    /// Alert raised by this frame, if any
    pub alert: Option<AlertKind>,
    /// Whether this frame completed a blink
    pub blink_completed: bool,
}

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Single face in view and a usable sample
    Analyzed(FrameAnalysis),
    /// Several faces in view, so nothing was analyzed
    Unanalyzed,
    /// The sample carried no usable observation
    Skipped(SampleError),
    /// The session is not tracking its face right now
    Inactive,
}

impl FrameOutcome {
    /// Validity to show on the face indicator, `None` when nothing should be drawn.
    pub fn valid_frame(&self) -> Option<bool> {
        match self {
            FrameOutcome::Analyzed(analysis) => Some(analysis.valid_frame),
            FrameOutcome::Unanalyzed => Some(false),
            FrameOutcome::Skipped(_) | FrameOutcome::Inactive => None,
        }
    }

    pub fn alert(&self) -> Option<AlertKind> {
        match self {
            FrameOutcome::Analyzed(analysis) => analysis.alert,
            _ => None,
        }
    }
}

/// Counts frames and periodically logs the achieved frame rate.
#[derive(Debug, Clone)]
struct FrameMeter {
    total: u64,
    started_ms: Option<i64>,
    log_interval: u64,
}

impl FrameMeter {
    fn new(log_interval: u64) -> Self {
        Self {
            total: 0,
            started_ms: None,
            log_interval,
        }
    }

    fn tick(&mut self, face: FaceId, now_ms: i64) {
        let started = *self.started_ms.get_or_insert(now_ms);
        self.total += 1;

        if self.log_interval > 0 && self.total % self.log_interval == 0 {
            let elapsed_secs = now_ms.saturating_sub(started) as f64 / 1000.0;
            if elapsed_secs > 0.0 {
                tracing::info!(
                    "Face {}: {:.1} frames per second",
                    face,
                    self.total as f64 / elapsed_secs
                );
            }
        }
    }

    fn should_log_probabilities(&self) -> bool {
        self.total % PROBABILITY_LOG_INTERVAL == 0
    }
}

/// Analysis state for one tracked face.
#[derive(Debug)]
pub struct FaceSession {
    face: FaceId,
    registry: SharedFaceRegistry,
    classifier: BlinkClassifier,
    watchdog: ClosureWatchdog,
    blink_rate: Option<BlinkRateMonitor>,
    state: SessionState,
    frames: FrameMeter,
}

impl FaceSession {
    /// Start tracking a face, counting it in the registry.
    pub fn acquire(face: FaceId, registry: SharedFaceRegistry, config: &Config) -> Self {
        let count = registry.face_acquired();
        tracing::info!("New face {}, {} face(s) tracked", face, count);

        Self {
            face,
            registry,
            classifier: BlinkClassifier::new(&config.classifier),
            watchdog: ClosureWatchdog::new(&config.closure),
            blink_rate: config
                .blink_rate
                .enabled
                .then(|| BlinkRateMonitor::new(&config.blink_rate)),
            state: SessionState::Active,
            frames: FrameMeter::new(config.frame_log_interval),
        }
    }

    pub fn face(&self) -> FaceId {
        self.face
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn closure_state(&self) -> ClosureState {
        self.watchdog.state()
    }

    /// Blink history, `None` when blink-rate analysis is disabled.
    pub fn blink_history(&self) -> Option<&BlinkHistory> {
        self.blink_rate.as_ref().map(BlinkRateMonitor::history)
    }

    /// Bring a missing face back. Returns false if the session was not missing.
    pub fn reacquire(&mut self) -> bool {
        if self.state != SessionState::Missing {
            return false;
        }
        let count = self.registry.face_acquired();
        tracing::info!("Face {} found again, {} face(s) tracked", self.face, count);
        self.reset();
        self.state = SessionState::Active;
        true
    }

    /// The tracker lost the face for now. Returns true if the face was released.
    pub fn on_face_lost(&mut self) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        let count = self.registry.face_released();
        tracing::info!("Missing face {}, {} face(s) tracked", self.face, count);
        self.reset();
        self.state = SessionState::Missing;
        true
    }

    /// Tracking ended. Returns true if the face was released by this call.
    pub fn on_face_removed(&mut self) -> bool {
        let was_active = self.state == SessionState::Active;
        if was_active {
            let count = self.registry.face_released();
            tracing::info!("Removed face {}, {} face(s) tracked", self.face, count);
        }
        self.reset();
        self.state = SessionState::Ended;
        was_active
    }

    /// Analyze one frame.
    pub fn on_sample(&mut self, sample: &Sample) -> FrameOutcome {
        if self.state != SessionState::Active {
            return FrameOutcome::Inactive;
        }

        let now_ms = sample.timestamp_ms;
        self.frames.tick(self.face, now_ms);

        if !self.registry.single_face() {
            return FrameOutcome::Unanalyzed;
        }

        let eyes = match sample.openness() {
            Ok(eyes) => eyes,
            Err(e) => return FrameOutcome::Skipped(e),
        };

        if self.frames.should_log_probabilities() {
            tracing::debug!(
                "Face {}: open probabilities {:.2} {:.2}",
                self.face,
                eyes.left,
                eyes.right
            );
        }

        let eye_state = self.classifier.classify(eyes);
        let closure = self.watchdog.update(eye_state, now_ms);

        let mut analysis = FrameAnalysis {
            eye_state,
            valid_frame: closure.valid_frame,
            alert: None,
            blink_completed: false,
        };

        if closure.alert {
            tracing::warn!("Face {}: eyes closed too long", self.face);
            if let Some(monitor) = self.blink_rate.as_mut() {
                monitor.clear_history();
            }
            analysis.alert = Some(AlertKind::ProlongedClosure);
        }

        if let (Some(start), Some(monitor)) =
            (closure.completed_blink_ms, self.blink_rate.as_mut())
        {
            analysis.blink_completed = true;
            if monitor.record_blink(start, now_ms, self.registry.rapid_blink_alert()) {
                tracing::warn!("Face {}: blinking too fast", self.face);
                analysis.valid_frame = false;
                analysis.alert = Some(AlertKind::RapidBlinking);
            }
        }

        FrameOutcome::Analyzed(analysis)
    }

    fn reset(&mut self) {
        self.watchdog.reset();
        if let Some(monitor) = self.blink_rate.as_mut() {
            monitor.clear_history();
        }
    }
}

impl Drop for FaceSession {
    fn drop(&mut self) {
        if self.state == SessionState::Active {
            self.registry.face_released();
        }
    }
}
