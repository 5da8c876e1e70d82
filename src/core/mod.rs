//! Core analysis for the drive-alive monitor.
//!
//! This module contains:
//! - Eye-state classification from open probabilities
//! - Prolonged closure detection
//! - Rapid blinking detection with a shared, self-expiring alert
//! - Per-face sessions and the shared face registry
//! - The lifecycle dispatcher tying them to the actuator and render sink

pub mod blink_rate;
pub mod classifier;
pub mod monitor;
pub mod registry;
pub mod session;
pub mod watchdog;

// Re-export commonly used types
pub use blink_rate::{BlinkHistory, BlinkRateMonitor, RapidBlinkAlert};
pub use classifier::{
    BlinkClassifier, EyeState, BOTH_EYES_CLOSED_THRESHOLD, ONE_EYE_CLOSED_THRESHOLD,
};
pub use monitor::FaceMonitor;
pub use registry::{create_shared_registry, FaceRegistry, SharedFaceRegistry};
pub use session::{FaceSession, FrameAnalysis, FrameOutcome, SessionState};
pub use watchdog::{ClosureState, ClosureUpdate, ClosureWatchdog};
