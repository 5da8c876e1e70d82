//! Eye-state classification from per-eye open probabilities.

use crate::config::ClassifierConfig;
use crate::feed::types::EyeOpenness;
use serde::{Deserialize, Serialize};

/// Both eyes below this probability count as closed.
pub const ONE_EYE_CLOSED_THRESHOLD: f32 = 0.4;

/// Combined probability below this counts as closed.
pub const BOTH_EYES_CLOSED_THRESHOLD: f32 = 1.0;

/// Whether the driver's eyes are open in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeState {
    Open,
    Closed,
}

/// Dual-threshold classifier.
///
/// A frame is closed when both eyes individually look closed, or when the
/// two probabilities together are too low (one eye clearly shut, the other
/// doubtful).
#[derive(Debug, Clone, Copy)]
pub struct BlinkClassifier {
    one_eye_closed_threshold: f32,
    both_eyes_closed_threshold: f32,
}

impl Default for BlinkClassifier {
    fn default() -> Self {
        Self {
            one_eye_closed_threshold: ONE_EYE_CLOSED_THRESHOLD,
            both_eyes_closed_threshold: BOTH_EYES_CLOSED_THRESHOLD,
        }
    }
}

impl BlinkClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            one_eye_closed_threshold: config.one_eye_closed_threshold,
            both_eyes_closed_threshold: config.both_eyes_closed_threshold,
        }
    }

    pub fn classify(&self, eyes: EyeOpenness) -> EyeState {
        let both_low = eyes.left < self.one_eye_closed_threshold
            && eyes.right < self.one_eye_closed_threshold;
        let sum_low = eyes.left + eyes.right < self.both_eyes_closed_threshold;

        if both_low || sum_low {
            EyeState::Closed
        } else {
            EyeState::Open
        }
    }
}
