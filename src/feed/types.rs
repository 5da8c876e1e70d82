//! Sample and lifecycle event types delivered by the upstream face tracker.
//!
//! Only the two eye-open probabilities and a timestamp are carried per frame;
//! no image data ever reaches the monitor.

use serde::{Deserialize, Serialize};

/// Probability reported by the face tracker when it could not classify an eye.
pub const UNKNOWN_PROBABILITY: f32 = -1.0;

/// Identifier the upstream tracker assigns to a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub u32);

impl std::fmt::Display for FaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One frame's eye-openness reading for a single face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Probability that the left eye is open, or [`UNKNOWN_PROBABILITY`]
    pub left_open_prob: f32,
    /// Probability that the right eye is open, or [`UNKNOWN_PROBABILITY`]
    pub right_open_prob: f32,
    /// Frame time in milliseconds on the monitor's clock
    pub timestamp_ms: i64,
}

impl Sample {
    pub fn new(left_open_prob: f32, right_open_prob: f32, timestamp_ms: i64) -> Self {
        Self {
            left_open_prob,
            right_open_prob,
            timestamp_ms,
        }
    }

    /// A frame where the tracker could not read the eyes.
    pub fn unknown(timestamp_ms: i64) -> Self {
        Self::new(UNKNOWN_PROBABILITY, UNKNOWN_PROBABILITY, timestamp_ms)
    }

    /// Validate the reading.
    ///
    /// Frames that fail here carry no observation and must not touch any
    /// closure or blink state.
    pub fn openness(&self) -> Result<EyeOpenness, SampleError> {
        let (left, right) = (self.left_open_prob, self.right_open_prob);

        if left == UNKNOWN_PROBABILITY || right == UNKNOWN_PROBABILITY {
            return Err(SampleError::Unknown);
        }
        if !(0.0..=1.0).contains(&left) || !(0.0..=1.0).contains(&right) {
            return Err(SampleError::OutOfRange { left, right });
        }

        Ok(EyeOpenness { left, right })
    }
}

/// A validated pair of eye-open probabilities, both within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeOpenness {
    pub left: f32,
    pub right: f32,
}

/// Why a sample was skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleError {
    /// The tracker reported the unknown sentinel for at least one eye
    Unknown,
    /// A probability is NaN or outside [0, 1]
    OutOfRange { left: f32, right: f32 },
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::Unknown => write!(f, "eye state unknown"),
            SampleError::OutOfRange { left, right } => {
                write!(f, "probabilities out of range: left={left}, right={right}")
            }
        }
    }
}

impl std::error::Error for SampleError {}

/// Face lifecycle signal from the upstream tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FaceEvent {
    /// A face started being tracked
    New { face: FaceId, at_ms: i64 },
    /// A new frame for a tracked face
    Update {
        face: FaceId,
        left: f32,
        right: f32,
        at_ms: i64,
    },
    /// The face was not found in the latest frame
    Missing { face: FaceId, at_ms: i64 },
    /// Tracking of the face has ended for good
    Done { face: FaceId, at_ms: i64 },
}

impl FaceEvent {
    pub fn update(face: FaceId, sample: Sample) -> Self {
        FaceEvent::Update {
            face,
            left: sample.left_open_prob,
            right: sample.right_open_prob,
            at_ms: sample.timestamp_ms,
        }
    }

    pub fn face(&self) -> FaceId {
        match self {
            FaceEvent::New { face, .. }
            | FaceEvent::Update { face, .. }
            | FaceEvent::Missing { face, .. }
            | FaceEvent::Done { face, .. } => *face,
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        match self {
            FaceEvent::New { at_ms, .. }
            | FaceEvent::Update { at_ms, .. }
            | FaceEvent::Missing { at_ms, .. }
            | FaceEvent::Done { at_ms, .. } => *at_ms,
        }
    }

    /// The sample carried by an update, if this is one.
    pub fn sample(&self) -> Option<Sample> {
        match *self {
            FaceEvent::Update {
                left, right, at_ms, ..
            } => Some(Sample::new(left, right, at_ms)),
            _ => None,
        }
    }
}
