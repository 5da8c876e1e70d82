//! Face sample feed for the drive-alive monitor.
//!
//! The monitor never runs a face detector itself. It consumes face
//! lifecycle events (new, update, missing, done) produced upstream, either
//! live or replayed from a recording.

pub mod replay;
pub mod types;

// Re-export commonly used types
pub use replay::{parse_line, FeedError, Pacing, ReplayFeed};
pub use types::{EyeOpenness, FaceEvent, FaceId, Sample, SampleError, UNKNOWN_PROBABILITY};
