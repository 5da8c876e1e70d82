//! drive-alive - eye-closure and blink-rate analysis for drowsy driving.
//!
//! This library turns a stream of per-frame eye-open probabilities from an
//! upstream face tracker into two independent alerts:
//!
//! - **Prolonged closure**: the eyes stayed shut longer than a blink should
//!   take (300 ms by default)
//! - **Rapid blinking**: three blinks within six seconds, shown for four
//!   seconds after it fires
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           drive-alive                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌──────────────┐   ┌────────────┐              │
//! │  │    Feed    │──▶│ FaceSession  │──▶│ Classifier │              │
//! │  │ (lifecycle)│   │  (per face)  │   └─────┬──────┘              │
//! │  └────────────┘   └──────┬───────┘         ▼                     │
//! │                          │          ┌────────────┐  ┌──────────┐ │
//! │                          │          │  Closure   │─▶│BlinkRate │ │
//! │                          │          │  Watchdog  │  │ Monitor  │ │
//! │                          ▼          └─────┬──────┘  └────┬─────┘ │
//! │                   ┌──────────────┐        ▼              ▼       │
//! │                   │ FaceRegistry │   ┌─────────────────────────┐ │
//! │                   │ (shared)     │   │ Actuator / RenderSink   │ │
//! │                   └──────────────┘   └─────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Analysis only runs while exactly one face is tracked. Frames without a
//! usable eye reading are skipped without touching any state.
//!
//! # Example
//!
//! ```
//! use drive_alive::{
//!     alarm::{ChannelActuator, NoopRenderSink},
//!     AlertKind, Config, FaceEvent, FaceId, FaceMonitor, Sample,
//! };
//!
//! let (actuator, alerts) = ChannelActuator::channel();
//! let mut monitor = FaceMonitor::new(Config::default(), actuator, NoopRenderSink);
//!
//! monitor.handle(FaceEvent::New { face: FaceId(1), at_ms: 0 });
//! for t in (0..=400).step_by(100) {
//!     monitor.handle(FaceEvent::update(FaceId(1), Sample::new(0.05, 0.1, t)));
//! }
//!
//! assert_eq!(alerts.try_recv().unwrap().kind, AlertKind::ProlongedClosure);
//! ```

pub mod alarm;
pub mod config;
pub mod core;
pub mod feed;
pub mod stats;

// Re-export key types at crate root for convenience
pub use alarm::{Actuator, AlertEvent, AlertKind, RenderSink};
pub use config::{Config, ConfigError};
pub use crate::core::{
    BlinkClassifier, BlinkRateMonitor, ClosureWatchdog, EyeState, FaceMonitor, FaceRegistry,
    FaceSession, FrameOutcome, SharedFaceRegistry,
};
pub use feed::{FaceEvent, FaceId, ReplayFeed, Sample};
pub use stats::{MonitorStats, SharedMonitorStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current time in milliseconds since the Unix epoch, for live feeds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
