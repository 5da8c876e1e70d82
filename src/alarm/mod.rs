//! Downstream collaborators: the audible alarm and the on-screen indicator.
//!
//! Neither is implemented here beyond simple terminal and channel
//! adapters; a real deployment plugs in its own tone player and overlay.

pub mod actuator;
pub mod render;

// Re-export commonly used types
pub use actuator::{Actuator, AlertEvent, AlertKind, ChannelActuator, TerminalAlarm};
pub use render::{LogRenderSink, NoopRenderSink, RenderSink};
