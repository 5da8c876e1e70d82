//! Run statistics for the drive-alive monitor.
//!
//! Tracks how many frames were analyzed or skipped and how often each
//! alert fired, so a run can be reviewed afterwards.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_stats, create_shared_stats_with_persistence, MonitorStats, SharedMonitorStats,
    StatsSnapshot,
};
