//! Monitor statistics.
//!
//! Counts what the monitor did with each frame and how often it alerted.
//! Only counts are kept; no probabilities or timestamps are stored.

use crate::alarm::AlertKind;
use crate::core::session::FrameOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Statistics for the current run.
#[derive(Debug)]
pub struct MonitorStats {
    /// Frames classified for a single face in view
    frames_analyzed: AtomicU64,
    /// Frames with no usable eye reading
    frames_skipped: AtomicU64,
    /// Frames seen while more than one face was tracked
    frames_unanalyzed: AtomicU64,
    /// Completed blinks
    blinks: AtomicU64,
    /// Prolonged closure alerts
    closure_alerts: AtomicU64,
    /// Rapid blinking alerts
    rapid_blink_alerts: AtomicU64,
    /// Faces that started (or resumed) being tracked
    faces_acquired: AtomicU64,
    /// Run start time
    run_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl MonitorStats {
    /// Create empty statistics.
    pub fn new() -> Self {
        Self {
            frames_analyzed: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
            frames_unanalyzed: AtomicU64::new(0),
            blinks: AtomicU64::new(0),
            closure_alerts: AtomicU64::new(0),
            rapid_blink_alerts: AtomicU64::new(0),
            faces_acquired: AtomicU64::new(0),
            run_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create statistics that accumulate on top of a previous run's file.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            tracing::warn!("Could not load previous monitor stats: {}", e);
        }

        stats
    }

    /// Record what happened to one frame.
    pub fn record_outcome(&self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Analyzed(analysis) => {
                self.frames_analyzed.fetch_add(1, Ordering::Relaxed);
                if analysis.blink_completed {
                    self.blinks.fetch_add(1, Ordering::Relaxed);
                }
                if let Some(kind) = analysis.alert {
                    self.record_alert(kind);
                }
            }
            FrameOutcome::Skipped(_) => {
                self.frames_skipped.fetch_add(1, Ordering::Relaxed);
            }
            FrameOutcome::Unanalyzed => {
                self.frames_unanalyzed.fetch_add(1, Ordering::Relaxed);
            }
            FrameOutcome::Inactive => {}
        }
    }

    /// Record a fired alert.
    pub fn record_alert(&self, kind: AlertKind) {
        let counter = match kind {
            AlertKind::ProlongedClosure => &self.closure_alerts,
            AlertKind::RapidBlinking => &self.rapid_blink_alerts,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a face entering tracking.
    pub fn record_face_acquired(&self) {
        self.faces_acquired.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_analyzed: self.frames_analyzed.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            frames_unanalyzed: self.frames_unanalyzed.load(Ordering::Relaxed),
            blinks: self.blinks.load(Ordering::Relaxed),
            closure_alerts: self.closure_alerts.load(Ordering::Relaxed),
            rapid_blink_alerts: self.rapid_blink_alerts.load(Ordering::Relaxed),
            faces_acquired: self.faces_acquired.load(Ordering::Relaxed),
            run_start: self.run_start,
            run_duration_secs: (Utc::now() - self.run_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Monitor Statistics:\n\
             - Frames analyzed: {}\n\
             - Frames skipped (no eye reading): {}\n\
             - Frames not analyzed (several faces): {}\n\
             - Blinks: {}\n\
             - Prolonged closure alerts: {}\n\
             - Rapid blinking alerts: {}\n\
             - Faces tracked: {}\n\
             - Run duration: {} seconds",
            stats.frames_analyzed,
            stats.frames_skipped,
            stats.frames_unanalyzed,
            stats.blinks,
            stats.closure_alerts,
            stats.rapid_blink_alerts,
            stats.faces_acquired,
            stats.run_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                frames_analyzed: stats.frames_analyzed,
                frames_skipped: stats.frames_skipped,
                frames_unanalyzed: stats.frames_unanalyzed,
                blinks: stats.blinks,
                closure_alerts: stats.closure_alerts,
                rapid_blink_alerts: stats.rapid_blink_alerts,
                faces_acquired: stats.faces_acquired,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.frames_analyzed
                    .store(persisted.frames_analyzed, Ordering::Relaxed);
                self.frames_skipped
                    .store(persisted.frames_skipped, Ordering::Relaxed);
                self.frames_unanalyzed
                    .store(persisted.frames_unanalyzed, Ordering::Relaxed);
                self.blinks.store(persisted.blinks, Ordering::Relaxed);
                self.closure_alerts
                    .store(persisted.closure_alerts, Ordering::Relaxed);
                self.rapid_blink_alerts
                    .store(persisted.rapid_blink_alerts, Ordering::Relaxed);
                self.faces_acquired
                    .store(persisted.faces_acquired, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.frames_analyzed.store(0, Ordering::Relaxed);
        self.frames_skipped.store(0, Ordering::Relaxed);
        self.frames_unanalyzed.store(0, Ordering::Relaxed);
        self.blinks.store(0, Ordering::Relaxed);
        self.closure_alerts.store(0, Ordering::Relaxed);
        self.rapid_blink_alerts.store(0, Ordering::Relaxed);
        self.faces_acquired.store(0, Ordering::Relaxed);
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of monitor statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub frames_analyzed: u64,
    pub frames_skipped: u64,
    pub frames_unanalyzed: u64,
    pub blinks: u64,
    pub closure_alerts: u64,
    pub rapid_blink_alerts: u64,
    pub faces_acquired: u64,
    pub run_start: DateTime<Utc>,
    pub run_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    frames_analyzed: u64,
    frames_skipped: u64,
    frames_unanalyzed: u64,
    blinks: u64,
    closure_alerts: u64,
    rapid_blink_alerts: u64,
    faces_acquired: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared statistics.
pub type SharedMonitorStats = Arc<MonitorStats>;

/// Create new shared statistics.
pub fn create_shared_stats() -> SharedMonitorStats {
    Arc::new(MonitorStats::new())
}

/// Create new shared statistics with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedMonitorStats {
    Arc::new(MonitorStats::with_persistence(path))
}
