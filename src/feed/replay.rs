//! Replay of recorded face events.
//!
//! A recording is a JSON Lines file with one [`FaceEvent`] per line. The
//! feed reads it on a background thread and delivers events over a bounded
//! channel, the same way a live tracker would push them.

use crate::feed::types::FaceEvent;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep while pacing, so `stop()` stays responsive.
const PACING_SLICE: Duration = Duration::from_millis(50);

/// How replayed events are spaced out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Deliver as fast as the consumer drains the channel
    AsFastAsPossible,
    /// Sleep between events according to their timestamps
    RealTime,
}

/// Errors that can occur while replaying a recording.
#[derive(Debug)]
pub enum FeedError {
    AlreadyRunning,
    Io(String),
    Parse { line: usize, message: String },
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::AlreadyRunning => write!(f, "Feed is already running"),
            FeedError::Io(e) => write!(f, "IO error: {e}"),
            FeedError::Parse { line, message } => write!(f, "line {line}: {message}"),
        }
    }
}

impl std::error::Error for FeedError {}

/// Parse a single recording line.
///
/// Blank lines and lines starting with `#` yield `Ok(None)`.
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<FaceEvent>, FeedError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| FeedError::Parse {
            line: line_number,
            message: e.to_string(),
        })
}

/// Replays a recording file into a channel.
pub struct ReplayFeed {
    path: PathBuf,
    pacing: Pacing,
    sender: Option<Sender<FaceEvent>>,
    receiver: Receiver<FaceEvent>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReplayFeed {
    /// Create a new feed for the given recording.
    pub fn new(path: impl Into<PathBuf>, pacing: Pacing) -> Self {
        let (sender, receiver) = bounded(1_024);
        Self {
            path: path.into(),
            pacing,
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Start replaying.
    ///
    /// The channel disconnects once the whole file has been delivered.
    pub fn start(&mut self) -> Result<(), FeedError> {
        if self.sender.is_none() {
            return Err(FeedError::AlreadyRunning);
        }

        let file = File::open(&self.path)
            .map_err(|e| FeedError::Io(format!("{}: {e}", self.path.display())))?;
        let Some(sender) = self.sender.take() else {
            return Err(FeedError::AlreadyRunning);
        };

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let pacing = self.pacing;

        self.handle = Some(thread::spawn(move || {
            replay_lines(BufReader::new(file), &sender, &running, pacing);
            running.store(false, Ordering::SeqCst);
        }));

        Ok(())
    }

    /// Stop replaying and wait for the reader thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Unblock a reader stuck on a full channel.
        while self.receiver.try_recv().is_ok() {}
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Check if the reader thread is still delivering events.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for face events.
    pub fn receiver(&self) -> &Receiver<FaceEvent> {
        &self.receiver
    }
}

impl Drop for ReplayFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn replay_lines<R: BufRead>(
    reader: R,
    sender: &Sender<FaceEvent>,
    running: &AtomicBool,
    pacing: Pacing,
) {
    let mut previous_ms: Option<i64> = None;

    for (index, line) in reader.lines().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Stopping replay, read failed: {}", e);
                break;
            }
        };

        let event = match parse_line(index + 1, &line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Skipping malformed event: {}", e);
                continue;
            }
        };

        if pacing == Pacing::RealTime {
            let at = event.timestamp_ms();
            if let Some(previous) = previous_ms {
                let gap = u64::try_from(at.saturating_sub(previous)).unwrap_or(0);
                if !pause(Duration::from_millis(gap), running) {
                    break;
                }
            }
            previous_ms = Some(at);
        }

        if sender.send(event).is_err() {
            break;
        }
    }
}

/// Sleep for `gap` in short slices.
///
/// Returns false if the feed was stopped before the gap elapsed.
fn pause(gap: Duration, running: &AtomicBool) -> bool {
    let deadline = Instant::now().checked_add(gap);
    while running.load(Ordering::SeqCst) {
        let remaining = match deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => PACING_SLICE,
        };
        if remaining.is_zero() {
            return true;
        }
        thread::sleep(remaining.min(PACING_SLICE));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::FaceId;

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert!(parse_line(1, "").unwrap().is_none());
        assert!(parse_line(2, "   ").unwrap().is_none());
        assert!(parse_line(3, "# recorded on a test drive").unwrap().is_none());
    }

    #[test]
    fn test_parse_line_reports_line_number() {
        match parse_line(7, "{not json") {
            Err(FeedError::Parse { line, .. }) => assert_eq!(line, 7),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_replay_delivers_events_and_disconnects() {
        let path = std::env::temp_dir()
            .join(format!("drive-alive-replay-{}.jsonl", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            concat!(
                "{\"event\":\"new\",\"face\":1,\"at_ms\":0}\n",
                "garbage\n",
                "\n",
                "{\"event\":\"update\",\"face\":1,\"left\":0.9,\"right\":0.9,\"at_ms\":33}\n",
                "{\"event\":\"done\",\"face\":1,\"at_ms\":66}\n",
            ),
        )
        .unwrap();

        let mut feed = ReplayFeed::new(&path, Pacing::AsFastAsPossible);
        feed.start().unwrap();
        assert!(matches!(feed.start(), Err(FeedError::AlreadyRunning)));

        let events: Vec<FaceEvent> = feed.receiver().iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], FaceEvent::New { face: FaceId(1), at_ms: 0 });
        assert_eq!(events[2].timestamp_ms(), 66);

        feed.stop();
        assert!(!feed.is_running());
        let _ = std::fs::remove_file(&path);
    }

    fn temp_recording(contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("drive-alive-replay-{}.jsonl", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut feed = ReplayFeed::new("/nonexistent/drive-alive.jsonl", Pacing::RealTime);
        assert!(matches!(feed.start(), Err(FeedError::Io(_))));
        // A failed start leaves the feed startable.
        assert!(matches!(feed.start(), Err(FeedError::Io(_))));
        assert!(!feed.is_running());
    }

    #[test]
    fn test_stop_interrupts_realtime_gap() {
        let path = temp_recording(concat!(
            "{\"event\":\"new\",\"face\":1,\"at_ms\":0}\n",
            "{\"event\":\"done\",\"face\":1,\"at_ms\":60000}\n",
        ));

        let mut feed = ReplayFeed::new(&path, Pacing::RealTime);
        feed.start().unwrap();
        let first = feed
            .receiver()
            .recv_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(first.timestamp_ms(), 0);
        thread::sleep(Duration::from_millis(100));

        let begun = Instant::now();
        feed.stop();
        assert!(begun.elapsed() < Duration::from_secs(2));
        assert!(!feed.is_running());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_pause_waits_out_short_gap() {
        let running = AtomicBool::new(true);
        let begun = Instant::now();
        assert!(pause(Duration::from_millis(120), &running));
        assert!(begun.elapsed() >= Duration::from_millis(120));

        running.store(false, Ordering::SeqCst);
        assert!(!pause(Duration::from_millis(u64::MAX), &running));
    }
}
