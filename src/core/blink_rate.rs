//! Rapid blinking detection.
//!
//! Each session keeps the start times of its most recent blinks. When the
//! oldest of the last `min_blinking_count` blinks is younger than
//! `min_blinking_interval`, the process-wide [`RapidBlinkAlert`] is raised
//! and stays active for `notification_duration`.

use crate::config::{as_millis_i64, BlinkRateConfig};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

/// Sentinel stored in [`RapidBlinkAlert`] while no alert is raised.
const NOT_RAISED: i64 = i64::MIN;

/// Chronologically ordered blink start times for one session.
///
/// Only the last `capacity` entries can ever matter to the rate check, so
/// older ones are dropped as new blinks arrive.
#[derive(Debug, Clone)]
pub struct BlinkHistory {
    starts: VecDeque<i64>,
    capacity: usize,
}

impl BlinkHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            starts: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, start_ms: i64) {
        if self.starts.len() == self.capacity {
            self.starts.pop_front();
        }
        self.starts.push_back(start_ms);
    }

    /// Start of the blink `n` places back, where 1 is the most recent.
    pub fn nth_most_recent(&self, n: usize) -> Option<i64> {
        if n == 0 || n > self.starts.len() {
            return None;
        }
        self.starts.get(self.starts.len() - n).copied()
    }

    pub fn clear(&mut self) {
        self.starts.clear();
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.starts.iter().copied()
    }
}

/// The shared "blinking too fast" indicator.
///
/// One word holds the time the alert was raised, so raising, reading and
/// expiring are each a single atomic operation and need no lock.
#[derive(Debug)]
pub struct RapidBlinkAlert {
    raised_at_ms: AtomicI64,
    duration_ms: i64,
}

impl RapidBlinkAlert {
    pub fn new(duration_ms: i64) -> Self {
        Self {
            raised_at_ms: AtomicI64::new(NOT_RAISED),
            duration_ms,
        }
    }

    /// Raise (or re-raise) the alert at `now_ms`.
    pub fn raise(&self, now_ms: i64) {
        self.raised_at_ms.store(now_ms, Ordering::SeqCst);
    }

    /// When the alert was raised, if it has not been cleared yet.
    ///
    /// Does not apply expiry.
    pub fn raised_at(&self) -> Option<i64> {
        match self.raised_at_ms.load(Ordering::SeqCst) {
            NOT_RAISED => None,
            at => Some(at),
        }
    }

    /// Whether the alert is active at `now_ms`.
    ///
    /// An alert that has been up for the full notification duration is
    /// cleared by this call.
    pub fn is_active(&self, now_ms: i64) -> bool {
        let raised = self.raised_at_ms.load(Ordering::SeqCst);
        if raised == NOT_RAISED {
            return false;
        }
        if !expired(raised, now_ms, self.duration_ms) {
            return true;
        }

        // A concurrent re-raise wins over this clear.
        let _ = self.raised_at_ms.compare_exchange(
            raised,
            NOT_RAISED,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
        self.raised_at().is_some_and(|at| !expired(at, now_ms, self.duration_ms))
    }
}

/// Expiry rule for the rapid blinking notification.
pub fn expired(raised_at_ms: i64, now_ms: i64, duration_ms: i64) -> bool {
    now_ms.saturating_sub(raised_at_ms) >= duration_ms
}

/// Per-session blink counter feeding the shared alert.
#[derive(Debug, Clone)]
pub struct BlinkRateMonitor {
    history: BlinkHistory,
    min_count: usize,
    min_interval_ms: i64,
}

impl Default for BlinkRateMonitor {
    fn default() -> Self {
        Self::new(&BlinkRateConfig::default())
    }
}

impl BlinkRateMonitor {
    pub fn new(config: &BlinkRateConfig) -> Self {
        let min_count = config.min_blinking_count.max(1);
        Self {
            history: BlinkHistory::new(min_count),
            min_count,
            min_interval_ms: as_millis_i64(config.min_blinking_interval),
        }
    }

    pub fn history(&self) -> &BlinkHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Record a completed blink that started at `blink_start_ms`.
    ///
    /// Returns true when this blink raised the rapid blinking alert, in which
    /// case the history starts over.
    pub fn record_blink(
        &mut self,
        blink_start_ms: i64,
        now_ms: i64,
        alert: &RapidBlinkAlert,
    ) -> bool {
        self.history.push(blink_start_ms);

        let too_fast = self
            .history
            .nth_most_recent(self.min_count)
            .is_some_and(|oldest| {
                blink_start_ms.saturating_sub(oldest) < self.min_interval_ms
            });

        if too_fast {
            alert.raise(now_ms);
            self.history.clear();
        }
        too_fast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut history = BlinkHistory::new(3);
        for t in [0, 10, 20, 30, 40] {
            history.push(t);
        }
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![20, 30, 40]);
        assert_eq!(history.nth_most_recent(1), Some(40));
        assert_eq!(history.nth_most_recent(3), Some(20));
        assert_eq!(history.nth_most_recent(4), None);
        assert_eq!(history.nth_most_recent(0), None);
    }

    #[test]
    fn test_three_quick_blinks_fire() {
        let alert = RapidBlinkAlert::new(4000);
        let mut monitor = BlinkRateMonitor::default();

        assert!(!monitor.record_blink(0, 150, &alert));
        assert!(!monitor.record_blink(1000, 1150, &alert));
        assert!(monitor.record_blink(2000, 2150, &alert));

        assert!(monitor.history().is_empty());
        assert_eq!(alert.raised_at(), Some(2150));
        assert!(alert.is_active(2150));
    }

    #[test]
    fn test_slow_blinks_do_not_fire() {
        let alert = RapidBlinkAlert::new(4000);
        let mut monitor = BlinkRateMonitor::default();

        assert!(!monitor.record_blink(0, 100, &alert));
        assert!(!monitor.record_blink(3000, 3100, &alert));
        assert!(!monitor.record_blink(6000, 6100, &alert));
        assert!(!monitor.record_blink(9000, 9100, &alert));
        assert_eq!(monitor.history().len(), 3);
        assert!(!alert.is_active(9100));
    }

    #[test]
    fn test_window_slides_over_history() {
        let alert = RapidBlinkAlert::new(4000);
        let mut monitor = BlinkRateMonitor::default();

        monitor.record_blink(0, 0, &alert);
        monitor.record_blink(5000, 5000, &alert);
        // 0 -> 7000 is too slow, but 5000 -> 10900 is not.
        assert!(!monitor.record_blink(7000, 7000, &alert));
        assert!(monitor.record_blink(10_900, 10_900, &alert));
    }

    #[test]
    fn test_fresh_window_after_alert() {
        let alert = RapidBlinkAlert::new(4000);
        let mut monitor = BlinkRateMonitor::default();

        for t in [0, 500, 1000] {
            monitor.record_blink(t, t, &alert);
        }
        assert!(!monitor.record_blink(1500, 1500, &alert));
        assert!(!monitor.record_blink(2000, 2000, &alert));
        assert!(monitor.record_blink(2500, 2500, &alert));
    }

    #[test]
    fn test_alert_expiry_is_lazy_and_idempotent() {
        let alert = RapidBlinkAlert::new(4000);
        alert.raise(1000);

        assert!(alert.is_active(1000));
        assert!(alert.is_active(4999));
        assert_eq!(alert.raised_at(), Some(1000));

        assert!(!alert.is_active(5000));
        assert_eq!(alert.raised_at(), None);
        assert!(!alert.is_active(5001));
        // Reading earlier again does not resurrect it.
        assert!(!alert.is_active(2000));
    }

    #[test]
    fn test_expired_rule() {
        assert!(!expired(0, 3999, 4000));
        assert!(expired(0, 4000, 4000));
        assert!(expired(0, 10_000, 4000));
    }

    #[test]
    fn test_far_apart_blinks_do_not_overflow() {
        let alert = RapidBlinkAlert::new(4000);
        let mut monitor = BlinkRateMonitor::default();

        assert!(!monitor.record_blink(i64::MIN, i64::MIN, &alert));
        assert!(!monitor.record_blink(0, 0, &alert));
        assert!(!monitor.record_blink(i64::MAX, i64::MAX, &alert));
        assert!(!alert.is_active(i64::MAX));
    }

    #[test]
    fn test_min_count_of_one() {
        let alert = RapidBlinkAlert::new(4000);
        let mut monitor = BlinkRateMonitor::new(&BlinkRateConfig {
            min_blinking_count: 1,
            ..BlinkRateConfig::default()
        });
        // A single blink always spans zero time.
        assert!(monitor.record_blink(0, 100, &alert));
    }
}
