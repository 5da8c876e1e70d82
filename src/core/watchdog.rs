//! Prolonged eye-closure detection.
//!
//! A normal blink lasts roughly 100-150 ms. Closure past the configured
//! interval (300 ms by default) is treated as the driver nodding off.

use crate::config::{as_millis_i64, ClosureConfig};
use crate::core::classifier::EyeState;

/// Closure bookkeeping for one face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureState {
    /// When the current closure began, `None` while the eyes are open
    pub closure_start_ms: Option<i64>,
    /// When the current closure last raised an alert
    pub last_alert_ms: Option<i64>,
}

impl ClosureState {
    pub fn is_closed(&self) -> bool {
        self.closure_start_ms.is_some()
    }
}

/// Result of feeding one frame to the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureUpdate {
    /// False while the current closure is past the allowed interval
    pub valid_frame: bool,
    /// True on frames where the prolonged-closure alert fires
    pub alert: bool,
    /// Start of a closure that just ended without alerting
    pub completed_blink_ms: Option<i64>,
}

impl ClosureUpdate {
    fn valid() -> Self {
        Self {
            valid_frame: true,
            alert: false,
            completed_blink_ms: None,
        }
    }

    fn prolonged(alert: bool) -> Self {
        Self {
            valid_frame: false,
            alert,
            completed_blink_ms: None,
        }
    }
}

/// Tracks how long the eyes have been continuously closed.
#[derive(Debug, Clone)]
pub struct ClosureWatchdog {
    max_closed_ms: i64,
    repeat_ms: Option<i64>,
    state: ClosureState,
}

impl Default for ClosureWatchdog {
    fn default() -> Self {
        Self::new(&ClosureConfig::default())
    }
}

impl ClosureWatchdog {
    pub fn new(config: &ClosureConfig) -> Self {
        Self {
            max_closed_ms: as_millis_i64(config.max_closed_eyes_interval),
            repeat_ms: config.alert_repeat.map(as_millis_i64),
            state: ClosureState::default(),
        }
    }

    pub fn state(&self) -> ClosureState {
        self.state
    }

    /// Forget any closure in progress.
    pub fn reset(&mut self) {
        self.state = ClosureState::default();
    }

    /// Feed one classified frame.
    ///
    /// The caller is responsible for clearing blink history when `alert` is
    /// set and for recording `completed_blink_ms` when present.
    pub fn update(&mut self, eye_state: EyeState, now_ms: i64) -> ClosureUpdate {
        match eye_state {
            EyeState::Closed => self.closed(now_ms),
            EyeState::Open => {
                let ended = std::mem::take(&mut self.state);
                ClosureUpdate {
                    completed_blink_ms: ended
                        .closure_start_ms
                        .filter(|_| ended.last_alert_ms.is_none()),
                    ..ClosureUpdate::valid()
                }
            }
        }
    }

    fn closed(&mut self, now_ms: i64) -> ClosureUpdate {
        // Immediate policy: every closed frame alarms.
        if self.max_closed_ms == 0 {
            self.state.closure_start_ms.get_or_insert(now_ms);
            self.state.last_alert_ms = Some(now_ms);
            return ClosureUpdate::prolonged(true);
        }

        let start = match self.state.closure_start_ms {
            Some(start) => start,
            None => {
                self.state.closure_start_ms = Some(now_ms);
                return ClosureUpdate::valid();
            }
        };

        match self.state.last_alert_ms {
            Some(last) => {
                let refire = self
                    .repeat_ms
                    .is_some_and(|repeat| now_ms.saturating_sub(last) >= repeat);
                if refire {
                    self.state.last_alert_ms = Some(now_ms);
                }
                ClosureUpdate::prolonged(refire)
            }
            None if now_ms.saturating_sub(start) > self.max_closed_ms => {
                self.state.last_alert_ms = Some(now_ms);
                ClosureUpdate::prolonged(true)
            }
            None => ClosureUpdate::valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::classifier::EyeState::{Closed, Open};

    #[test]
    fn test_short_closure_is_a_blink() {
        let mut watchdog = ClosureWatchdog::default();

        let first = watchdog.update(Closed, 0);
        assert!(first.valid_frame && !first.alert);
        assert_eq!(watchdog.state().closure_start_ms, Some(0));

        let second = watchdog.update(Closed, 100);
        assert!(second.valid_frame && !second.alert);

        let opened = watchdog.update(Open, 200);
        assert!(opened.valid_frame && !opened.alert);
        assert_eq!(opened.completed_blink_ms, Some(0));
        assert!(!watchdog.state().is_closed());
    }

    #[test]
    fn test_prolonged_closure_fires_once() {
        let mut watchdog = ClosureWatchdog::default();
        let alerts: Vec<bool> = [0, 100, 200, 300, 400, 500, 600]
            .iter()
            .map(|&t| watchdog.update(Closed, t).alert)
            .collect();

        assert_eq!(alerts, vec![false, false, false, false, true, false, false]);
        assert!(!watchdog.update(Closed, 700).valid_frame);

        // The closure that alerted is not a blink.
        let opened = watchdog.update(Open, 800);
        assert!(opened.valid_frame);
        assert_eq!(opened.completed_blink_ms, None);
    }

    #[test]
    fn test_exactly_threshold_is_not_prolonged() {
        let mut watchdog = ClosureWatchdog::default();
        watchdog.update(Closed, 1000);
        let at_limit = watchdog.update(Closed, 1300);
        assert!(at_limit.valid_frame && !at_limit.alert);
        assert!(watchdog.update(Closed, 1301).alert);
    }

    #[test]
    fn test_repeat_interval_refires() {
        let mut watchdog = ClosureWatchdog::new(&ClosureConfig {
            max_closed_eyes_interval: Duration::from_millis(300),
            alert_repeat: Some(Duration::from_millis(1000)),
        });
        watchdog.update(Closed, 0);
        assert!(watchdog.update(Closed, 400).alert);
        assert!(!watchdog.update(Closed, 900).alert);
        assert!(watchdog.update(Closed, 1400).alert);
        assert!(!watchdog.update(Closed, 1500).alert);
    }

    #[test]
    fn test_immediate_policy_alarms_every_closed_frame() {
        let mut watchdog = ClosureWatchdog::new(&ClosureConfig {
            max_closed_eyes_interval: Duration::ZERO,
            alert_repeat: None,
        });
        assert!(watchdog.update(Closed, 0).alert);
        assert!(watchdog.update(Closed, 33).alert);
        let opened = watchdog.update(Open, 66);
        assert!(!opened.alert);
        assert_eq!(opened.completed_blink_ms, None);
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let mut watchdog = ClosureWatchdog::new(&ClosureConfig {
            max_closed_eyes_interval: Duration::from_millis(300),
            alert_repeat: Some(Duration::from_millis(1000)),
        });
        watchdog.update(Closed, i64::MIN);
        assert!(watchdog.update(Closed, i64::MAX).alert);
        // A frame far in the past does not count toward the repeat interval.
        assert!(!watchdog.update(Closed, i64::MIN).alert);
    }

    #[test]
    fn test_open_without_closure_is_not_a_blink() {
        let mut watchdog = ClosureWatchdog::default();
        let update = watchdog.update(Open, 0);
        assert!(update.valid_frame);
        assert_eq!(update.completed_blink_ms, None);
    }
}
