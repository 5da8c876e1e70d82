//! Process-wide state shared by every face session.
//!
//! Face lifecycle callbacks may arrive on different worker threads, so the
//! face count and the rapid blinking alert are atomics behind an `Arc`.
//! Every operation is a single load, store, compare-exchange or
//! read-modify-write; nothing here takes a lock.

use crate::config::{as_millis_i64, Config};
use crate::core::blink_rate::RapidBlinkAlert;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared face count and rapid blinking alert.
#[derive(Debug)]
pub struct FaceRegistry {
    face_count: AtomicUsize,
    rapid_blink: RapidBlinkAlert,
}

impl FaceRegistry {
    /// Create a registry whose rapid blinking alert lasts `notification_ms`.
    pub fn new(notification_ms: i64) -> Self {
        Self {
            face_count: AtomicUsize::new(0),
            rapid_blink: RapidBlinkAlert::new(notification_ms),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(as_millis_i64(config.blink_rate.notification_duration))
    }

    /// Count a newly tracked face. Returns the new count.
    pub fn face_acquired(&self) -> usize {
        self.face_count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count a face that stopped being tracked. Returns the new count.
    ///
    /// Never goes below zero; an unmatched release is logged and ignored.
    pub fn face_released(&self) -> usize {
        match self
            .face_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => {
                tracing::warn!("Face released with no faces tracked");
                0
            }
        }
    }

    /// Number of faces currently tracked.
    pub fn face_number(&self) -> usize {
        self.face_count.load(Ordering::SeqCst)
    }

    /// Analysis only runs while exactly one face is in view.
    pub fn single_face(&self) -> bool {
        self.face_number() == 1
    }

    /// Whether the rapid blinking alert is showing at `now_ms`.
    pub fn is_blinking_too_fast(&self, now_ms: i64) -> bool {
        self.rapid_blink.is_active(now_ms)
    }

    pub fn rapid_blink_alert(&self) -> &RapidBlinkAlert {
        &self.rapid_blink
    }
}

impl Default for FaceRegistry {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Thread-safe shared registry.
pub type SharedFaceRegistry = Arc<FaceRegistry>;

/// Create a new shared registry.
pub fn create_shared_registry(config: &Config) -> SharedFaceRegistry {
    Arc::new(FaceRegistry::from_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_face_counting() {
        let registry = FaceRegistry::default();
        assert_eq!(registry.face_acquired(), 1);
        assert!(registry.single_face());
        assert_eq!(registry.face_acquired(), 2);
        assert!(!registry.single_face());
        assert_eq!(registry.face_released(), 1);
        assert_eq!(registry.face_released(), 0);
        assert_eq!(registry.face_number(), 0);
    }

    #[test]
    fn test_release_never_goes_negative() {
        let registry = FaceRegistry::default();
        assert_eq!(registry.face_released(), 0);
        assert_eq!(registry.face_number(), 0);
        assert_eq!(registry.face_acquired(), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let registry = Arc::new(FaceRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        registry.face_acquired();
                        registry.face_released();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.face_number(), 0);
    }

    #[test]
    fn test_blinking_too_fast_expires() {
        let registry = FaceRegistry::new(4000);
        assert!(!registry.is_blinking_too_fast(0));
        registry.rapid_blink_alert().raise(100);
        assert!(registry.is_blinking_too_fast(4099));
        assert!(!registry.is_blinking_too_fast(4100));
    }
}
