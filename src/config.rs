//! Configuration for the drive-alive monitor.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Eye-state classification thresholds
    pub classifier: ClassifierConfig,

    /// Prolonged closure detection
    pub closure: ClosureConfig,

    /// Rapid blinking detection
    pub blink_rate: BlinkRateConfig,

    /// How long the actuator should sound for each alert
    #[serde(with = "duration_serde")]
    pub alarm_tone: Duration,

    /// Log frames-per-second every this many frames (0 disables)
    pub frame_log_interval: u64,

    /// Path for storing run statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drive-alive");

        Self {
            classifier: ClassifierConfig::default(),
            closure: ClosureConfig::default(),
            blink_rate: BlinkRateConfig::default(),
            alarm_tone: Duration::from_millis(100),
            frame_log_interval: 100,
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drive-alive")
            .join("config.json")
    }

    /// Get the path where run statistics are persisted.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Reject values the analyzers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ClassifierConfig {
            one_eye_closed_threshold,
            both_eyes_closed_threshold,
        } = self.classifier;

        if !(0.0..=1.0).contains(&one_eye_closed_threshold) {
            return Err(ConfigError::Invalid(format!(
                "one_eye_closed_threshold must be within [0, 1], got {one_eye_closed_threshold}"
            )));
        }
        if !(0.0..=2.0).contains(&both_eyes_closed_threshold) {
            return Err(ConfigError::Invalid(format!(
                "both_eyes_closed_threshold must be within [0, 2], got {both_eyes_closed_threshold}"
            )));
        }
        if self.blink_rate.min_blinking_count == 0 {
            return Err(ConfigError::Invalid(
                "min_blinking_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The simple policy: alarm on every closed frame, no blink counting.
    pub fn immediate() -> Self {
        Self {
            closure: ClosureConfig {
                max_closed_eyes_interval: Duration::ZERO,
                alert_repeat: None,
            },
            blink_rate: BlinkRateConfig {
                enabled: false,
                ..BlinkRateConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Thresholds applied to the per-eye open probabilities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Both eyes below this are considered closed
    pub one_eye_closed_threshold: f32,
    /// Sum of both probabilities below this is considered closed
    pub both_eyes_closed_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            one_eye_closed_threshold: 0.4,
            both_eyes_closed_threshold: 1.0,
        }
    }
}

/// Prolonged closure settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClosureConfig {
    /// Closure longer than this raises an alert; zero alarms on every closed frame
    #[serde(with = "duration_serde")]
    pub max_closed_eyes_interval: Duration,
    /// Re-fire the alert this often while the same closure continues
    #[serde(default, with = "option_duration_serde")]
    pub alert_repeat: Option<Duration>,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            max_closed_eyes_interval: Duration::from_millis(300),
            alert_repeat: None,
        }
    }
}

/// Rapid blinking settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BlinkRateConfig {
    /// Whether blink-rate analysis runs at all
    pub enabled: bool,
    /// Number of blinks that must fall within the interval
    pub min_blinking_count: usize,
    /// Window the blinks must fall within
    #[serde(with = "duration_serde")]
    pub min_blinking_interval: Duration,
    /// How long the rapid blinking alert stays active
    #[serde(with = "duration_serde")]
    pub notification_duration: Duration,
}

impl Default for BlinkRateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_blinking_count: 3,
            min_blinking_interval: Duration::from_millis(6000),
            notification_duration: Duration::from_millis(4000),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Convert a duration to whole milliseconds on the monitor's clock.
pub(crate) fn as_millis_i64(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Serde support for Duration, as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod option_duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .map(|d| d.as_millis() as u64)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.classifier.one_eye_closed_threshold, 0.4);
        assert_eq!(config.classifier.both_eyes_closed_threshold, 1.0);
        assert_eq!(
            config.closure.max_closed_eyes_interval,
            Duration::from_millis(300)
        );
        assert!(config.closure.alert_repeat.is_none());
        assert!(config.blink_rate.enabled);
        assert_eq!(config.blink_rate.min_blinking_count, 3);
        assert_eq!(
            config.blink_rate.min_blinking_interval,
            Duration::from_millis(6000)
        );
        assert_eq!(
            config.blink_rate.notification_duration,
            Duration::from_millis(4000)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_immediate_policy() {
        let config = Config::immediate();
        assert_eq!(config.closure.max_closed_eyes_interval, Duration::ZERO);
        assert!(!config.blink_rate.enabled);
    }

    #[test]
    fn test_durations_serialize_as_millis() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["closure"]["max_closed_eyes_interval"], 300);
        assert_eq!(json["blink_rate"]["notification_duration"], 4000);
        assert_eq!(json["alarm_tone"], 100);
        assert!(json["closure"]["alert_repeat"].is_null());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir()
            .join(format!("drive-alive-config-{}", uuid::Uuid::new_v4()))
            .join("config.json");

        let mut config = Config::default();
        config.closure.alert_repeat = Some(Duration::from_millis(1500));
        config.blink_rate.min_blinking_count = 4;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.closure.alert_repeat, Some(Duration::from_millis(1500)));
        assert_eq!(loaded.blink_rate.min_blinking_count, 4);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("drive-alive-does-not-exist.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.blink_rate.min_blinking_count, 3);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.classifier.one_eye_closed_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.blink_rate.min_blinking_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
