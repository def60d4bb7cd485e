use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::CLASSIFIER_INPUT_SIZE;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables of the liveness engine.
///
/// Missing fields in a config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Spoof-score threshold: a crop is live when the score is below it.
    pub threshold: f32,
    /// History buffer capacity (frames).
    pub capacity: usize,
    /// Minimum history length before stillness/blink checks run.
    pub min_frames: usize,
    /// Max bbox-center range (pixels, per axis) still counted as motionless.
    pub still_px: f64,
    /// Max yaw/roll range (degrees) still counted as motionless.
    pub still_deg: f32,
    /// Both eyes below this open-probability count as closed.
    pub blink_closed: f32,
    /// Both eyes above this open-probability count as open.
    pub blink_open: f32,
    /// Minimum history time span for the stillness check, unless full.
    pub min_elapsed_ms: u64,
    /// Square side of the classifier input crop.
    pub classifier_input_size: u32,
    /// Countdown ticks between a capture request and the capture.
    pub countdown_ticks: u32,
    /// Length of one countdown tick.
    pub countdown_tick_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            capacity: 12,
            min_frames: 10,
            still_px: 5.0,
            still_deg: 3.0,
            blink_closed: 0.5,
            blink_open: 0.7,
            min_elapsed_ms: 200,
            classifier_input_size: CLASSIFIER_INPUT_SIZE,
            countdown_ticks: 5,
            countdown_tick_ms: 900,
        }
    }
}

impl LivenessConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1".into()));
        }
        if self.min_frames == 0 || self.min_frames > self.capacity {
            return Err(ConfigError::Invalid(format!(
                "min_frames must be between 1 and capacity ({}), got {}",
                self.capacity, self.min_frames
            )));
        }
        for (name, value) in [
            ("threshold", self.threshold),
            ("blink_closed", self.blink_closed),
            ("blink_open", self.blink_open),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
        }
        if self.blink_closed > self.blink_open {
            return Err(ConfigError::Invalid(format!(
                "blink_closed ({}) must not exceed blink_open ({})",
                self.blink_closed, self.blink_open
            )));
        }
        let negative_or_nan = |v: f64| v.is_nan() || v < 0.0;
        if negative_or_nan(self.still_px) || negative_or_nan(self.still_deg as f64) {
            return Err(ConfigError::Invalid(
                "stillness thresholds must be non-negative".into(),
            ));
        }
        if self.classifier_input_size == 0 {
            return Err(ConfigError::Invalid(
                "classifier_input_size must be positive".into(),
            ));
        }
        if self.countdown_tick_ms == 0 {
            return Err(ConfigError::Invalid(
                "countdown_tick_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let c = LivenessConfig::default();
        assert_relative_eq!(c.threshold, 0.3);
        assert_eq!(c.capacity, 12);
        assert_eq!(c.min_frames, 10);
        assert_relative_eq!(c.still_px, 5.0);
        assert_relative_eq!(c.still_deg, 3.0);
        assert_relative_eq!(c.blink_closed, 0.5);
        assert_relative_eq!(c.blink_open, 0.7);
        assert_eq!(c.min_elapsed_ms, 200);
        assert_eq!(c.classifier_input_size, 224);
        assert_eq!(c.countdown_ticks, 5);
        assert_eq!(c.countdown_tick_ms, 900);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c: LivenessConfig = serde_json::from_str(r#"{"threshold": 0.45}"#).unwrap();
        assert_relative_eq!(c.threshold, 0.45);
        assert_eq!(c.capacity, 12);
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(tmp.path(), r#"{"capacity": 20, "min_frames": 15}"#).unwrap();

        let c = LivenessConfig::load(tmp.path()).unwrap();

        assert_eq!(c.capacity, 20);
        assert_eq!(c.min_frames, 15);
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let result = LivenessConfig::load(Path::new("/nonexistent/liveness.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(tmp.path(), r#"{"capacity": 5}"#).unwrap();
        assert!(matches!(
            LivenessConfig::load(tmp.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[rstest]
    #[case::zero_capacity(LivenessConfig { capacity: 0, ..Default::default() })]
    #[case::zero_min_frames(LivenessConfig { min_frames: 0, ..Default::default() })]
    #[case::min_frames_over_capacity(LivenessConfig { min_frames: 13, ..Default::default() })]
    #[case::threshold_above_one(LivenessConfig { threshold: 1.5, ..Default::default() })]
    #[case::closed_above_open(LivenessConfig { blink_closed: 0.8, ..Default::default() })]
    #[case::negative_px(LivenessConfig { still_px: -1.0, ..Default::default() })]
    #[case::nan_deg(LivenessConfig { still_deg: f32::NAN, ..Default::default() })]
    #[case::zero_input(LivenessConfig { classifier_input_size: 0, ..Default::default() })]
    #[case::zero_tick(LivenessConfig { countdown_tick_ms: 0, ..Default::default() })]
    fn test_validate_rejects(#[case] config: LivenessConfig) {
        assert!(config.validate().is_err());
    }
}
