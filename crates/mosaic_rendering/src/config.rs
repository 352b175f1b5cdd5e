//! Coordinator configuration.
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! document is a valid configuration:
//!
//! ```toml
//! target_frame_ms = 16.0
//! initial_quality = "high"
//!
//! [quality]
//! downgrade_after_samples = 10
//! upgrade_after_samples = 60
//! ```

use std::path::Path;
use std::time::Duration;

use mosaic_shared::constants::{
    DEFAULT_DROPPED_FRAME_RATIO, DEFAULT_METRICS_WINDOW, DEFAULT_REPORTING_INTERVAL_MS,
};
use mosaic_shared::{
    QualityLevel, DEFAULT_MAX_DIRTY_REGIONS, DEFAULT_MESSAGE_CAPACITY, DEFAULT_TARGET_FRAME_MS,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::quality::QualityThresholds;

/// Longest accepted frame budget. Anything slower is not a frame rate.
const MAX_TARGET_FRAME_MS: f64 = 1_000.0;

/// Runtime tuning for a [`RenderCoordinator`](crate::RenderCoordinator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frame budget in milliseconds
    pub target_frame_ms: f64,
    /// Dirty regions kept before collapsing to the whole surface
    pub max_dirty_regions: usize,
    /// Broadcast messages in flight before posting drops
    pub message_capacity: usize,
    /// Frame samples in the rolling metrics window
    pub metrics_window: usize,
    /// Interval between quality-adapter updates (ms)
    pub reporting_interval_ms: u64,
    /// A frame longer than `target * ratio` counts as dropped
    pub dropped_frame_ratio: f64,
    /// Starting quality level
    pub initial_quality: QualityLevel,
    /// Quality hysteresis
    pub quality: QualityThresholds,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_frame_ms: DEFAULT_TARGET_FRAME_MS,
            max_dirty_regions: DEFAULT_MAX_DIRTY_REGIONS,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            metrics_window: DEFAULT_METRICS_WINDOW,
            reporting_interval_ms: DEFAULT_REPORTING_INTERVAL_MS,
            dropped_frame_ratio: DEFAULT_DROPPED_FRAME_RATIO,
            initial_quality: QualityLevel::default(),
            quality: QualityThresholds::default(),
        }
    }
}

impl RenderConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, otherwise whatever
    /// [`validate`](Self::validate) reports.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// The first out-of-range field.
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("target_frame_ms", self.target_frame_ms),
            ("dropped_frame_ratio", self.dropped_frame_ratio),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveValue { field, value });
            }
        }
        if self.target_frame_ms > MAX_TARGET_FRAME_MS {
            return Err(ConfigError::Invalid(format!(
                "target_frame_ms must be at most {MAX_TARGET_FRAME_MS}, got {}",
                self.target_frame_ms
            )));
        }
        if self.dropped_frame_ratio < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "dropped_frame_ratio must be at least 1.0, got {}",
                self.dropped_frame_ratio
            )));
        }
        if Duration::try_from_secs_f64(self.target_frame().as_secs_f64() * self.dropped_frame_ratio)
            .is_err()
        {
            return Err(ConfigError::Invalid(format!(
                "dropped_frame_ratio {} overflows the dropped-frame threshold",
                self.dropped_frame_ratio
            )));
        }
        for (field, value) in [
            ("max_dirty_regions", self.max_dirty_regions),
            ("message_capacity", self.message_capacity),
            ("metrics_window", self.metrics_window),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{field} must be at least 1")));
            }
        }
        if self.reporting_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "reporting_interval_ms must be at least 1".into(),
            ));
        }
        self.quality.validate()
    }

    /// Frame budget as a duration. Saturates for values
    /// [`validate`](Self::validate) rejects.
    #[must_use]
    pub fn target_frame(&self) -> Duration {
        Duration::try_from_secs_f64(self.target_frame_ms / 1000.0).unwrap_or(Duration::MAX)
    }

    /// Frames longer than this count as dropped. Saturates like
    /// [`target_frame`](Self::target_frame).
    #[must_use]
    pub fn dropped_frame_threshold(&self) -> Duration {
        Duration::try_from_secs_f64(self.target_frame().as_secs_f64() * self.dropped_frame_ratio)
            .unwrap_or(Duration::MAX)
    }

    /// Reporting interval as a duration.
    #[must_use]
    pub fn reporting_interval(&self) -> Duration {
        Duration::from_millis(self.reporting_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = RenderConfig::from_toml_str("").unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.target_frame(), Duration::from_millis(16));
    }

    #[test]
    fn test_partial_document() {
        let config = RenderConfig::from_toml_str(
            r#"
            target_frame_ms = 33.0
            initial_quality = "medium"

            [quality]
            downgrade_after_samples = 4
            max_level = "high"
            "#,
        )
        .unwrap();
        assert_eq!(config.initial_quality, QualityLevel::Medium);
        assert_eq!(config.quality.downgrade_after_samples, 4);
        assert_eq!(config.quality.upgrade_after_samples, 60);
        assert_eq!(config.quality.max_level, QualityLevel::High);
        assert_eq!(config.max_dirty_regions, DEFAULT_MAX_DIRTY_REGIONS);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            RenderConfig::from_toml_str("target_frame_ms = 0.0"),
            Err(ConfigError::NonPositiveValue { field: "target_frame_ms", .. })
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("message_capacity = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("target_frame_ms = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("[quality]\nmin_level = \"ultra\"\nmax_level = \"low\""),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_durations_out_of_range() {
        assert!(matches!(
            RenderConfig::from_toml_str("target_frame_ms = 1e300"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("target_frame_ms = 1000.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("dropped_frame_ratio = 1e300"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(RenderConfig::from_toml_str("target_frame_ms = 1000.0").is_ok());

        // Accessors never panic, even on a config nobody validated.
        let wild = RenderConfig {
            target_frame_ms: 1e300,
            dropped_frame_ratio: 1e300,
            ..RenderConfig::default()
        };
        assert_eq!(wild.target_frame(), Duration::MAX);
        assert_eq!(wild.dropped_frame_threshold(), Duration::MAX);
    }

    #[test]
    fn test_missing_file() {
        let err = RenderConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
