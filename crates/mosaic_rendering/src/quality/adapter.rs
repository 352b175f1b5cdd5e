//! Hysteretic quality controller.
//!
//! Downgrades need a run of consecutive bad samples plus a cooldown since the
//! last change; upgrades need a much longer good run and a longer cooldown.
//! A sample that is neither good nor bad resets both runs, so noisy or
//! alternating input never moves the level.

use std::collections::VecDeque;
use std::time::Duration;

use mosaic_shared::QualityLevel;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Samples kept for [`QualityAdapter::recent_samples`].
const SAMPLE_HISTORY: usize = 64;

/// Tuning for [`QualityAdapter`]. Loaded from the `[quality]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Consecutive bad samples before a downgrade
    pub downgrade_after_samples: u32,
    /// Minimum time since the last change before a downgrade (ms)
    pub downgrade_cooldown_ms: u64,
    /// Consecutive good samples before an upgrade
    pub upgrade_after_samples: u32,
    /// Minimum time since the last change before an upgrade (ms)
    pub upgrade_cooldown_ms: u64,
    /// Dropped frames per sample tolerated before it counts as bad
    pub max_dropped_per_sample: u32,
    /// Bad if average frame time exceeds target by this factor
    pub max_frame_time_ratio: f64,
    /// Bad if fps falls under this fraction of the target
    pub min_fps_ratio: f64,
    /// Good only if fps reaches this fraction of the target
    pub good_fps_ratio: f64,
    /// Lowest level the adapter may pick
    pub min_level: QualityLevel,
    /// Highest level the adapter may pick
    pub max_level: QualityLevel,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            downgrade_after_samples: 10,
            downgrade_cooldown_ms: 2_000,
            upgrade_after_samples: 60,
            upgrade_cooldown_ms: 5_000,
            max_dropped_per_sample: 2,
            max_frame_time_ratio: 1.25,
            min_fps_ratio: 0.8,
            good_fps_ratio: 0.95,
            min_level: QualityLevel::Low,
            max_level: QualityLevel::Ultra,
        }
    }
}

impl QualityThresholds {
    /// Checks ranges and ordering.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.downgrade_after_samples == 0 || self.upgrade_after_samples == 0 {
            return Err(ConfigError::Invalid(
                "quality sample runs must be at least 1".into(),
            ));
        }
        for (field, value) in [
            ("max_frame_time_ratio", self.max_frame_time_ratio),
            ("min_fps_ratio", self.min_fps_ratio),
            ("good_fps_ratio", self.good_fps_ratio),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveValue { field, value });
            }
        }
        if self.good_fps_ratio < self.min_fps_ratio {
            return Err(ConfigError::Invalid(format!(
                "good_fps_ratio ({}) must not be below min_fps_ratio ({})",
                self.good_fps_ratio, self.min_fps_ratio
            )));
        }
        if self.min_level > self.max_level {
            return Err(ConfigError::Invalid(format!(
                "min_level ({}) is above max_level ({})",
                self.min_level, self.max_level
            )));
        }
        Ok(())
    }

    fn clamp(&self, level: QualityLevel) -> QualityLevel {
        level.max(self.min_level).min(self.max_level)
    }
}

/// Why the level changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// Sustained bad samples
    Degraded,
    /// Sustained good samples
    Recovered,
    /// Host called `set_quality`
    Override,
}

/// A level transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityChange {
    /// Level before
    pub from: QualityLevel,
    /// Level after
    pub to: QualityLevel,
    /// Trigger
    pub reason: ChangeReason,
}

/// How one sample was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleVerdict {
    /// Counts toward a downgrade
    Bad,
    /// Counts toward an upgrade
    Good,
    /// Resets both runs
    Neutral,
}

/// One metrics report as the adapter saw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySample {
    /// Reported fps
    pub fps: f64,
    /// Dropped frames counted for the sample
    pub dropped_frames: u32,
    /// Reported average frame time
    pub avg_frame_time: Duration,
    /// Judgement
    pub verdict: SampleVerdict,
}

/// Raises and lowers [`QualityLevel`] from rolling performance reports.
#[derive(Debug)]
pub struct QualityAdapter {
    thresholds: QualityThresholds,
    current: QualityLevel,
    bad_run: u32,
    good_run: u32,
    last_transition: Duration,
    dropped_since_report: u32,
    history: VecDeque<QualitySample>,
    transitions: u64,
}

impl QualityAdapter {
    /// Creates an adapter at `initial` (clamped into the allowed range).
    /// `now` starts the first cooldown.
    #[must_use]
    pub fn new(thresholds: QualityThresholds, initial: QualityLevel, now: Duration) -> Self {
        Self {
            current: thresholds.clamp(initial),
            thresholds,
            bad_run: 0,
            good_run: 0,
            last_transition: now,
            dropped_since_report: 0,
            history: VecDeque::with_capacity(SAMPLE_HISTORY),
            transitions: 0,
        }
    }

    /// Current level.
    #[must_use]
    pub fn current_quality(&self) -> QualityLevel {
        self.current
    }

    /// Fast path for a single dropped frame.
    ///
    /// Breaks the current good run immediately and is folded into the next
    /// report. Never changes the level by itself.
    pub fn handle_dropped_frame(&mut self) {
        self.dropped_since_report = self.dropped_since_report.saturating_add(1);
        self.good_run = 0;
    }

    /// Feeds one reporting interval. Returns the transition, if any.
    pub fn update_metrics(
        &mut self,
        fps: f64,
        dropped_frames: u32,
        avg_frame_time: Duration,
        now: Duration,
    ) -> Option<QualityChange> {
        // The fast path and the report may count the same frames.
        let dropped = dropped_frames.max(self.dropped_since_report);
        self.dropped_since_report = 0;

        let verdict = self.judge(fps, dropped, avg_frame_time);
        if self.history.len() == SAMPLE_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(QualitySample {
            fps,
            dropped_frames: dropped,
            avg_frame_time,
            verdict,
        });

        match verdict {
            SampleVerdict::Bad => {
                self.bad_run = self.bad_run.saturating_add(1);
                self.good_run = 0;
            }
            SampleVerdict::Good => {
                self.good_run = self.good_run.saturating_add(1);
                self.bad_run = 0;
            }
            SampleVerdict::Neutral => {
                self.bad_run = 0;
                self.good_run = 0;
            }
        }

        let since = now.saturating_sub(self.last_transition);
        let t = &self.thresholds;
        if self.bad_run >= t.downgrade_after_samples
            && since >= Duration::from_millis(t.downgrade_cooldown_ms)
        {
            if let Some(lower) = self.current.lower().filter(|l| *l >= t.min_level) {
                return Some(self.transition(lower, ChangeReason::Degraded, now));
            }
        }
        if self.good_run >= t.upgrade_after_samples
            && since >= Duration::from_millis(t.upgrade_cooldown_ms)
        {
            if let Some(higher) = self.current.higher().filter(|l| *l <= t.max_level) {
                return Some(self.transition(higher, ChangeReason::Recovered, now));
            }
        }
        None
    }

    /// Host override. Counts as a transition for cooldown purposes.
    pub fn set_quality(&mut self, level: QualityLevel, now: Duration) -> Option<QualityChange> {
        (level != self.current).then(|| self.transition(level, ChangeReason::Override, now))
    }

    fn judge(&self, fps: f64, dropped: u32, avg_frame_time: Duration) -> SampleVerdict {
        let t = &self.thresholds;
        let settings = self.current.settings();
        let target_fps = f64::from(settings.target_fps);
        let target_ms = settings.target_frame_ms();
        let frame_ms = avg_frame_time.as_secs_f64() * 1000.0;

        if dropped > t.max_dropped_per_sample
            || frame_ms > target_ms * t.max_frame_time_ratio
            || fps < target_fps * t.min_fps_ratio
        {
            SampleVerdict::Bad
        } else if dropped == 0 && frame_ms <= target_ms && fps >= target_fps * t.good_fps_ratio {
            SampleVerdict::Good
        } else {
            SampleVerdict::Neutral
        }
    }

    fn transition(&mut self, to: QualityLevel, reason: ChangeReason, now: Duration) -> QualityChange {
        let change = QualityChange {
            from: self.current,
            to,
            reason,
        };
        self.current = to;
        self.bad_run = 0;
        self.good_run = 0;
        self.last_transition = now;
        self.transitions += 1;
        change
    }

    /// Consecutive bad samples so far.
    #[must_use]
    pub fn bad_run(&self) -> u32 {
        self.bad_run
    }

    /// Consecutive good samples so far.
    #[must_use]
    pub fn good_run(&self) -> u32 {
        self.good_run
    }

    /// Most recent samples, oldest first.
    pub fn recent_samples(&self) -> impl Iterator<Item = &QualitySample> {
        self.history.iter()
    }

    /// Level changes since construction.
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Active thresholds.
    #[must_use]
    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }
}
