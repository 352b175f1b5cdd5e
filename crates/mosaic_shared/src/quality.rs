//! Quality levels and the fidelity settings each one carries.

use serde::{Deserialize, Serialize};

/// Discrete fidelity level, ordered from cheapest to most expensive.
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    /// Half resolution, no effects.
    Low = 0,
    /// Reduced resolution, particles only.
    Medium = 1,
    /// Full resolution, shadows, particles and glow.
    #[default]
    High = 2,
    /// Everything on, including trails.
    Ultra = 3,
}

impl QualityLevel {
    /// All levels from lowest to highest.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Ultra];

    /// The next cheaper level, or `None` at the bottom.
    #[must_use]
    pub const fn lower(self) -> Option<Self> {
        match self {
            Self::Low => None,
            Self::Medium => Some(Self::Low),
            Self::High => Some(Self::Medium),
            Self::Ultra => Some(Self::High),
        }
    }

    /// The next richer level, or `None` at the top.
    #[must_use]
    pub const fn higher(self) -> Option<Self> {
        match self {
            Self::Low => Some(Self::Medium),
            Self::Medium => Some(Self::High),
            Self::High => Some(Self::Ultra),
            Self::Ultra => None,
        }
    }

    /// Fidelity settings for this level.
    #[must_use]
    pub const fn settings(self) -> QualitySettings {
        match self {
            Self::Low => QualitySettings {
                resolution_scale: 0.5,
                target_fps: 30,
                shadows: false,
                particles: false,
                glow: false,
                trails: false,
                max_particles: 0,
            },
            Self::Medium => QualitySettings {
                resolution_scale: 0.75,
                target_fps: 45,
                shadows: false,
                particles: true,
                glow: false,
                trails: false,
                max_particles: 150,
            },
            Self::High => QualitySettings {
                resolution_scale: 1.0,
                target_fps: 60,
                shadows: true,
                particles: true,
                glow: true,
                trails: false,
                max_particles: 400,
            },
            Self::Ultra => QualitySettings {
                resolution_scale: 1.0,
                target_fps: 60,
                shadows: true,
                particles: true,
                glow: true,
                trails: true,
                max_particles: 1000,
            },
        }
    }

    /// Lowercase name for logs and the overlay.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Bundle of fidelity/performance trade-offs applied by layers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    /// Render-target scale relative to canvas resolution (0.0..=1.0).
    pub resolution_scale: f64,
    /// Frame rate this level is expected to sustain.
    pub target_fps: u32,
    /// Drop shadows under pieces.
    pub shadows: bool,
    /// Particle effects.
    pub particles: bool,
    /// Glow around snapped pieces.
    pub glow: bool,
    /// Motion trails behind dragged pieces.
    pub trails: bool,
    /// Particle cap for the effects layer.
    pub max_particles: u32,
}

impl QualitySettings {
    /// Frame duration (ms) the target fps implies.
    #[must_use]
    pub fn target_frame_ms(&self) -> f64 {
        1000.0 / f64::from(self.target_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(QualityLevel::Low < QualityLevel::Medium);
        assert!(QualityLevel::High < QualityLevel::Ultra);
        assert_eq!(QualityLevel::Low.lower(), None);
        assert_eq!(QualityLevel::Ultra.higher(), None);
        assert_eq!(QualityLevel::Medium.higher(), Some(QualityLevel::High));
    }

    #[test]
    fn test_settings_get_cheaper_going_down() {
        for pair in QualityLevel::ALL.windows(2) {
            let (lo, hi) = (pair[0].settings(), pair[1].settings());
            assert!(lo.resolution_scale <= hi.resolution_scale);
            assert!(lo.max_particles <= hi.max_particles);
            assert!(lo.target_fps <= hi.target_fps);
        }
    }

    #[test]
    fn test_low_disables_every_effect() {
        let low = QualityLevel::Low.settings();
        assert!(!low.shadows && !low.particles && !low.glow && !low.trails);
        assert!((low.target_frame_ms() - 33.333).abs() < 0.01);
    }
}
