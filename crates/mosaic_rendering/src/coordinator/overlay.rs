//! Developer overlay text.
//!
//! Read-only: formats a [`PerformanceSnapshot`], never touches the
//! coordinator.

use mosaic_shared::RenderLayerType;

use super::snapshot::PerformanceSnapshot;

/// Toggleable text overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugOverlay {
    visible: bool,
}

impl DebugOverlay {
    /// Overlay with the given visibility.
    #[must_use]
    pub const fn new(visible: bool) -> Self {
        Self { visible }
    }

    /// Flips visibility.
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Current visibility.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Overlay lines, or nothing while hidden.
    #[must_use]
    pub fn lines(&self, snapshot: &PerformanceSnapshot) -> Vec<String> {
        if !self.visible {
            return Vec::new();
        }
        let mut lines = vec![
            format!(
                "{:.1} fps  avg {:.2} ms  worst {:.2} ms",
                snapshot.fps,
                snapshot.average_frame_time.as_secs_f64() * 1000.0,
                snapshot.worst_frame_time.as_secs_f64() * 1000.0,
            ),
            format!(
                "quality {}  dropped {}  frames {}",
                snapshot.quality, snapshot.dropped_frames, snapshot.frames_rendered
            ),
            format!(
                "layers {}  pending {}  dirty {}  lost msgs {}",
                snapshot.layer_count,
                snapshot.pending_requests,
                snapshot.dirty_regions,
                snapshot.dropped_messages
            ),
        ];
        for layer in RenderLayerType::ALL {
            if let Some(t) = snapshot.layer_time(layer) {
                lines.push(format!("  {:<8}{:.2} ms", layer.name(), t.as_secs_f64() * 1000.0));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mosaic_shared::QualityLevel;

    use super::*;

    fn snapshot() -> PerformanceSnapshot {
        PerformanceSnapshot {
            fps: 59.94,
            dropped_frames: 3,
            average_frame_time: Duration::from_micros(16_683),
            worst_frame_time: Duration::from_millis(40),
            quality: QualityLevel::Medium,
            layer_count: 2,
            frames_rendered: 600,
            pending_requests: 1,
            layer_times: [Some(Duration::from_micros(1_500)), None, None],
            dirty_regions: 0,
            dropped_messages: 0,
        }
    }

    #[test]
    fn test_hidden_overlay_is_empty() {
        assert!(DebugOverlay::default().lines(&snapshot()).is_empty());
    }

    #[test]
    fn test_overlay_lines() {
        let mut overlay = DebugOverlay::default();
        overlay.toggle();
        let lines = overlay.lines(&snapshot());
        assert_eq!(lines[0], "59.9 fps  avg 16.68 ms  worst 40.00 ms");
        assert_eq!(lines[1], "quality medium  dropped 3  frames 600");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "  static  1.50 ms");
    }
}
