//! Point-in-time performance view.

use std::time::Duration;

use mosaic_shared::{QualityLevel, RenderLayerType, LAYER_TYPE_COUNT};

/// Aggregated coordinator state for hosts and the debug overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSnapshot {
    /// Frames per second over the metrics window
    pub fps: f64,
    /// Dropped frames since construction
    pub dropped_frames: u64,
    /// Mean frame duration over the window
    pub average_frame_time: Duration,
    /// Worst frame duration over the window
    pub worst_frame_time: Duration,
    /// Active quality level
    pub quality: QualityLevel,
    /// Registered layers
    pub layer_count: usize,
    /// Frames ticked since construction
    pub frames_rendered: u64,
    /// Frame requests still queued
    pub pending_requests: usize,
    /// Mean render duration per layer slot
    pub layer_times: [Option<Duration>; LAYER_TYPE_COUNT],
    /// Dirty regions waiting for the next frame
    pub dirty_regions: usize,
    /// Broadcasts dropped because the bus was full
    pub dropped_messages: u64,
}

impl PerformanceSnapshot {
    /// Mean render duration of one layer, if it has rendered.
    #[must_use]
    pub fn layer_time(&self, layer: RenderLayerType) -> Option<Duration> {
        self.layer_times[layer.index()]
    }
}
