//! Rolling frame and layer timing.

use std::collections::VecDeque;
use std::time::Duration;

use mosaic_shared::{RenderLayerType, LAYER_TYPE_COUNT};

/// Fixed-capacity window of durations with a running sum.
#[derive(Debug, Clone)]
struct Window {
    samples: VecDeque<Duration>,
    capacity: usize,
    sum: Duration,
}

impl Window {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            sum: Duration::ZERO,
        }
    }

    fn push(&mut self, sample: Duration) {
        if self.samples.len() == self.capacity {
            if let Some(old) = self.samples.pop_front() {
                self.sum = self.sum.saturating_sub(old);
            }
        }
        self.samples.push_back(sample);
        self.sum += sample;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn average(&self) -> Option<Duration> {
        let n = self.samples.len();
        (n > 0).then(|| self.sum / n as u32)
    }

    fn max(&self) -> Option<Duration> {
        self.samples.iter().max().copied()
    }
}

/// Aggregate handed to the quality adapter once per reporting interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalSample {
    /// Frames per second over the interval
    pub fps: f64,
    /// Dropped frames in the interval
    pub dropped_frames: u32,
    /// Mean frame duration in the interval
    pub avg_frame_time: Duration,
    /// Frames in the interval
    pub frames: u32,
}

/// Frame-duration and per-layer render-duration samples.
///
/// Keeps a rolling window for snapshots plus running totals for the current
/// reporting interval, which [`take_interval`](Self::take_interval) resets.
#[derive(Debug, Clone)]
pub struct PerformanceMetrics {
    frames: Window,
    layers: [Window; LAYER_TYPE_COUNT],
    total_frames: u64,
    total_dropped: u64,
    interval_frames: u32,
    interval_dropped: u32,
    interval_time: Duration,
}

impl PerformanceMetrics {
    /// Creates metrics with a window of `window` samples.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            frames: Window::new(window),
            layers: std::array::from_fn(|_| Window::new(window)),
            total_frames: 0,
            total_dropped: 0,
            interval_frames: 0,
            interval_time: Duration::ZERO,
            interval_dropped: 0,
        }
    }

    /// Records a finished frame.
    pub fn record_frame(&mut self, duration: Duration, dropped: bool) {
        self.frames.push(duration);
        self.total_frames += 1;
        self.interval_frames = self.interval_frames.saturating_add(1);
        self.interval_time += duration;
        if dropped {
            self.total_dropped += 1;
            self.interval_dropped = self.interval_dropped.saturating_add(1);
        }
    }

    /// Records one layer render.
    pub fn record_layer(&mut self, layer: RenderLayerType, duration: Duration) {
        self.layers[layer.index()].push(duration);
    }

    /// Closes the reporting interval. `elapsed` is the wall time it covered.
    pub fn take_interval(&mut self, elapsed: Duration) -> IntervalSample {
        let frames = self.interval_frames;
        let secs = elapsed.as_secs_f64();
        let sample = IntervalSample {
            fps: if secs > 0.0 { f64::from(frames) / secs } else { 0.0 },
            dropped_frames: self.interval_dropped,
            avg_frame_time: if frames > 0 {
                self.interval_time / frames
            } else {
                Duration::ZERO
            },
            frames,
        };
        self.interval_frames = 0;
        self.interval_dropped = 0;
        self.interval_time = Duration::ZERO;
        sample
    }

    /// Mean frame duration over the window.
    #[must_use]
    pub fn average_frame_time(&self) -> Duration {
        self.frames.average().unwrap_or_default()
    }

    /// Worst frame duration over the window.
    #[must_use]
    pub fn worst_frame_time(&self) -> Duration {
        self.frames.max().unwrap_or_default()
    }

    /// Frame rate implied by the average frame duration.
    #[must_use]
    pub fn fps(&self) -> f64 {
        let avg = self.average_frame_time().as_secs_f64();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    /// Mean render duration of one layer, if it has rendered.
    #[must_use]
    pub fn average_layer_time(&self, layer: RenderLayerType) -> Option<Duration> {
        self.layers[layer.index()].average()
    }

    /// Frames recorded since construction.
    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Dropped frames since construction.
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.total_dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_window_rolls() {
        let mut m = PerformanceMetrics::new(2);
        m.record_frame(10 * MS, false);
        m.record_frame(20 * MS, false);
        m.record_frame(30 * MS, true);
        assert_eq!(m.average_frame_time(), 25 * MS);
        assert_eq!(m.worst_frame_time(), 30 * MS);
        assert_eq!(m.total_frames(), 3);
        assert_eq!(m.dropped_frames(), 1);
        assert!((m.fps() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_take_interval_resets() {
        let mut m = PerformanceMetrics::new(8);
        for _ in 0..4 {
            m.record_frame(10 * MS, false);
        }
        m.record_frame(30 * MS, true);

        let s = m.take_interval(Duration::from_millis(250));
        assert_eq!(s.frames, 5);
        assert_eq!(s.dropped_frames, 1);
        assert_eq!(s.avg_frame_time, 14 * MS);
        assert!((s.fps - 20.0).abs() < 1e-9);

        let empty = m.take_interval(Duration::from_millis(250));
        assert_eq!(empty.frames, 0);
        assert_eq!(empty.avg_frame_time, Duration::ZERO);
        // Window survives the interval reset.
        assert_eq!(m.total_frames(), 5);
    }

    #[test]
    fn test_layer_averages() {
        let mut m = PerformanceMetrics::new(4);
        assert_eq!(m.average_layer_time(RenderLayerType::Effects), None);
        m.record_layer(RenderLayerType::Effects, 2 * MS);
        m.record_layer(RenderLayerType::Effects, 4 * MS);
        assert_eq!(m.average_layer_time(RenderLayerType::Effects), Some(3 * MS));
    }
}
