//! Outbound metrics hooks.

use std::sync::Arc;
use std::time::Duration;

use mosaic_shared::RenderLayerType;
use parking_lot::Mutex;

use super::snapshot::PerformanceSnapshot;
use crate::quality::QualityChange;

/// Receives coordinator telemetry. Every method defaults to a no-op.
pub trait MetricsSink: Send + Sync {
    /// A frame finished.
    fn frame(&self, _frame_index: u64, _duration: Duration, _dropped: bool) {}

    /// A layer rendered.
    fn layer(&self, _layer: RenderLayerType, _duration: Duration) {}

    /// The quality level changed.
    fn quality_changed(&self, _change: QualityChange) {}

    /// A reporting interval closed.
    fn report(&self, _snapshot: &PerformanceSnapshot) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {}

/// Everything a [`RecordingMetricsSink`] has seen.
#[derive(Debug, Clone, Default)]
pub struct RecordedMetrics {
    /// `(frame_index, duration, dropped)` per frame
    pub frames: Vec<(u64, Duration, bool)>,
    /// `(layer, duration)` per layer render
    pub layers: Vec<(RenderLayerType, Duration)>,
    /// Quality transitions in order
    pub quality_changes: Vec<QualityChange>,
    /// Snapshots from periodic reports
    pub reports: Vec<PerformanceSnapshot>,
}

/// Keeps everything in memory. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingMetricsSink {
    inner: Arc<Mutex<RecordedMetrics>>,
}

impl RecordingMetricsSink {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the record so far.
    #[must_use]
    pub fn recorded(&self) -> RecordedMetrics {
        self.inner.lock().clone()
    }

    /// Quality transitions so far.
    #[must_use]
    pub fn quality_changes(&self) -> Vec<QualityChange> {
        self.inner.lock().quality_changes.clone()
    }

    /// Frames seen so far.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.inner.lock().frames.len()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn frame(&self, frame_index: u64, duration: Duration, dropped: bool) {
        self.inner.lock().frames.push((frame_index, duration, dropped));
    }

    fn layer(&self, layer: RenderLayerType, duration: Duration) {
        self.inner.lock().layers.push((layer, duration));
    }

    fn quality_changed(&self, change: QualityChange) {
        self.inner.lock().quality_changes.push(change);
    }

    fn report(&self, snapshot: &PerformanceSnapshot) {
        self.inner.lock().reports.push(snapshot.clone());
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Arc<S> {
    fn frame(&self, frame_index: u64, duration: Duration, dropped: bool) {
        (**self).frame(frame_index, duration, dropped);
    }

    fn layer(&self, layer: RenderLayerType, duration: Duration) {
        (**self).layer(layer, duration);
    }

    fn quality_changed(&self, change: QualityChange) {
        (**self).quality_changed(change);
    }

    fn report(&self, snapshot: &PerformanceSnapshot) {
        (**self).report(snapshot);
    }
}
