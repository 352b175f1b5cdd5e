//! Adaptive quality.
//!
//! [`PerformanceMetrics`] collects frame and layer timings on the render
//! thread; once per reporting interval the coordinator turns them into an
//! [`IntervalSample`] and feeds it to the [`QualityAdapter`].

mod adapter;
mod metrics;

pub use adapter::{
    ChangeReason, QualityAdapter, QualityChange, QualitySample, QualityThresholds, SampleVerdict,
};
pub use metrics::{IntervalSample, PerformanceMetrics};
