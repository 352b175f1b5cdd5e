//! # MOSAIC Rendering Coordinator
//!
//! Keeps the puzzle canvas responsive by deciding what to redraw, when, and
//! at which fidelity:
//! - Four coordinate spaces with exact, cached transforms
//! - Three independent layers (static board, dynamic pieces, effects)
//! - Prioritized, coalesced frame requests gated by a per-frame budget
//! - Hysteretic quality adaptation from rolling frame metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     RENDER COORDINATOR                        │
//! ├───────────────────────────────────────────────────────────────┤
//! │  CoordinateSystem   DirtyRegionTracker   MessageBus           │
//! │         │                  │                 │                │
//! │         └──── RenderContext ┴── Layer × 3 ◄───┘                │
//! │                     ▲                                         │
//! │  RenderScheduler ───┘  (FrameBudgetManager gates each drain)  │
//! │         │                                                     │
//! │  PerformanceMetrics ──► QualityAdapter ──► update_quality     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! - One render thread owns all state; layers never render in parallel
//! - Bad coordinates are recoverable [`DomainError`]s, bad config is fatal
//! - Registering a slot twice or scheduling an empty slot panics

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod coords;
pub mod dirty;
pub mod error;
pub mod pipeline;
pub mod quality;

pub use config::RenderConfig;
pub use coordinator::{
    Clock, DebugOverlay, Delivery, Layer, ManualClock, MessageBus, MessagePoster, MetricsSink,
    NullMetricsSink, PerformanceSnapshot, RecordedMetrics, RecordingMetricsSink, RenderContext,
    RenderCoordinator, RenderCoordinatorBuilder, SystemClock, TickReport,
};
pub use coords::{Affine2, CoordinateSystem, CoordinateSystemConfig, FitMode};
pub use dirty::{DirtyRegion, DirtyRegionTracker};
pub use error::{ConfigError, ConfigResult, CoordinateSpace, DomainError, DomainResult};
pub use pipeline::{
    BudgetReport, DrainReport, FrameBudgetManager, FrameMetadata, FrameRequest, Priority,
    RenderQueue, RenderScheduler, ScheduleOutcome, SchedulerStats,
};
pub use quality::{
    ChangeReason, IntervalSample, PerformanceMetrics, QualityAdapter, QualityChange,
    QualitySample, QualityThresholds, SampleVerdict,
};
