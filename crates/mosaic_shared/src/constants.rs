//! # Coordinator Constants
//!
//! Defaults shared by the host and the coordinator. Every value here can be
//! overridden through `RenderConfig`; these are only the starting points.

// =============================================================================
// FRAME TIMING
// =============================================================================

/// Default target frame duration in milliseconds (~60 FPS).
pub const DEFAULT_TARGET_FRAME_MS: f64 = 16.0;

/// Default interval between metrics reports fed to the quality adapter.
pub const DEFAULT_REPORTING_INTERVAL_MS: u64 = 250;

/// Default number of frame samples kept in the rolling metrics window.
pub const DEFAULT_METRICS_WINDOW: usize = 120;

/// A frame taking longer than this multiple of the target counts as dropped.
pub const DEFAULT_DROPPED_FRAME_RATIO: f64 = 1.5;

// =============================================================================
// DIRTY TRACKING & MESSAGING
// =============================================================================

/// Dirty regions kept before collapsing to a whole-surface redraw.
pub const DEFAULT_MAX_DIRTY_REGIONS: usize = 32;

/// Broadcast messages in flight before posting starts dropping.
pub const DEFAULT_MESSAGE_CAPACITY: usize = 256;

// =============================================================================
// LAYERS
// =============================================================================

/// Number of layer slots (static, dynamic, effects).
pub const LAYER_TYPE_COUNT: usize = 3;
