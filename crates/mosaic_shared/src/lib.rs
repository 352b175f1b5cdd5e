//! # MOSAIC Shared
//!
//! Common value types used by the host surface, the rendering coordinator
//! and every layer.
//!
//! ## CRITICAL RULE
//!
//! This crate holds data only. Conversions between coordinate spaces live in
//! `mosaic_rendering::coords`, never here: a point type knows which space it
//! belongs to, not how to leave it.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod constants;
pub mod layer;
pub mod math;
pub mod message;
pub mod quality;

pub use constants::{
    DEFAULT_MAX_DIRTY_REGIONS, DEFAULT_MESSAGE_CAPACITY, DEFAULT_TARGET_FRAME_MS,
    LAYER_TYPE_COUNT,
};
pub use layer::{LayerSet, RenderLayerType};
pub use math::{CanvasPoint, GridPoint, Rect, ScreenPoint, Size, Vec2, WorkspacePoint};
pub use message::{LayerMessage, MessageKind, MessageOrigin, MessagePayload};
pub use quality::{QualityLevel, QualitySettings};
