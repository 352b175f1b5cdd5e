//! Coordinate spaces.
//!
//! ```text
//! ScreenSpace (device px) ──(p - offset) / scale──► CanvasSpace (logical)
//!                                                     │          │
//!                               floor(p / cell), clamp│          │p * zoom + pan
//!                                                     ▼          ▼
//!                                               GridSpace   WorkspaceSpace
//! ```

mod config;
mod system;
mod transform;

pub use config::{CoordinateSystemConfig, FitMode};
pub use system::CoordinateSystem;
pub use transform::Affine2;
