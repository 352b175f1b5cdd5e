//! # MOSAIC
//!
//! Host-side integration for the puzzle canvas:
//!
//! ```text
//! pointer ──► InputRouter ──► RenderCoordinator ◄── CanvasLoop (tick pacing)
//!                 │                  │
//!                 │                  ├── BoardLayer   (static)
//!                 │                  ├── PiecesLayer  (dynamic)
//!                 └── dirty cells    └── EffectsLayer (effects)
//! ```
//!
//! The layers here are simulations: they spend time on a [`ManualClock`]
//! proportional to the work a real renderer would do, so a whole session can
//! run headless and deterministically.
//!
//! [`ManualClock`]: mosaic_rendering::ManualClock

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas_loop;
pub mod input;
pub mod layers;

pub use canvas_loop::{CanvasLoop, FrameStats, FrameStatsAccumulator, TickPacer};
pub use input::{InputRouter, PointerEvent, PointerPhase, RoutedInput};
pub use layers::{BoardLayer, CostModel, EffectsLayer, PiecesLayer, SimulatedWork};

pub use mosaic_rendering as rendering;
pub use mosaic_shared as shared;
