//! Frame scheduling.
//!
//! ```text
//! schedule_frame ──► RenderQueue (critical | high | normal | low)
//!                          │
//!           tick ──► drain ├─ has_budget(estimate)? ──► render layers
//!                          │                              │
//!                          └─ FrameBudgetManager ◄── report_phase
//! ```

mod budget;
mod queue;
mod request;
mod scheduler;

pub use budget::{BudgetReport, FrameBudgetManager};
pub use queue::{PushOutcome, RenderQueue};
pub use request::{FrameMetadata, FrameRequest, Priority};
pub use scheduler::{DrainReport, RenderScheduler, ScheduleOutcome, SchedulerStats};
