//! Per-frame time budget.

use std::time::Duration;

/// Summary of one finished frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetReport {
    /// Frame the report covers
    pub frame_index: u64,
    /// Time reported by phases
    pub spent: Duration,
    /// Budget the frame had
    pub target: Duration,
    /// Spent exceeded target
    pub over_budget: bool,
}

/// Tracks remaining time in the current frame against a target duration.
///
/// Resets exactly once per frame boundary: calling
/// [`begin_frame`](Self::begin_frame) twice with the same index is a no-op,
/// so nested callers cannot hand a frame a second budget.
#[derive(Debug)]
pub struct FrameBudgetManager {
    target: Duration,
    spent: Duration,
    frame_index: Option<u64>,
    frames: u64,
    over_budget_frames: u64,
}

impl FrameBudgetManager {
    /// Creates a manager for the given target frame duration.
    #[must_use]
    pub fn new(target: Duration) -> Self {
        Self {
            target,
            spent: Duration::ZERO,
            frame_index: None,
            frames: 0,
            over_budget_frames: 0,
        }
    }

    /// Starts frame `frame_index`. Returns `false` if it was already started.
    pub fn begin_frame(&mut self, frame_index: u64) -> bool {
        if self.frame_index == Some(frame_index) {
            return false;
        }
        self.frame_index = Some(frame_index);
        self.spent = Duration::ZERO;
        true
    }

    /// Deducts the measured duration of a finished phase.
    pub fn report_phase(&mut self, elapsed: Duration) {
        self.spent = self.spent.saturating_add(elapsed);
    }

    /// Whether the rest of the frame can cover a phase of `estimated` cost.
    #[must_use]
    pub fn has_budget(&self, estimated: Duration) -> bool {
        self.spent < self.target && estimated <= self.remaining()
    }

    /// Time left in the current frame.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.target.saturating_sub(self.spent)
    }

    /// Time reported so far this frame.
    #[must_use]
    pub fn spent(&self) -> Duration {
        self.spent
    }

    /// Target frame duration.
    #[must_use]
    pub fn target(&self) -> Duration {
        self.target
    }

    /// Changes the target. Takes effect immediately.
    pub fn set_target(&mut self, target: Duration) {
        self.target = target;
    }

    /// Closes the current frame and reports how it went.
    pub fn end_frame(&mut self) -> BudgetReport {
        let over_budget = self.spent > self.target;
        self.frames += 1;
        if over_budget {
            self.over_budget_frames += 1;
        }
        BudgetReport {
            frame_index: self.frame_index.unwrap_or_default(),
            spent: self.spent,
            target: self.target,
            over_budget,
        }
    }

    /// Frames closed with [`end_frame`](Self::end_frame).
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames that ran over the target.
    #[must_use]
    pub fn over_budget_frames(&self) -> u64 {
        self.over_budget_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_budget_deducts_phases() {
        let mut budget = FrameBudgetManager::new(16 * MS);
        budget.begin_frame(1);
        assert!(budget.has_budget(16 * MS));
        budget.report_phase(10 * MS);
        assert_eq!(budget.remaining(), 6 * MS);
        assert!(budget.has_budget(6 * MS));
        assert!(!budget.has_budget(7 * MS));
    }

    #[test]
    fn test_exhausted_budget_rejects_zero_cost() {
        let mut budget = FrameBudgetManager::new(16 * MS);
        budget.begin_frame(1);
        budget.report_phase(16 * MS);
        assert!(!budget.has_budget(Duration::ZERO));
    }

    #[test]
    fn test_begin_frame_resets_once() {
        let mut budget = FrameBudgetManager::new(16 * MS);
        assert!(budget.begin_frame(7));
        budget.report_phase(5 * MS);
        assert!(!budget.begin_frame(7));
        assert_eq!(budget.spent(), 5 * MS);
        assert!(budget.begin_frame(8));
        assert_eq!(budget.spent(), Duration::ZERO);
    }

    #[test]
    fn test_end_frame_counts_overruns() {
        let mut budget = FrameBudgetManager::new(16 * MS);
        budget.begin_frame(1);
        budget.report_phase(20 * MS);
        let report = budget.end_frame();
        assert!(report.over_budget);
        assert_eq!(report.frame_index, 1);

        budget.begin_frame(2);
        budget.report_phase(3 * MS);
        assert!(!budget.end_frame().over_budget);
        assert_eq!(budget.frames(), 2);
        assert_eq!(budget.over_budget_frames(), 1);
    }
}
