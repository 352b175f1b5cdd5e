//! Budget-gated drain of the render queue.
//!
//! Each tick the scheduler walks the queue in priority order. Before popping
//! a request it asks the [`FrameBudgetManager`] whether the estimated cost of
//! the request's layers still fits; the first request that does not fit stays
//! at the front of its tier and the drain stops, so strict priority order is
//! never violated. Critical requests skip the check.

use std::time::Duration;

use mosaic_shared::{LayerSet, RenderLayerType, LAYER_TYPE_COUNT};

use super::budget::{BudgetReport, FrameBudgetManager};
use super::queue::{PushOutcome, RenderQueue};
use super::request::{FrameMetadata, FrameRequest, Priority};

/// Smoothing factor for per-layer cost estimates.
const COST_EMA_ALPHA: f64 = 0.2;

/// Cost assumed for a layer that has never rendered.
const UNMEASURED_LAYER_COST: Duration = Duration::from_millis(1);

/// Exponential moving average in seconds.
#[derive(Clone, Copy, Debug)]
struct Ema {
    value: f64,
    alpha: f64,
    initialized: bool,
}

impl Ema {
    const fn new(alpha: f64) -> Self {
        Self {
            value: 0.0,
            alpha,
            initialized: false,
        }
    }

    fn update(&mut self, sample: f64) {
        if self.initialized {
            self.value = self.alpha * sample + (1.0 - self.alpha) * self.value;
        } else {
            self.value = sample;
            self.initialized = true;
        }
    }

    fn get(&self) -> Option<f64> {
        self.initialized.then_some(self.value)
    }
}

/// Result of [`RenderScheduler::schedule_frame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Empty layer set, nothing queued.
    DroppedEmpty,
    /// New request queued.
    Enqueued,
    /// Merged into a queued request.
    Coalesced,
    /// The owning coordinator has been disposed.
    Rejected,
}

/// Counters since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Requests queued as new entries
    pub enqueued: u64,
    /// Requests merged into queued ones
    pub coalesced: u64,
    /// Requests popped and rendered
    pub executed: u64,
    /// Times a request was left queued for lack of budget
    pub deferred: u64,
    /// Requests with an empty layer set
    pub dropped_empty: u64,
}

/// What one drain did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainReport {
    /// Layers rendered this tick
    pub rendered: LayerSet,
    /// Requests completed this tick
    pub executed: usize,
    /// The drain stopped on a request that did not fit
    pub deferred: bool,
    /// Requests still queued
    pub pending: usize,
    /// Budget accounting for the tick
    pub budget: BudgetReport,
}

/// Priority queue + drain loop.
#[derive(Debug)]
pub struct RenderScheduler {
    queue: RenderQueue,
    budget: FrameBudgetManager,
    costs: [Ema; LAYER_TYPE_COUNT],
    stats: SchedulerStats,
}

impl RenderScheduler {
    /// Creates a scheduler with a frame budget of `target`.
    #[must_use]
    pub fn new(target: Duration) -> Self {
        Self {
            queue: RenderQueue::new(),
            budget: FrameBudgetManager::new(target),
            costs: [Ema::new(COST_EMA_ALPHA); LAYER_TYPE_COUNT],
            stats: SchedulerStats::default(),
        }
    }

    /// Queues a request. An empty layer set is a silent no-op.
    pub fn schedule_frame(
        &mut self,
        layers: LayerSet,
        priority: Priority,
        timestamp: Duration,
        metadata: FrameMetadata,
    ) -> ScheduleOutcome {
        if layers.is_empty() {
            self.stats.dropped_empty += 1;
            return ScheduleOutcome::DroppedEmpty;
        }
        match self.queue.push(layers, priority, timestamp, metadata) {
            PushOutcome::Enqueued => {
                self.stats.enqueued += 1;
                ScheduleOutcome::Enqueued
            }
            PushOutcome::Coalesced => {
                self.stats.coalesced += 1;
                tracing::debug!(
                    priority = priority.name(),
                    %layers,
                    source = metadata.source.unwrap_or("-"),
                    "frame request coalesced"
                );
                ScheduleOutcome::Coalesced
            }
        }
    }

    /// Renders queued requests for frame `frame_index` while budget lasts.
    ///
    /// `render` draws one layer and returns how long it took. A layer is
    /// rendered at most once per drain: later requests naming it only
    /// render their remaining layers. The first request of a drain always
    /// runs, so a layer slower than the whole budget still makes progress.
    pub fn drain<F>(&mut self, frame_index: u64, mut render: F) -> DrainReport
    where
        F: FnMut(RenderLayerType) -> Duration,
    {
        self.budget.begin_frame(frame_index);
        let mut rendered = LayerSet::EMPTY;
        let mut executed = 0;
        let mut deferred = false;

        'tiers: for priority in Priority::ALL {
            while let Some(front) = self.queue.front(priority) {
                let todo = front.layers.difference(rendered);
                if priority != Priority::Critical
                    && executed > 0
                    && !todo.is_empty()
                    && !self.budget.has_budget(self.estimate(todo))
                {
                    self.stats.deferred += 1;
                    deferred = true;
                    tracing::debug!(
                        priority = priority.name(),
                        layers = %todo,
                        remaining_us = self.budget.remaining().as_micros(),
                        "frame request deferred"
                    );
                    break 'tiers;
                }
                self.queue.pop_front(priority);
                for layer in todo.iter() {
                    let elapsed = render(layer);
                    self.record_cost(layer, elapsed);
                    self.budget.report_phase(elapsed);
                }
                rendered = rendered.union(todo);
                executed += 1;
                self.stats.executed += 1;
            }
        }

        DrainReport {
            rendered,
            executed,
            deferred,
            pending: self.queue.len(),
            budget: self.budget.end_frame(),
        }
    }

    /// Renders `layers` right now, outside the queue and the budget.
    ///
    /// Costs are still recorded so later estimates stay accurate.
    pub fn force_frame<F>(&mut self, layers: LayerSet, mut render: F) -> LayerSet
    where
        F: FnMut(RenderLayerType) -> Duration,
    {
        for layer in layers.iter() {
            let elapsed = render(layer);
            self.record_cost(layer, elapsed);
        }
        layers
    }

    /// Estimated render cost of a layer set.
    #[must_use]
    pub fn estimate(&self, layers: LayerSet) -> Duration {
        layers
            .iter()
            .map(|l| {
                self.costs[l.index()]
                    .get()
                    .map_or(UNMEASURED_LAYER_COST, Duration::from_secs_f64)
            })
            .sum()
    }

    fn record_cost(&mut self, layer: RenderLayerType, elapsed: Duration) {
        self.costs[layer.index()].update(elapsed.as_secs_f64());
    }

    /// Queued requests in drain order.
    pub fn pending(&self) -> impl Iterator<Item = &FrameRequest> {
        self.queue.iter()
    }

    /// Number of queued requests.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Union of all queued layer sets.
    #[must_use]
    pub fn pending_layers(&self) -> LayerSet {
        self.queue.pending_layers()
    }

    /// Drops every queued request.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Frame budget.
    #[must_use]
    pub fn budget(&self) -> &FrameBudgetManager {
        &self.budget
    }

    /// Changes the frame budget target.
    pub fn set_target(&mut self, target: Duration) {
        self.budget.set_target(target);
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}
