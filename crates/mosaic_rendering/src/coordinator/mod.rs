//! The render coordinator.
//!
//! ```text
//!  host ── set_coordinate_config ──► CoordinateSystem ─┐
//!   │                                                  │ RenderContext
//!   ├── mark_dirty ────────────────► DirtyRegionTracker┤
//!   ├── schedule_frame ────────────► RenderScheduler ──┼──► Layer::render
//!   ├── send_message / poster ─────► MessageBus ───────┼──► Layer::handle_message
//!   └── tick ──► drain ──► PerformanceMetrics ──► QualityAdapter
//!                                                      └──► Layer::update_quality
//! ```
//!
//! Everything here runs on one render thread. The only values that cross
//! threads are [`MessagePoster`] clones and the [`Clock`]/[`MetricsSink`]
//! collaborators.

mod bus;
mod clock;
mod layer;
mod overlay;
mod sink;
mod snapshot;

pub use bus::{MessageBus, MessagePoster};
pub use clock::{Clock, ManualClock, SystemClock};
pub use layer::{Layer, RenderContext};
pub use overlay::DebugOverlay;
pub use sink::{MetricsSink, NullMetricsSink, RecordedMetrics, RecordingMetricsSink};
pub use snapshot::PerformanceSnapshot;

use std::time::Duration;

use mosaic_shared::{
    LayerMessage, LayerSet, MessageKind, MessageOrigin, MessagePayload, QualityLevel, Rect,
    RenderLayerType, LAYER_TYPE_COUNT,
};

use crate::config::RenderConfig;
use crate::coords::{CoordinateSystem, CoordinateSystemConfig};
use crate::dirty::{DirtyRegion, DirtyRegionTracker};
use crate::error::ConfigResult;
use crate::pipeline::{FrameMetadata, Priority, RenderScheduler, ScheduleOutcome, SchedulerStats};
use crate::quality::{PerformanceMetrics, QualityAdapter, QualityChange};

/// What happened to a message handed to [`RenderCoordinator::send_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered synchronously to this layer.
    Delivered(RenderLayerType),
    /// Broadcast queued for the next pump.
    Queued,
    /// Bus full, coordinator disposed, or recipient not registered.
    Dropped,
}

/// What one [`RenderCoordinator::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Index of the frame
    pub frame_index: u64,
    /// Layers rendered
    pub rendered: LayerSet,
    /// Wall time of the frame
    pub frame_time: Duration,
    /// Frame exceeded the dropped-frame threshold
    pub dropped: bool,
    /// Requests left queued
    pub pending: usize,
    /// Broadcasts delivered before rendering
    pub messages_delivered: usize,
    /// Quality transition triggered by this tick's report, if any
    pub quality_change: Option<QualityChange>,
}

/// Builds a [`RenderCoordinator`].
pub struct RenderCoordinatorBuilder {
    config: RenderConfig,
    coords: CoordinateSystemConfig,
    clock: Box<dyn Clock>,
    sink: Box<dyn MetricsSink>,
    layers: Vec<(RenderLayerType, Box<dyn Layer>)>,
}

impl RenderCoordinatorBuilder {
    /// Starts a builder with default config, [`SystemClock`] and
    /// [`NullMetricsSink`].
    #[must_use]
    pub fn new(coords: CoordinateSystemConfig) -> Self {
        Self {
            config: RenderConfig::default(),
            coords,
            clock: Box::new(SystemClock::new()),
            sink: Box::new(NullMetricsSink),
            layers: Vec::new(),
        }
    }

    /// Runtime configuration.
    #[must_use]
    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source.
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Telemetry receiver.
    #[must_use]
    pub fn metrics_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Registers a layer at build time.
    #[must_use]
    pub fn layer(mut self, layer_type: RenderLayerType, layer: impl Layer + 'static) -> Self {
        self.layers.push((layer_type, Box::new(layer)));
        self
    }

    /// Validates the config and builds the coordinator.
    ///
    /// # Errors
    ///
    /// Whatever [`RenderConfig::validate`] rejects.
    ///
    /// # Panics
    ///
    /// If two layers were given for the same slot.
    pub fn build(self) -> ConfigResult<RenderCoordinator> {
        self.config.validate()?;
        let config = self.config;
        let now = self.clock.now();
        let bus = MessageBus::new(config.message_capacity);

        let surface = self.coords.canvas_size();
        let mut coordinator = RenderCoordinator {
            dirty: DirtyRegionTracker::new(surface, config.max_dirty_regions),
            unseen: std::array::from_fn(|_| {
                DirtyRegionTracker::new(surface, config.max_dirty_regions)
            }),
            coords: CoordinateSystem::new(self.coords),
            scheduler: RenderScheduler::new(config.target_frame()),
            adapter: QualityAdapter::new(config.quality.clone(), config.initial_quality, now),
            metrics: PerformanceMetrics::new(config.metrics_window),
            poster: bus.poster(),
            bus,
            slots: std::array::from_fn(|_| None),
            order: Vec::with_capacity(LAYER_TYPE_COUNT),
            clock: self.clock,
            sink: self.sink,
            frame_index: 0,
            last_report: now,
            disposed: false,
            config,
        };
        for (layer_type, layer) in self.layers {
            coordinator.register_layer(layer_type, layer);
        }
        Ok(coordinator)
    }
}

/// Owns the layers and every piece of frame state.
pub struct RenderCoordinator {
    config: RenderConfig,
    coords: CoordinateSystem,
    dirty: DirtyRegionTracker,
    /// Regions handed out while a layer was queued but not yet drawn.
    unseen: [DirtyRegionTracker; LAYER_TYPE_COUNT],
    scheduler: RenderScheduler,
    adapter: QualityAdapter,
    metrics: PerformanceMetrics,
    bus: MessageBus,
    poster: MessagePoster,
    slots: [Option<Box<dyn Layer>>; LAYER_TYPE_COUNT],
    order: Vec<RenderLayerType>,
    clock: Box<dyn Clock>,
    sink: Box<dyn MetricsSink>,
    frame_index: u64,
    last_report: Duration,
    disposed: bool,
}

impl RenderCoordinator {
    /// Shorthand for [`RenderCoordinatorBuilder::new`].
    #[must_use]
    pub fn builder(coords: CoordinateSystemConfig) -> RenderCoordinatorBuilder {
        RenderCoordinatorBuilder::new(coords)
    }

    // =========================================================================
    // LAYERS
    // =========================================================================

    /// Registers the layer for a slot and syncs it to the current quality.
    ///
    /// # Panics
    ///
    /// If the slot is already occupied.
    pub fn register_layer(&mut self, layer_type: RenderLayerType, mut layer: Box<dyn Layer>) {
        let slot = &mut self.slots[layer_type.index()];
        assert!(
            slot.is_none(),
            "layer `{}` is already registered",
            layer_type.name()
        );
        layer.update_quality(self.adapter.current_quality());
        layer.mark_needs_update();
        *slot = Some(layer);
        self.order.push(layer_type);
        tracing::info!(layer = layer_type.name(), "layer registered");
    }

    /// Removes a layer. Queued requests naming it render nothing for it.
    pub fn unregister_layer(&mut self, layer_type: RenderLayerType) -> Option<Box<dyn Layer>> {
        let layer = self.slots[layer_type.index()].take()?;
        self.order.retain(|&t| t != layer_type);
        self.unseen[layer_type.index()] = self.empty_tracker();
        tracing::info!(layer = layer_type.name(), "layer unregistered");
        Some(layer)
    }

    /// True if the slot is occupied.
    #[must_use]
    pub fn is_registered(&self, layer_type: RenderLayerType) -> bool {
        self.slots[layer_type.index()].is_some()
    }

    /// Occupied slots.
    #[must_use]
    pub fn registered_layers(&self) -> LayerSet {
        self.order.iter().copied().collect()
    }

    /// Number of registered layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.order.len()
    }

    /// Borrow a registered layer.
    #[must_use]
    pub fn layer(&self, layer_type: RenderLayerType) -> Option<&dyn Layer> {
        self.slots[layer_type.index()].as_deref()
    }

    /// Mutably borrow a registered layer.
    pub fn layer_mut(&mut self, layer_type: RenderLayerType) -> Option<&mut (dyn Layer + 'static)> {
        self.slots[layer_type.index()].as_deref_mut()
    }

    /// Registered layers whose `needs_update` flag is set.
    #[must_use]
    pub fn layers_needing_update(&self) -> LayerSet {
        self.order
            .iter()
            .copied()
            .filter(|t| self.slots[t.index()].as_ref().is_some_and(|l| l.needs_update()))
            .collect()
    }

    // =========================================================================
    // SCHEDULING
    // =========================================================================

    /// Queues a frame for `layers`.
    ///
    /// # Panics
    ///
    /// If any layer in the set is not registered.
    pub fn schedule_frame(&mut self, layers: LayerSet, priority: Priority) -> ScheduleOutcome {
        self.schedule_frame_with(layers, priority, FrameMetadata::default())
    }

    /// [`schedule_frame`](Self::schedule_frame) with source and region.
    ///
    /// # Panics
    ///
    /// If any layer in the set is not registered.
    pub fn schedule_frame_with(
        &mut self,
        layers: LayerSet,
        priority: Priority,
        metadata: FrameMetadata,
    ) -> ScheduleOutcome {
        for layer in layers.iter() {
            assert!(
                self.is_registered(layer),
                "frame scheduled for unregistered layer `{}`",
                layer.name()
            );
        }
        if self.disposed {
            return ScheduleOutcome::Rejected;
        }
        let now = self.clock.now();
        self.scheduler.schedule_frame(layers, priority, now, metadata)
    }

    /// Queues a frame for every layer whose `needs_update` flag is set.
    pub fn schedule_updates(&mut self, priority: Priority) -> ScheduleOutcome {
        let layers = self.layers_needing_update();
        self.schedule_frame(layers, priority)
    }

    /// Renders every layer flagged `needs_update` right now, bypassing the
    /// queue and the budget. Returns the layers rendered.
    pub fn force_frame(&mut self) -> LayerSet {
        if self.disposed {
            return LayerSet::EMPTY;
        }
        let layers = self.layers_needing_update();
        if layers.is_empty() {
            return layers;
        }
        self.frame_index += 1;
        let start = self.clock.now();
        let dirty = self.hand_out_dirty(layers);
        let rendered = {
            let Self {
                coords,
                scheduler,
                adapter,
                metrics,
                slots,
                clock,
                sink,
                frame_index,
                ..
            } = self;
            let quality = adapter.current_quality();
            let coords = &*coords;
            scheduler.force_frame(layers, |layer| {
                let ctx = frame_context(*frame_index, quality, coords, &dirty[layer.index()]);
                render_layer(slots, &**clock, &**sink, metrics, &ctx, layer)
            })
        };
        self.finish_frame(start);
        rendered
    }

    // =========================================================================
    // FRAME LOOP
    // =========================================================================

    /// Runs one frame: pumps broadcasts, drains the queue within budget,
    /// records metrics and, once per reporting interval, updates quality.
    ///
    /// Returns `None` once disposed.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.disposed {
            return None;
        }
        let messages_delivered = self.pump_messages();

        self.frame_index += 1;
        let start = self.clock.now();

        let pending = self.scheduler.pending_layers();
        let dirty = self.hand_out_dirty(pending);

        let drain = {
            let Self {
                coords,
                scheduler,
                adapter,
                metrics,
                slots,
                clock,
                sink,
                frame_index,
                ..
            } = self;
            let quality = adapter.current_quality();
            let coords = &*coords;
            scheduler.drain(*frame_index, |layer| {
                let ctx = frame_context(*frame_index, quality, coords, &dirty[layer.index()]);
                render_layer(slots, &**clock, &**sink, metrics, &ctx, layer)
            })
        };

        // Deferred layers keep what they were handed for their next frame.
        for layer in pending.difference(drain.rendered).iter() {
            let unseen = &mut self.unseen[layer.index()];
            for region in &dirty[layer.index()] {
                unseen.mark_dirty(region.rect);
            }
        }
        if drain.budget.over_budget {
            tracing::warn!(
                frame = self.frame_index,
                spent_us = drain.budget.spent.as_micros(),
                target_us = drain.budget.target.as_micros(),
                "frame over budget"
            );
        }

        let (frame_time, dropped) = self.finish_frame(start);
        let quality_change = self.maybe_report();

        Some(TickReport {
            frame_index: self.frame_index,
            rendered: drain.rendered,
            frame_time,
            dropped,
            pending: drain.pending,
            messages_delivered,
            quality_change,
        })
    }

    fn finish_frame(&mut self, start: Duration) -> (Duration, bool) {
        let frame_time = self.clock.now().saturating_sub(start);
        let dropped = frame_time > self.config.dropped_frame_threshold();
        self.metrics.record_frame(frame_time, dropped);
        if dropped {
            self.adapter.handle_dropped_frame();
        }
        self.sink.frame(self.frame_index, frame_time, dropped);
        (frame_time, dropped)
    }

    fn maybe_report(&mut self) -> Option<QualityChange> {
        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.last_report);
        if elapsed < self.config.reporting_interval() {
            return None;
        }
        self.last_report = now;
        let sample = self.metrics.take_interval(elapsed);
        let change = if sample.frames > 0 {
            self.adapter
                .update_metrics(sample.fps, sample.dropped_frames, sample.avg_frame_time, now)
        } else {
            None
        };
        if let Some(change) = change {
            self.apply_quality_change(change);
        }
        self.sink.report(&self.performance_snapshot());
        change
    }

    // =========================================================================
    // QUALITY
    // =========================================================================

    /// Host-side report of a frame the platform dropped (missed vsync).
    pub fn handle_dropped_frame(&mut self) {
        self.adapter.handle_dropped_frame();
    }

    /// Forces a quality level. Layers are updated before this returns.
    pub fn set_quality(&mut self, level: QualityLevel) -> Option<QualityChange> {
        let now = self.clock.now();
        let change = self.adapter.set_quality(level, now)?;
        self.apply_quality_change(change);
        Some(change)
    }

    /// Active quality level.
    #[must_use]
    pub fn current_quality(&self) -> QualityLevel {
        self.adapter.current_quality()
    }

    fn apply_quality_change(&mut self, change: QualityChange) {
        tracing::info!(
            from = change.from.name(),
            to = change.to.name(),
            reason = ?change.reason,
            "quality changed"
        );
        for &layer_type in &self.order {
            if let Some(layer) = self.slots[layer_type.index()].as_mut() {
                layer.update_quality(change.to);
                layer.mark_needs_update();
            }
        }
        self.sink.quality_changed(change);
        self.broadcast(MessageKind::QualityChanged, MessagePayload::Quality(change.to));
        let all = self.registered_layers();
        self.schedule_frame_with(all, Priority::Normal, FrameMetadata::from_source("quality"));
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    /// Replaces the coordinate config. Marks the whole surface dirty, flags
    /// every layer and queues a high-priority frame.
    pub fn set_coordinate_config(&mut self, config: CoordinateSystemConfig) {
        tracing::info!(
            screen_w = config.screen_size().width,
            screen_h = config.screen_size().height,
            dpr = config.device_pixel_ratio(),
            zoom = config.zoom(),
            "coordinate config replaced"
        );
        self.dirty.set_surface(config.canvas_size());
        self.coords.set_config(config);
        for layer_type in RenderLayerType::ALL {
            self.unseen[layer_type.index()] = self.empty_tracker();
        }
        for &layer_type in &self.order {
            if let Some(layer) = self.slots[layer_type.index()].as_mut() {
                layer.mark_needs_update();
            }
        }
        let all = self.registered_layers();
        self.schedule_frame_with(all, Priority::High, FrameMetadata::from_source("viewport"));
        self.broadcast(MessageKind::ViewportChanged, MessagePayload::None);
    }

    /// Current coordinate mapping.
    #[must_use]
    pub fn coordinates(&self) -> &CoordinateSystem {
        &self.coords
    }

    /// Invalidates a canvas rectangle for the next rendered frame.
    pub fn mark_dirty(&mut self, rect: Rect) {
        self.dirty.mark_dirty(rect);
    }

    /// Moves fresh invalidation to every layer in `layers` and returns, per
    /// layer, everything it has not drawn yet. Without a recipient the
    /// regions stay in the shared tracker.
    fn hand_out_dirty(&mut self, layers: LayerSet) -> [Vec<DirtyRegion>; LAYER_TYPE_COUNT] {
        let mut out: [Vec<DirtyRegion>; LAYER_TYPE_COUNT] = std::array::from_fn(|_| Vec::new());
        if layers.is_empty() {
            return out;
        }
        let fresh = self.dirty.consume_dirty_regions();
        for layer in layers.iter() {
            let unseen = &mut self.unseen[layer.index()];
            for region in &fresh {
                unseen.mark_dirty(region.rect);
            }
            out[layer.index()] = unseen.consume_dirty_regions();
        }
        out
    }

    fn empty_tracker(&self) -> DirtyRegionTracker {
        DirtyRegionTracker::new(self.dirty.surface(), self.config.max_dirty_regions)
    }

    /// Dirty-region state.
    #[must_use]
    pub fn dirty_regions(&self) -> &DirtyRegionTracker {
        &self.dirty
    }

    // =========================================================================
    // MESSAGES
    // =========================================================================

    /// Sends a message.
    ///
    /// Directed messages are delivered synchronously to their recipient;
    /// broadcasts are queued and delivered on the next pump in registration
    /// order.
    pub fn send_message(&mut self, message: LayerMessage) -> Delivery {
        if self.disposed {
            return Delivery::Dropped;
        }
        match message.recipient {
            Some(recipient) => self.deliver_directed(recipient, &message),
            None => {
                if self.poster.post(message) {
                    Delivery::Queued
                } else {
                    Delivery::Dropped
                }
            }
        }
    }

    /// Delivers every queued message. Returns how many were taken off the bus.
    pub fn pump_messages(&mut self) -> usize {
        let messages = self.bus.drain();
        for message in &messages {
            match message.recipient {
                Some(recipient) => {
                    self.deliver_directed(recipient, message);
                }
                None => {
                    for &layer_type in &self.order {
                        if let Some(layer) = self.slots[layer_type.index()].as_mut() {
                            layer.handle_message(message);
                        }
                    }
                }
            }
        }
        messages.len()
    }

    /// Cloneable handle for posting from other contexts.
    #[must_use]
    pub fn poster(&self) -> MessagePoster {
        self.bus.poster()
    }

    fn deliver_directed(&mut self, recipient: RenderLayerType, message: &LayerMessage) -> Delivery {
        if let Some(layer) = self.slots[recipient.index()].as_mut() {
            layer.handle_message(message);
            Delivery::Delivered(recipient)
        } else {
            tracing::warn!(
                recipient = recipient.name(),
                kind = ?message.kind,
                "dropping message for unregistered layer"
            );
            Delivery::Dropped
        }
    }

    fn broadcast(&self, kind: MessageKind, payload: MessagePayload) {
        self.poster
            .post(LayerMessage::broadcast(kind, MessageOrigin::Host, payload));
    }

    // =========================================================================
    // INTROSPECTION & LIFECYCLE
    // =========================================================================

    /// Aggregated performance view.
    #[must_use]
    pub fn performance_snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            fps: self.metrics.fps(),
            dropped_frames: self.metrics.dropped_frames(),
            average_frame_time: self.metrics.average_frame_time(),
            worst_frame_time: self.metrics.worst_frame_time(),
            quality: self.adapter.current_quality(),
            layer_count: self.order.len(),
            frames_rendered: self.metrics.total_frames(),
            pending_requests: self.scheduler.pending_count(),
            layer_times: RenderLayerType::ALL.map(|l| self.metrics.average_layer_time(l)),
            dirty_regions: self.dirty.dirty_region_count(),
            dropped_messages: self.bus.dropped_count(),
        }
    }

    /// Scheduler counters.
    #[must_use]
    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Index of the last frame.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Active runtime config.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Quality controller state.
    #[must_use]
    pub fn quality_adapter(&self) -> &QualityAdapter {
        &self.adapter
    }

    /// Discards pending requests and messages and stops all further ticks.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.scheduler.clear();
        let discarded = self.bus.clear();
        tracing::info!(
            frames = self.frame_index,
            discarded_messages = discarded,
            "coordinator disposed"
        );
    }

    /// True after [`dispose`](Self::dispose).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn frame_context<'a>(
    frame_index: u64,
    quality: QualityLevel,
    coords: &'a CoordinateSystem,
    dirty: &'a [DirtyRegion],
) -> RenderContext<'a> {
    RenderContext {
        frame_index,
        quality,
        settings: quality.settings(),
        coords,
        dirty_regions: dirty,
    }
}

/// Renders one slot and times it. An empty slot costs nothing.
fn render_layer(
    slots: &mut [Option<Box<dyn Layer>>; LAYER_TYPE_COUNT],
    clock: &dyn Clock,
    sink: &dyn MetricsSink,
    metrics: &mut PerformanceMetrics,
    ctx: &RenderContext<'_>,
    layer_type: RenderLayerType,
) -> Duration {
    let Some(layer) = slots[layer_type.index()].as_mut() else {
        return Duration::ZERO;
    };
    let start = clock.now();
    layer.render(ctx);
    let elapsed = clock.now().saturating_sub(start);
    metrics.record_layer(layer_type, elapsed);
    sink.layer(layer_type, elapsed);
    elapsed
}
