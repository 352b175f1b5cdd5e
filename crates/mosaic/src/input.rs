//! Pointer routing.
//!
//! Turns device-pixel pointer events into grid and workspace positions,
//! layer messages, dirty cells and frame requests. A point the coordinate
//! system rejects is discarded, the session continues.

use mosaic_rendering::{FrameMetadata, Priority, RenderCoordinator};
use mosaic_shared::{
    CanvasPoint, GridPoint, LayerMessage, LayerSet, MessageKind, MessageOrigin, MessagePayload,
    Rect, RenderLayerType, ScreenPoint, WorkspacePoint,
};

/// Pointer phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    /// Button pressed
    Down,
    /// Pointer moved
    Move,
    /// Button released
    Up,
}

/// A pointer event in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Phase
    pub phase: PointerPhase,
    /// Position in device pixels
    pub position: ScreenPoint,
}

impl PointerEvent {
    /// Button pressed at `(x, y)`.
    #[must_use]
    pub const fn down(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Down,
            position: ScreenPoint::new(x, y),
        }
    }

    /// Pointer moved to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Move,
            position: ScreenPoint::new(x, y),
        }
    }

    /// Button released at `(x, y)`.
    #[must_use]
    pub const fn up(x: f64, y: f64) -> Self {
        Self {
            phase: PointerPhase::Up,
            position: ScreenPoint::new(x, y),
        }
    }
}

/// Where an accepted event landed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoutedInput {
    /// Phase
    pub phase: PointerPhase,
    /// Canvas position
    pub canvas: CanvasPoint,
    /// Cell under the pointer (clamped into the grid)
    pub grid: GridPoint,
    /// Workspace position
    pub workspace: WorkspacePoint,
    /// The pointer is over the canvas, not the letterbox
    pub on_canvas: bool,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    cell: GridPoint,
}

/// Pointer state machine for one pointer.
#[derive(Debug, Default)]
pub struct InputRouter {
    drag: Option<Drag>,
    discarded: u64,
    snaps: u64,
}

impl InputRouter {
    /// Idle router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one event. Returns `None` if the event was discarded.
    pub fn route(
        &mut self,
        coordinator: &mut RenderCoordinator,
        event: PointerEvent,
    ) -> Option<RoutedInput> {
        let routed = match Self::locate(coordinator, event) {
            Ok(routed) => routed,
            Err(err) => {
                self.discarded += 1;
                tracing::debug!(phase = ?event.phase, %err, "pointer event discarded");
                return None;
            }
        };

        match event.phase {
            PointerPhase::Down => self.press(coordinator, &routed),
            PointerPhase::Move => self.drag_to(coordinator, &routed),
            PointerPhase::Up => self.release(coordinator, &routed),
        }
        Some(routed)
    }

    /// A drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Events rejected by the coordinate system.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Drops that landed on a cell.
    #[must_use]
    pub fn snaps(&self) -> u64 {
        self.snaps
    }

    fn locate(
        coordinator: &RenderCoordinator,
        event: PointerEvent,
    ) -> mosaic_rendering::DomainResult<RoutedInput> {
        let coords = coordinator.coordinates();
        let canvas = coords.screen_to_canvas(event.position)?;
        Ok(RoutedInput {
            phase: event.phase,
            canvas,
            grid: coords.canvas_to_grid(canvas)?,
            workspace: coords.canvas_to_workspace(canvas)?,
            on_canvas: coords.is_valid_canvas_point(canvas),
        })
    }

    fn press(&mut self, coordinator: &mut RenderCoordinator, at: &RoutedInput) {
        if !at.on_canvas {
            return;
        }
        self.drag = Some(Drag { cell: at.grid });
        let cell = coordinator.coordinates().cell_rect(at.grid);
        send(
            coordinator,
            RenderLayerType::Dynamic,
            MessageKind::PieceDragStart,
            MessagePayload::Grid(at.grid),
        );
        invalidate(coordinator, cell, LayerSet::single(RenderLayerType::Dynamic), Priority::High);
    }

    fn drag_to(&mut self, coordinator: &mut RenderCoordinator, at: &RoutedInput) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let coords = coordinator.coordinates();
        let region = coords.cell_rect(drag.cell).union(&coords.cell_rect(at.grid));
        drag.cell = at.grid;
        send(
            coordinator,
            RenderLayerType::Dynamic,
            MessageKind::PieceDragMove,
            MessagePayload::Workspace(at.workspace),
        );
        invalidate(coordinator, region, LayerSet::single(RenderLayerType::Dynamic), Priority::High);
    }

    fn release(&mut self, coordinator: &mut RenderCoordinator, at: &RoutedInput) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let coords = coordinator.coordinates();
        let region = coords.cell_rect(drag.cell).union(&coords.cell_rect(at.grid));
        send(
            coordinator,
            RenderLayerType::Dynamic,
            MessageKind::PieceDrop,
            MessagePayload::Grid(at.grid),
        );

        if !at.on_canvas {
            let dynamic = LayerSet::single(RenderLayerType::Dynamic);
            invalidate(coordinator, region, dynamic, Priority::High);
            return;
        }

        self.snaps += 1;
        let center = coordinator.coordinates().grid_to_canvas(at.grid);
        coordinator.send_message(LayerMessage::broadcast(
            MessageKind::PieceSnapped,
            MessageOrigin::Host,
            MessagePayload::Grid(at.grid),
        ));
        send(
            coordinator,
            RenderLayerType::Effects,
            MessageKind::SpawnEffect,
            MessagePayload::Canvas(center),
        );
        // Snap feedback must land this frame; the board can wait.
        invalidate(
            coordinator,
            region,
            LayerSet::of(&[RenderLayerType::Dynamic, RenderLayerType::Effects]),
            Priority::Critical,
        );
        invalidate(coordinator, region, LayerSet::single(RenderLayerType::Static), Priority::Low);
    }
}

/// Directed message, skipped when the recipient is not registered.
fn send(
    coordinator: &mut RenderCoordinator,
    to: RenderLayerType,
    kind: MessageKind,
    payload: MessagePayload,
) {
    if coordinator.is_registered(to) {
        coordinator.send_message(LayerMessage::directed(kind, MessageOrigin::Host, to, payload));
    }
}

/// Marks `region` dirty and requests a frame for the registered part of
/// `layers`.
fn invalidate(
    coordinator: &mut RenderCoordinator,
    region: Rect,
    layers: LayerSet,
    priority: Priority,
) {
    let layers = layers.intersection(coordinator.registered_layers());
    if layers.is_empty() {
        return;
    }
    coordinator.mark_dirty(region);
    let metadata = FrameMetadata::from_source("pointer").with_region(region);
    coordinator.schedule_frame_with(layers, priority, metadata);
}

#[cfg(test)]
mod tests {
    use mosaic_rendering::{CoordinateSystemConfig, Layer, RenderContext};
    use mosaic_shared::{QualityLevel, Size};

    use super::*;

    #[derive(Default)]
    struct Inbox {
        kinds: Vec<MessageKind>,
        dirty: bool,
    }

    impl Layer for Inbox {
        fn render(&mut self, _ctx: &RenderContext<'_>) {
            self.dirty = false;
        }

        fn handle_message(&mut self, message: &LayerMessage) {
            self.kinds.push(message.kind);
        }

        fn update_quality(&mut self, _level: QualityLevel) {}

        fn needs_update(&self) -> bool {
            self.dirty
        }

        fn mark_needs_update(&mut self) {
            self.dirty = true;
        }
    }

    fn coordinator() -> RenderCoordinator {
        let config =
            CoordinateSystemConfig::new(Size::new(800.0, 600.0), Size::new(400.0, 300.0), 10, 8)
                .unwrap();
        RenderCoordinator::builder(config)
            .layer(RenderLayerType::Dynamic, Inbox::default())
            .build()
            .unwrap()
    }

    #[test]
    fn test_press_outside_canvas_does_nothing() {
        let mut coordinator = coordinator();
        let mut router = InputRouter::new();
        // The canvas fills the 800x600 screen at scale 2: no letterbox, so
        // press past the left edge.
        let routed = router
            .route(&mut coordinator, PointerEvent::down(-10.0, 50.0))
            .unwrap();
        assert!(!routed.on_canvas);
        assert_eq!(routed.grid, GridPoint::new(0, 0));
        assert!(!router.is_dragging());
        assert_eq!(coordinator.performance_snapshot().pending_requests, 0);
    }

    #[test]
    fn test_non_finite_event_is_discarded() {
        let mut coordinator = coordinator();
        let mut router = InputRouter::new();
        assert!(router
            .route(&mut coordinator, PointerEvent::down(f64::NAN, 1.0))
            .is_none());
        assert_eq!(router.discarded(), 1);
    }

    #[test]
    fn test_drag_coalesces_into_one_request() {
        let mut coordinator = coordinator();
        let mut router = InputRouter::new();
        router.route(&mut coordinator, PointerEvent::down(200.0, 150.0));
        for i in 0..10 {
            let x = 200.0 + f64::from(i) * 8.0;
            router.route(&mut coordinator, PointerEvent::moved(x, 150.0));
        }
        assert!(router.is_dragging());
        assert_eq!(coordinator.performance_snapshot().pending_requests, 1);
        assert_eq!(coordinator.scheduler_stats().coalesced, 10);
    }

    #[test]
    fn test_drop_without_effects_layer_skips_effects() {
        let mut coordinator = coordinator();
        let mut router = InputRouter::new();
        router.route(&mut coordinator, PointerEvent::down(200.0, 150.0));
        let routed = router
            .route(&mut coordinator, PointerEvent::up(420.0, 310.0))
            .unwrap();
        // (420, 310) device px -> canvas (210, 155) -> cell (5, 4).
        assert_eq!(routed.grid, GridPoint::new(5, 4));
        assert_eq!(router.snaps(), 1);
        assert!(!router.is_dragging());
    }
}
