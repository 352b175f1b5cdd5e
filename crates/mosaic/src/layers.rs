//! Simulated canvas layers.
//!
//! No pixels are produced. Each layer does the bookkeeping a real renderer
//! would (which cells, how many pieces, how many particles) and spends time
//! on a [`ManualClock`] proportional to that work and to the quality level.

use std::time::Duration;

use mosaic_rendering::{Layer, ManualClock, RenderContext};
use mosaic_shared::{
    CanvasPoint, GridPoint, LayerMessage, MessageKind, MessagePayload, QualityLevel,
    QualitySettings, WorkspacePoint,
};

/// Frames a spawned burst stays alive.
pub const BURST_FRAMES: u32 = 30;

/// Particles one burst emits at most.
pub const PARTICLES_PER_BURST: u32 = 120;

/// Linear render-cost model: `base + per_item × items`, scaled by the
/// render-target area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostModel {
    /// Fixed cost per render
    pub base: Duration,
    /// Cost per drawn item
    pub per_item: Duration,
}

impl CostModel {
    /// Creates a cost model.
    #[must_use]
    pub const fn new(base: Duration, per_item: Duration) -> Self {
        Self { base, per_item }
    }

    /// Cost of drawing `items` at `resolution_scale`.
    #[must_use]
    pub fn cost(&self, items: u32, resolution_scale: f64) -> Duration {
        let area = resolution_scale * resolution_scale;
        (self.base + self.per_item * items).mul_f64(area.max(0.0))
    }
}

/// Spends simulated render time.
#[derive(Clone, Debug)]
pub struct SimulatedWork {
    clock: ManualClock,
    model: CostModel,
}

impl SimulatedWork {
    /// Work charged to `clock`.
    #[must_use]
    pub fn new(clock: ManualClock, model: CostModel) -> Self {
        Self { clock, model }
    }

    /// Advances the clock by the cost of `items`, returns the cost.
    pub fn spend(&self, items: u32, settings: &QualitySettings) -> Duration {
        let cost = self.model.cost(items, settings.resolution_scale);
        self.clock.advance(cost);
        cost
    }
}

fn cell_index(g: GridPoint, cols: u32, rows: u32) -> Option<usize> {
    let x = u32::try_from(g.x).ok().filter(|&x| x < cols)?;
    let y = u32::try_from(g.y).ok().filter(|&y| y < rows)?;
    usize::try_from(y * cols + x).ok()
}

// =============================================================================
// STATIC: BOARD
// =============================================================================

/// The puzzle board: grid lines and filled cells.
///
/// Redraws only the cells under the frame's dirty regions, or everything
/// when the frame carries none.
#[derive(Debug)]
pub struct BoardLayer {
    work: SimulatedWork,
    cols: u32,
    rows: u32,
    filled: Vec<bool>,
    quality: QualityLevel,
    needs_update: bool,
    renders: u64,
    last_cells_drawn: u32,
}

impl BoardLayer {
    /// Empty `cols × rows` board.
    #[must_use]
    pub fn new(work: SimulatedWork, cols: u32, rows: u32) -> Self {
        Self {
            work,
            cols,
            rows,
            filled: vec![false; (cols * rows) as usize],
            quality: QualityLevel::High,
            needs_update: false,
            renders: 0,
            last_cells_drawn: 0,
        }
    }

    /// Filled cell count.
    #[must_use]
    pub fn filled_cells(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    /// True if the cell holds a snapped piece.
    #[must_use]
    pub fn is_filled(&self, g: GridPoint) -> bool {
        cell_index(g, self.cols, self.rows).is_some_and(|i| self.filled[i])
    }

    /// Quality level last applied.
    #[must_use]
    pub fn quality(&self) -> QualityLevel {
        self.quality
    }

    /// Render count.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Cells redrawn by the last render.
    #[must_use]
    pub fn last_cells_drawn(&self) -> u32 {
        self.last_cells_drawn
    }
}

impl Layer for BoardLayer {
    fn render(&mut self, ctx: &RenderContext<'_>) {
        let cells = if ctx.dirty_regions.is_empty() {
            self.cols * self.rows
        } else {
            let mut drawn = 0;
            for y in 0..self.rows {
                for x in 0..self.cols {
                    #[allow(clippy::cast_possible_wrap)]
                    let rect = ctx.coords.cell_rect(GridPoint::new(x as i32, y as i32));
                    if ctx.dirty_regions.iter().any(|r| r.rect.intersects(&rect)) {
                        drawn += 1;
                    }
                }
            }
            drawn
        };
        self.work.spend(cells, &ctx.settings);
        self.last_cells_drawn = cells;
        self.renders += 1;
        self.needs_update = false;
    }

    fn handle_message(&mut self, message: &LayerMessage) {
        if let (MessageKind::PieceSnapped, MessagePayload::Grid(g)) = (message.kind, &message.payload) {
            if let Some(i) = cell_index(*g, self.cols, self.rows) {
                self.filled[i] = true;
                self.needs_update = true;
            }
        }
    }

    fn update_quality(&mut self, level: QualityLevel) {
        self.quality = level;
    }

    fn needs_update(&self) -> bool {
        self.needs_update
    }

    fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }
}

// =============================================================================
// DYNAMIC: PIECES
// =============================================================================

/// Loose pieces and the piece under the pointer.
#[derive(Debug)]
pub struct PiecesLayer {
    work: SimulatedWork,
    total: u32,
    placed: u32,
    held: Option<WorkspacePoint>,
    settings: QualitySettings,
    needs_update: bool,
    renders: u64,
}

impl PiecesLayer {
    /// Layer with `total` loose pieces.
    #[must_use]
    pub fn new(work: SimulatedWork, total: u32) -> Self {
        Self {
            work,
            total,
            placed: 0,
            held: None,
            settings: QualityLevel::High.settings(),
            needs_update: false,
            renders: 0,
        }
    }

    /// Pieces not yet snapped.
    #[must_use]
    pub fn loose(&self) -> u32 {
        self.total - self.placed
    }

    /// Workspace position of the held piece.
    #[must_use]
    pub fn held(&self) -> Option<WorkspacePoint> {
        self.held
    }

    /// Render count.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.renders
    }
}

impl Layer for PiecesLayer {
    fn render(&mut self, ctx: &RenderContext<'_>) {
        let mut items = self.loose();
        if self.settings.shadows {
            items *= 2;
        }
        if self.held.is_some() && self.settings.trails {
            items += 8;
        }
        self.work.spend(items, &ctx.settings);
        self.renders += 1;
        self.needs_update = false;
    }

    fn handle_message(&mut self, message: &LayerMessage) {
        match (message.kind, &message.payload) {
            (MessageKind::PieceDragStart, _) => {
                self.held = Some(WorkspacePoint::ORIGIN);
            }
            (MessageKind::PieceDragMove, MessagePayload::Workspace(p)) => {
                self.held = Some(*p);
            }
            (MessageKind::PieceDrop, _) => {
                self.held = None;
            }
            (MessageKind::PieceSnapped, _) => {
                self.placed = (self.placed + 1).min(self.total);
            }
            _ => return,
        }
        self.needs_update = true;
    }

    fn update_quality(&mut self, level: QualityLevel) {
        self.settings = level.settings();
    }

    fn needs_update(&self) -> bool {
        self.needs_update
    }

    fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }
}

// =============================================================================
// EFFECTS: PARTICLES
// =============================================================================

#[derive(Clone, Copy, Debug)]
struct Burst {
    at: CanvasPoint,
    frames_left: u32,
}

/// Particle bursts. Stays flagged while any burst is alive, so the host
/// keeps scheduling it until the animation ends.
#[derive(Debug)]
pub struct EffectsLayer {
    work: SimulatedWork,
    bursts: Vec<Burst>,
    settings: QualitySettings,
    needs_update: bool,
    renders: u64,
    particles_drawn: u64,
}

impl EffectsLayer {
    /// Idle effects layer.
    #[must_use]
    pub fn new(work: SimulatedWork) -> Self {
        Self {
            work,
            bursts: Vec::new(),
            settings: QualityLevel::High.settings(),
            needs_update: false,
            renders: 0,
            particles_drawn: 0,
        }
    }

    /// Live bursts.
    #[must_use]
    pub fn active_bursts(&self) -> usize {
        self.bursts.len()
    }

    /// Canvas origins of the live bursts.
    pub fn burst_origins(&self) -> impl Iterator<Item = CanvasPoint> + '_ {
        self.bursts.iter().map(|b| b.at)
    }

    /// Particles drawn since construction.
    #[must_use]
    pub fn particles_drawn(&self) -> u64 {
        self.particles_drawn
    }

    /// Render count.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.renders
    }

    fn live_particles(&self) -> u32 {
        let per_burst = PARTICLES_PER_BURST.min(self.settings.max_particles);
        let total = u32::try_from(self.bursts.len()).unwrap_or(u32::MAX).saturating_mul(per_burst);
        total.min(self.settings.max_particles)
    }
}

impl Layer for EffectsLayer {
    fn render(&mut self, ctx: &RenderContext<'_>) {
        let particles = self.live_particles();
        let glow = if self.settings.glow { particles / 4 } else { 0 };
        self.work.spend(particles + glow, &ctx.settings);
        self.particles_drawn += u64::from(particles);
        self.renders += 1;

        for burst in &mut self.bursts {
            burst.frames_left = burst.frames_left.saturating_sub(1);
        }
        self.bursts.retain(|b| b.frames_left > 0);
        self.needs_update = !self.bursts.is_empty();
    }

    fn handle_message(&mut self, message: &LayerMessage) {
        if let (MessageKind::SpawnEffect, MessagePayload::Canvas(at)) = (message.kind, &message.payload) {
            if self.settings.particles {
                self.bursts.push(Burst {
                    at: *at,
                    frames_left: BURST_FRAMES,
                });
                self.needs_update = true;
            }
        }
    }

    fn update_quality(&mut self, level: QualityLevel) {
        self.settings = level.settings();
        if !self.settings.particles {
            self.bursts.clear();
        }
    }

    fn needs_update(&self) -> bool {
        self.needs_update
    }

    fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }
}

#[cfg(test)]
mod tests {
    use mosaic_rendering::{Clock, CoordinateSystem, CoordinateSystemConfig, DirtyRegion};
    use mosaic_shared::{MessageOrigin, Rect, RenderLayerType, Size};

    use super::*;

    const US: Duration = Duration::from_micros(1);

    fn coords() -> CoordinateSystem {
        CoordinateSystem::new(
            CoordinateSystemConfig::new(Size::new(800.0, 600.0), Size::new(400.0, 300.0), 10, 8)
                .unwrap(),
        )
    }

    fn ctx<'a>(
        coords: &'a CoordinateSystem,
        dirty: &'a [DirtyRegion],
        level: QualityLevel,
    ) -> RenderContext<'a> {
        RenderContext {
            frame_index: 1,
            quality: level,
            settings: level.settings(),
            coords,
            dirty_regions: dirty,
        }
    }

    fn work(clock: &ManualClock) -> SimulatedWork {
        SimulatedWork::new(clock.clone(), CostModel::new(Duration::ZERO, US))
    }

    fn snapped(g: GridPoint) -> LayerMessage {
        LayerMessage::broadcast(MessageKind::PieceSnapped, MessageOrigin::Host, MessagePayload::Grid(g))
    }

    #[test]
    fn test_cost_scales_with_area() {
        let model = CostModel::new(Duration::from_micros(100), Duration::from_micros(10));
        assert_eq!(model.cost(10, 1.0), Duration::from_micros(200));
        assert_eq!(model.cost(10, 0.5), Duration::from_micros(50));
    }

    #[test]
    fn test_board_redraws_only_dirty_cells() {
        let clock = ManualClock::new();
        let coords = coords();
        let mut board = BoardLayer::new(work(&clock), 10, 8);

        board.render(&ctx(&coords, &[], QualityLevel::High));
        assert_eq!(board.last_cells_drawn(), 80);

        // Strictly inside cell (2, 2): 40 x 37.5 cells.
        let dirty = [DirtyRegion {
            rect: Rect::new(85.0, 80.0, 10.0, 10.0),
            generation: 0,
        }];
        board.render(&ctx(&coords, &dirty, QualityLevel::High));
        assert_eq!(board.last_cells_drawn(), 1);
        assert_eq!(clock.now(), Duration::from_micros(81));
    }

    #[test]
    fn test_board_fills_snapped_cells() {
        let clock = ManualClock::new();
        let mut board = BoardLayer::new(work(&clock), 10, 8);
        board.handle_message(&snapped(GridPoint::new(3, 4)));
        board.handle_message(&snapped(GridPoint::new(30, 4)));
        assert!(board.is_filled(GridPoint::new(3, 4)));
        assert_eq!(board.filled_cells(), 1);
        assert!(board.needs_update());
    }

    #[test]
    fn test_pieces_track_drag() {
        let clock = ManualClock::new();
        let mut pieces = PiecesLayer::new(work(&clock), 80);
        let to = |kind, payload| LayerMessage::directed(kind, MessageOrigin::Host, RenderLayerType::Dynamic, payload);

        pieces.handle_message(&to(MessageKind::PieceDragStart, MessagePayload::None));
        let p = WorkspacePoint::new(12.0, 34.0);
        pieces.handle_message(&to(MessageKind::PieceDragMove, MessagePayload::Workspace(p)));
        assert_eq!(pieces.held(), Some(p));
        pieces.handle_message(&to(MessageKind::PieceDrop, MessagePayload::None));
        pieces.handle_message(&snapped(GridPoint::new(0, 0)));
        assert_eq!(pieces.held(), None);
        assert_eq!(pieces.loose(), 79);
    }

    #[test]
    fn test_effects_burst_lifetime() {
        let clock = ManualClock::new();
        let coords = coords();
        let mut effects = EffectsLayer::new(work(&clock));
        effects.handle_message(&LayerMessage::directed(
            MessageKind::SpawnEffect,
            MessageOrigin::Host,
            RenderLayerType::Effects,
            MessagePayload::Canvas(CanvasPoint::new(10.0, 10.0)),
        ));
        assert_eq!(effects.active_bursts(), 1);
        assert_eq!(effects.burst_origins().next(), Some(CanvasPoint::new(10.0, 10.0)));

        let mut frames = 0;
        while effects.needs_update() {
            effects.render(&ctx(&coords, &[], QualityLevel::High));
            frames += 1;
        }
        assert_eq!(frames, BURST_FRAMES);
        assert_eq!(effects.particles_drawn(), u64::from(BURST_FRAMES * PARTICLES_PER_BURST));
    }

    #[test]
    fn test_low_quality_disables_particles() {
        let clock = ManualClock::new();
        let mut effects = EffectsLayer::new(work(&clock));
        let spawn = LayerMessage::directed(
            MessageKind::SpawnEffect,
            MessageOrigin::Host,
            RenderLayerType::Effects,
            MessagePayload::Canvas(CanvasPoint::ORIGIN),
        );
        effects.handle_message(&spawn);
        effects.update_quality(QualityLevel::Low);
        assert_eq!(effects.active_bursts(), 0);
        effects.handle_message(&spawn);
        assert_eq!(effects.active_bursts(), 0);
    }
}
