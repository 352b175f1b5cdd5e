//! Named transforms between the four coordinate spaces.

use std::cell::OnceCell;

use mosaic_shared::{CanvasPoint, GridPoint, Rect, ScreenPoint, Size, Vec2, WorkspacePoint};

use super::config::CoordinateSystemConfig;
use super::transform::Transforms;
use crate::error::{CoordinateSpace, DomainError, DomainResult};

macro_rules! finite {
    ($space:expr, $p:expr) => {
        if !$p.is_finite() {
            return Err(DomainError::NonFiniteCoordinate {
                space: $space,
                x: $p.x,
                y: $p.y,
            });
        }
    };
}

/// Transforms between screen, canvas, grid and workspace space.
///
/// Stateless per config: the only state is a lazily built transform cache,
/// dropped whenever [`set_config`](Self::set_config) replaces the snapshot.
/// Every transform taking a float point rejects NaN and infinity with a
/// [`DomainError`].
#[derive(Debug)]
pub struct CoordinateSystem {
    config: CoordinateSystemConfig,
    cache: OnceCell<Transforms>,
}

impl CoordinateSystem {
    /// Creates a coordinate system over a validated config.
    #[must_use]
    pub fn new(config: CoordinateSystemConfig) -> Self {
        Self {
            config,
            cache: OnceCell::new(),
        }
    }

    /// Current config snapshot.
    #[must_use]
    pub fn config(&self) -> &CoordinateSystemConfig {
        &self.config
    }

    /// Replaces the config snapshot and invalidates cached transforms.
    pub fn set_config(&mut self, config: CoordinateSystemConfig) {
        self.config = config;
        self.cache = OnceCell::new();
    }

    #[inline]
    fn transforms(&self) -> &Transforms {
        self.cache.get_or_init(|| Transforms::build(&self.config))
    }

    // =========================================================================
    // SCREEN <-> CANVAS
    // =========================================================================

    /// Device-pixel input position to logical canvas position.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn screen_to_canvas(&self, p: ScreenPoint) -> DomainResult<CanvasPoint> {
        finite!(CoordinateSpace::Screen, p);
        let (x, y) = self.transforms().canvas_to_screen.unapply(p.x, p.y);
        Ok(CanvasPoint::new(x, y))
    }

    /// Logical canvas position to device pixels.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn canvas_to_screen(&self, p: CanvasPoint) -> DomainResult<ScreenPoint> {
        finite!(CoordinateSpace::Canvas, p);
        let (x, y) = self.transforms().canvas_to_screen.apply(p.x, p.y);
        Ok(ScreenPoint::new(x, y))
    }

    // =========================================================================
    // CANVAS <-> GRID
    // =========================================================================

    /// Cell containing `p`, clamped into the grid.
    ///
    /// Out-of-range input snaps to the nearest edge cell, so the result is
    /// always a valid cell.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    #[allow(clippy::cast_possible_truncation)]
    pub fn canvas_to_grid(&self, p: CanvasPoint) -> DomainResult<GridPoint> {
        finite!(CoordinateSpace::Canvas, p);
        let cell = self.transforms().cell;
        let max_col = f64::from(self.config.grid_cols() - 1);
        let max_row = f64::from(self.config.grid_rows() - 1);
        let col = (p.x / cell.width).floor().clamp(0.0, max_col);
        let row = (p.y / cell.height).floor().clamp(0.0, max_row);
        Ok(GridPoint::new(col as i32, row as i32))
    }

    /// Center of the cell at `g`.
    #[must_use]
    pub fn grid_to_canvas(&self, g: GridPoint) -> CanvasPoint {
        let cell = self.transforms().cell;
        CanvasPoint::new(
            (f64::from(g.x) + 0.5) * cell.width,
            (f64::from(g.y) + 0.5) * cell.height,
        )
    }

    // =========================================================================
    // CANVAS <-> WORKSPACE
    // =========================================================================

    /// Applies zoom, then pan.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn canvas_to_workspace(&self, p: CanvasPoint) -> DomainResult<WorkspacePoint> {
        finite!(CoordinateSpace::Canvas, p);
        let (x, y) = self.transforms().canvas_to_workspace.apply(p.x, p.y);
        Ok(WorkspacePoint::new(x, y))
    }

    /// Removes pan, then zoom.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn workspace_to_canvas(&self, p: WorkspacePoint) -> DomainResult<CanvasPoint> {
        finite!(CoordinateSpace::Workspace, p);
        let (x, y) = self.transforms().canvas_to_workspace.unapply(p.x, p.y);
        Ok(CanvasPoint::new(x, y))
    }

    // =========================================================================
    // COMPOSITES
    // =========================================================================

    /// Screen to grid via canvas.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn screen_to_grid(&self, p: ScreenPoint) -> DomainResult<GridPoint> {
        self.canvas_to_grid(self.screen_to_canvas(p)?)
    }

    /// Center of a cell in device pixels.
    #[must_use]
    pub fn grid_to_screen(&self, g: GridPoint) -> ScreenPoint {
        let c = self.grid_to_canvas(g);
        let (x, y) = self.transforms().canvas_to_screen.apply(c.x, c.y);
        ScreenPoint::new(x, y)
    }

    /// Screen to workspace via canvas.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn screen_to_workspace(&self, p: ScreenPoint) -> DomainResult<WorkspacePoint> {
        self.canvas_to_workspace(self.screen_to_canvas(p)?)
    }

    /// Workspace to screen via canvas.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn workspace_to_screen(&self, p: WorkspacePoint) -> DomainResult<ScreenPoint> {
        self.canvas_to_screen(self.workspace_to_canvas(p)?)
    }

    // =========================================================================
    // PREDICATES & GEOMETRY
    // =========================================================================

    /// True if `g` names a cell inside the grid.
    #[must_use]
    pub fn is_valid_grid_point(&self, g: GridPoint) -> bool {
        u32::try_from(g.x).is_ok_and(|x| x < self.config.grid_cols())
            && u32::try_from(g.y).is_ok_and(|y| y < self.config.grid_rows())
    }

    /// True if `p` is finite and on the canvas (edges included).
    #[must_use]
    pub fn is_valid_canvas_point(&self, p: CanvasPoint) -> bool {
        let size = self.config.canvas_size();
        p.is_finite() && (0.0..=size.width).contains(&p.x) && (0.0..=size.height).contains(&p.y)
    }

    /// True if `p` is finite and inside the workspace bounds (edges included).
    #[must_use]
    pub fn is_valid_workspace_point(&self, p: WorkspacePoint) -> bool {
        let b = self.config.workspace_bounds();
        p.is_finite() && (b.x..=b.right()).contains(&p.x) && (b.y..=b.bottom()).contains(&p.y)
    }

    /// Pulls `p` back inside the workspace bounds.
    ///
    /// # Errors
    ///
    /// [`DomainError`] if the point is not finite.
    pub fn clamp_to_workspace(&self, p: WorkspacePoint) -> DomainResult<WorkspacePoint> {
        finite!(CoordinateSpace::Workspace, p);
        let b = self.config.workspace_bounds();
        Ok(WorkspacePoint::new(
            p.x.clamp(b.x, b.right()),
            p.y.clamp(b.y, b.bottom()),
        ))
    }

    /// Size of one grid cell in canvas units.
    #[must_use]
    pub fn cell_size(&self) -> Size {
        self.transforms().cell
    }

    /// Canvas rectangle covered by cell `g`.
    #[must_use]
    pub fn cell_rect(&self, g: GridPoint) -> Rect {
        let cell = self.transforms().cell;
        Rect::new(
            f64::from(g.x) * cell.width,
            f64::from(g.y) * cell.height,
            cell.width,
            cell.height,
        )
    }

    /// The whole canvas as a rectangle.
    #[must_use]
    pub fn canvas_rect(&self) -> Rect {
        Rect::from_size(self.config.canvas_size())
    }

    /// Device pixels per canvas unit, per axis.
    #[must_use]
    pub fn effective_scale(&self) -> Vec2 {
        let t = &self.transforms().canvas_to_screen;
        Vec2::new(t.sx, t.sy)
    }
}
