//! Immutable geometry snapshot supplied by the host.

use mosaic_shared::{Rect, Size, Vec2};

use crate::error::{ConfigError, ConfigResult};

/// How the canvas is fitted into the screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FitMode {
    /// Uniform scale, canvas centered with letterboxing.
    #[default]
    Contain,
    /// Independent per-axis scale filling the whole screen.
    Stretch,
}

/// Snapshot of the host surface geometry.
///
/// Never mutated in place: every `with_*` call validates and returns a new
/// snapshot, and the coordinate system drops its cached transforms when the
/// snapshot is replaced.
///
/// Screen size is in logical pixels; screen points are in device pixels
/// (logical × `device_pixel_ratio`).
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateSystemConfig {
    device_pixel_ratio: f64,
    screen_size: Size,
    canvas_size: Size,
    grid_cols: u32,
    grid_rows: u32,
    workspace_bounds: Rect,
    zoom: f64,
    pan: Vec2,
    fit: FitMode,
}

impl CoordinateSystemConfig {
    /// Creates a config with unit pixel ratio, unit zoom, no pan, and
    /// workspace bounds equal to the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either size is not strictly positive or
    /// the grid has no cells.
    pub fn new(
        screen_size: Size,
        canvas_size: Size,
        grid_cols: u32,
        grid_rows: u32,
    ) -> ConfigResult<Self> {
        let config = Self {
            device_pixel_ratio: 1.0,
            screen_size,
            canvas_size,
            grid_cols,
            grid_rows,
            workspace_bounds: Rect::from_size(canvas_size),
            zoom: 1.0,
            pan: Vec2::ZERO,
            fit: FitMode::Contain,
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with a new device pixel ratio.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the ratio is not strictly positive.
    pub fn with_device_pixel_ratio(&self, ratio: f64) -> ConfigResult<Self> {
        self.replaced(|c| c.device_pixel_ratio = ratio)
    }

    /// Returns a copy with a new screen size.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the size is not strictly positive.
    pub fn with_screen_size(&self, size: Size) -> ConfigResult<Self> {
        self.replaced(|c| c.screen_size = size)
    }

    /// Returns a copy with a new zoom level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the zoom is not strictly positive.
    pub fn with_zoom(&self, zoom: f64) -> ConfigResult<Self> {
        self.replaced(|c| c.zoom = zoom)
    }

    /// Returns a copy with a new pan offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the offset is not finite.
    pub fn with_pan(&self, pan: Vec2) -> ConfigResult<Self> {
        self.replaced(|c| c.pan = pan)
    }

    /// Returns a copy with new workspace bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the bounds are empty or not finite.
    pub fn with_workspace_bounds(&self, bounds: Rect) -> ConfigResult<Self> {
        self.replaced(|c| c.workspace_bounds = bounds)
    }

    /// Returns a copy with a different fit mode.
    #[must_use]
    pub fn with_fit(&self, fit: FitMode) -> Self {
        Self { fit, ..self.clone() }
    }

    fn replaced(&self, edit: impl FnOnce(&mut Self)) -> ConfigResult<Self> {
        let mut next = self.clone();
        edit(&mut next);
        next.validate()?;
        Ok(next)
    }

    fn validate(&self) -> ConfigResult<()> {
        check_size("screen_size", self.screen_size)?;
        check_size("canvas_size", self.canvas_size)?;
        check_positive("device_pixel_ratio", self.device_pixel_ratio)?;
        check_positive("zoom", self.zoom)?;
        if self.grid_cols == 0 || self.grid_rows == 0 {
            return Err(ConfigError::EmptyGrid {
                cols: self.grid_cols,
                rows: self.grid_rows,
            });
        }
        if !self.pan.is_finite() {
            return Err(ConfigError::NonFinite { field: "pan" });
        }
        let bounds = self.workspace_bounds;
        if !bounds.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "workspace_bounds",
            });
        }
        check_size("workspace_bounds", Size::new(bounds.width, bounds.height))
    }

    /// Device pixels per logical screen pixel.
    #[must_use]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Screen size in logical pixels.
    #[must_use]
    pub fn screen_size(&self) -> Size {
        self.screen_size
    }

    /// Canvas size in canvas units.
    #[must_use]
    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Grid column count.
    #[must_use]
    pub fn grid_cols(&self) -> u32 {
        self.grid_cols
    }

    /// Grid row count.
    #[must_use]
    pub fn grid_rows(&self) -> u32 {
        self.grid_rows
    }

    /// Bounds drag interactions are clamped to.
    #[must_use]
    pub fn workspace_bounds(&self) -> Rect {
        self.workspace_bounds
    }

    /// Zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Pan offset in workspace units.
    #[must_use]
    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Fit mode.
    #[must_use]
    pub fn fit(&self) -> FitMode {
        self.fit
    }
}

fn check_size(field: &'static str, size: Size) -> ConfigResult<()> {
    if size.is_positive() {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveSize {
            field,
            width: size.width,
            height: size.height,
        })
    }
}

fn check_positive(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositiveValue { field, value })
    }
}
