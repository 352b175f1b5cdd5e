//! Axis-aligned affine maps.
//!
//! Every transform between spaces is a per-axis scale followed by a
//! translation, so a 2x3 matrix would be mostly zeros. `Affine2` stores the
//! four meaningful terms only.

use mosaic_shared::{Size, Vec2};

use super::config::{CoordinateSystemConfig, FitMode};

/// `p' = p * scale + translate`, per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    /// X scale
    pub sx: f64,
    /// Y scale
    pub sy: f64,
    /// X translation (applied after scaling)
    pub tx: f64,
    /// Y translation (applied after scaling)
    pub ty: f64,
}

impl Affine2 {
    /// Identity map.
    pub const IDENTITY: Self = Self {
        sx: 1.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Scale then translate.
    #[must_use]
    pub const fn new(scale: Vec2, translate: Vec2) -> Self {
        Self {
            sx: scale.x,
            sy: scale.y,
            tx: translate.x,
            ty: translate.y,
        }
    }

    /// Applies the map to a raw coordinate pair.
    #[inline]
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.sx + self.tx, y * self.sy + self.ty)
    }

    /// Undoes the map as `(p - translate) / scale`. Scales are non-zero for
    /// every validated config.
    #[inline]
    #[must_use]
    pub fn unapply(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.tx) / self.sx, (y - self.ty) / self.sy)
    }
}

/// Everything derived from one config snapshot.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Transforms {
    pub canvas_to_screen: Affine2,
    pub canvas_to_workspace: Affine2,
    pub cell: Size,
}

impl Transforms {
    pub(crate) fn build(config: &CoordinateSystemConfig) -> Self {
        let screen = config.screen_size();
        let canvas = config.canvas_size();
        let dpr = config.device_pixel_ratio();

        // Logical-pixel fit, then lifted to device pixels.
        let (fit, letterbox) = match config.fit() {
            FitMode::Contain => {
                let s = (screen.width / canvas.width).min(screen.height / canvas.height);
                let offset = Vec2::new(
                    (screen.width - canvas.width * s) * 0.5,
                    (screen.height - canvas.height * s) * 0.5,
                );
                (Vec2::new(s, s), offset)
            }
            FitMode::Stretch => (
                Vec2::new(screen.width / canvas.width, screen.height / canvas.height),
                Vec2::ZERO,
            ),
        };
        let scale = Vec2::new(fit.x * dpr, fit.y * dpr);
        let offset = Vec2::new(letterbox.x * dpr, letterbox.y * dpr);

        let canvas_to_screen = Affine2::new(scale, offset);
        let zoom = config.zoom();
        let canvas_to_workspace = Affine2::new(Vec2::new(zoom, zoom), config.pan());

        let cols = f64::from(config.grid_cols());
        let rows = f64::from(config.grid_rows());

        Self {
            canvas_to_screen,
            canvas_to_workspace,
            cell: Size::new(canvas.width / cols, canvas.height / rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unapply_round_trip() {
        let a = Affine2::new(Vec2::new(2.5, 0.4), Vec2::new(-30.0, 12.0));
        let (x, y) = a.apply(7.0, -3.0);
        let (bx, by) = a.unapply(x, y);
        assert!((bx - 7.0).abs() < 1e-12);
        assert!((by + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unapply_subtracts_offset_then_divides() {
        // 4:3 canvas pillarboxed in 1600x900 at dpr 1: scale 3, offset 200.
        let a = Affine2::new(Vec2::new(3.0, 3.0), Vec2::new(200.0, 0.0));
        let (x, y) = (1000.1, 0.3);
        assert_eq!(a.unapply(x, y), ((x - 200.0) / 3.0, y / 3.0));
    }

    #[test]
    fn test_letterbox_centers_canvas() {
        // 4:3 canvas in a 16:9 screen: pillarboxed horizontally.
        let config = CoordinateSystemConfig::new(
            Size::new(1600.0, 900.0),
            Size::new(400.0, 300.0),
            4,
            3,
        )
        .unwrap();
        let t = Transforms::build(&config);
        assert_eq!(t.canvas_to_screen.sx, 3.0);
        assert_eq!(t.canvas_to_screen.tx, 200.0);
        assert_eq!(t.canvas_to_screen.ty, 0.0);
    }

    #[test]
    fn test_stretch_scales_per_axis() {
        let config = CoordinateSystemConfig::new(
            Size::new(800.0, 900.0),
            Size::new(400.0, 300.0),
            4,
            3,
        )
        .unwrap()
        .with_fit(FitMode::Stretch);
        let t = Transforms::build(&config);
        assert_eq!((t.canvas_to_screen.sx, t.canvas_to_screen.sy), (2.0, 3.0));
        assert_eq!(t.cell, Size::new(100.0, 100.0));
    }
}
