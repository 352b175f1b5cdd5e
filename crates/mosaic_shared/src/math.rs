//! Space-tagged geometry shared by the host, the coordinator and layers.
//!
//! Each coordinate space gets its own point type so a screen position can
//! never be passed where a canvas position is expected. There are
//! deliberately no `From` impls between them: conversion goes through
//! `CoordinateSystem` only.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

macro_rules! space_point {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
        pub struct $name {
            /// X component
            pub x: f64,
            /// Y component
            pub y: f64,
        }

        impl $name {
            /// Creates a new point
            #[must_use]
            pub const fn new(x: f64, y: f64) -> Self {
                Self { x, y }
            }

            /// Origin of the space
            pub const ORIGIN: Self = Self::new(0.0, 0.0);

            /// True if both components are finite (no NaN, no infinity)
            #[must_use]
            pub fn is_finite(self) -> bool {
                self.x.is_finite() && self.y.is_finite()
            }

            /// Converts to array
            #[must_use]
            pub const fn to_array(self) -> [f64; 2] {
                [self.x, self.y]
            }

            /// Distance to another point in the same space
            #[must_use]
            pub fn distance(self, other: Self) -> f64 {
                (self.x - other.x).hypot(self.y - other.y)
            }
        }
    };
}

space_point!(
    /// Raw input position in device pixels, origin at the top-left of the
    /// host surface.
    ScreenPoint
);

space_point!(
    /// Logical, device-independent position on the drawing surface.
    CanvasPoint
);

space_point!(
    /// Zoom/pan-adjusted position used for drag interactions.
    WorkspacePoint
);

/// Integer puzzle-grid cell coordinate.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct GridPoint {
    /// Column index
    pub x: i32,
    /// Row index
    pub y: i32,
}

impl GridPoint {
    /// Creates a new grid point
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 2D offset - pan vectors, deltas
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// True if both components are finite
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width/height pair.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Size {
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Size {
    /// Creates a new size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True if both dimensions are finite and strictly positive
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Aspect ratio (width / height)
    #[must_use]
    pub fn aspect(self) -> f64 {
        self.width / self.height
    }
}

/// Axis-aligned rectangle (top-left origin, +Y down).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rect {
    /// X position (left edge)
    pub x: f64,
    /// Y position (top edge)
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// A zero-sized rect at the origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering `size` with its origin at zero.
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Returns the right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Returns the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Returns the area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True if the rect covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// True if every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Half-open containment: `[x, right) × [y, bottom)`.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// True if `other` lies entirely inside this rect.
    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// True if the two rects share interior area.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// True if the rects overlap or share an edge segment.
    ///
    /// Corner-only contact does not count.
    #[must_use]
    pub fn touches(&self, other: &Rect) -> bool {
        let x_overlap = self.x < other.right() && other.x < self.right();
        let y_overlap = self.y < other.bottom() && other.y < self.bottom();
        let x_adjacent = self.x <= other.right() && other.x <= self.right();
        let y_adjacent = self.y <= other.bottom() && other.y <= self.bottom();
        (x_overlap && y_adjacent) || (y_overlap && x_adjacent)
    }

    /// Smallest rect containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Overlapping part of both rects, if any.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            None
        } else {
            Some(Rect::new(x, y, right - x, bottom - y))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union() {
        let a = Rect::new(10.0, 10.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(a.union(&b), Rect::new(10.0, 10.0, 140.0, 140.0));
    }

    #[test]
    fn test_rect_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(10.0, 0.0, 10.0, 10.0);
        let below = Rect::new(2.0, 10.0, 4.0, 4.0);
        let corner = Rect::new(10.0, 10.0, 5.0, 5.0);
        let apart = Rect::new(11.0, 0.0, 5.0, 5.0);

        assert!(!a.intersects(&right));
        assert!(a.touches(&right));
        assert!(a.touches(&below));
        assert!(!a.touches(&corner));
        assert!(!a.touches(&apart));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 0.0, 5.0, 5.0)));
        assert_eq!(a.intersection(&Rect::new(20.0, 20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_point_finiteness() {
        assert!(ScreenPoint::new(1.0, 2.0).is_finite());
        assert!(!CanvasPoint::new(f64::NAN, 0.0).is_finite());
        assert!(!WorkspacePoint::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_size_positive() {
        assert!(Size::new(1.0, 1.0).is_positive());
        assert!(!Size::new(0.0, 1.0).is_positive());
        assert!(!Size::new(-4.0, 1.0).is_positive());
        assert!(!Size::new(f64::INFINITY, 1.0).is_positive());
    }

    #[test]
    fn test_point_bytemuck() {
        let p = CanvasPoint::new(1.0, 2.0);
        let bytes: &[u8] = bytemuck::bytes_of(&p);
        assert_eq!(bytes.len(), 16); // 2 * 8 bytes

        let cell = GridPoint::new(3, 4);
        assert_eq!(bytemuck::bytes_of(&cell).len(), 8);
    }
}
