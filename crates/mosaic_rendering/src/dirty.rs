//! Dirty region tracking.
//!
//! Collects invalidated canvas rectangles between frames so layers can
//! restrict work to what changed. Regions that overlap or share an edge are
//! merged; past the cap the tracker gives up and reports the whole surface.

use mosaic_shared::{Rect, Size};

/// One merged invalidated rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirtyRegion {
    /// Canvas-space bounds.
    pub rect: Rect,
    /// Generation in which the region was last grown.
    pub generation: u64,
}

/// Accumulates and merges dirty rectangles between frames.
#[derive(Debug)]
pub struct DirtyRegionTracker {
    regions: Vec<DirtyRegion>,
    surface: Size,
    max_regions: usize,
    full_surface: bool,
    generation: u64,
}

impl DirtyRegionTracker {
    /// Creates a tracker for a surface. A fresh tracker has nothing dirty.
    #[must_use]
    pub fn new(surface: Size, max_regions: usize) -> Self {
        Self {
            regions: Vec::with_capacity(max_regions.min(64)),
            surface,
            max_regions: max_regions.max(1),
            full_surface: false,
            generation: 0,
        }
    }

    /// Unions `rect` into the region set.
    ///
    /// Empty, non-finite and fully off-surface rects are ignored.
    pub fn mark_dirty(&mut self, rect: Rect) {
        if self.full_surface || !rect.is_finite() || rect.is_empty() {
            return;
        }
        let Some(mut merged) = rect.intersection(&Rect::from_size(self.surface)) else {
            return;
        };

        // Growing a region can make it touch others, so keep absorbing
        // until nothing touches.
        while let Some(i) = self.regions.iter().position(|r| r.rect.touches(&merged)) {
            merged = merged.union(&self.regions.swap_remove(i).rect);
        }
        self.regions.push(DirtyRegion {
            rect: merged,
            generation: self.generation,
        });

        if self.regions.len() > self.max_regions {
            tracing::debug!(
                regions = self.regions.len(),
                cap = self.max_regions,
                "dirty region cap exceeded, collapsing to full surface"
            );
            self.mark_full_surface();
        }
    }

    /// Marks the entire surface dirty.
    pub fn mark_full_surface(&mut self) {
        self.full_surface = true;
        self.regions.clear();
    }

    /// Resizes the surface. Everything is dirty afterwards.
    pub fn set_surface(&mut self, surface: Size) {
        self.surface = surface;
        self.mark_full_surface();
    }

    /// Returns the current regions and clears the set.
    ///
    /// The returned vector belongs to one frame; do not keep it across
    /// frames. Every call advances the generation.
    pub fn consume_dirty_regions(&mut self) -> Vec<DirtyRegion> {
        let out = if self.full_surface {
            vec![DirtyRegion {
                rect: Rect::from_size(self.surface),
                generation: self.generation,
            }]
        } else {
            std::mem::take(&mut self.regions)
        };
        self.full_surface = false;
        self.generation += 1;
        out
    }

    /// Number of regions the next consume would return.
    #[must_use]
    pub fn dirty_region_count(&self) -> usize {
        if self.full_surface {
            1
        } else {
            self.regions.len()
        }
    }

    /// True if anything is dirty.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.full_surface || !self.regions.is_empty()
    }

    /// True if the whole surface is dirty.
    #[must_use]
    pub fn is_full_surface(&self) -> bool {
        self.full_surface
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Tracked surface size.
    #[must_use]
    pub fn surface(&self) -> Size {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> DirtyRegionTracker {
        DirtyRegionTracker::new(Size::new(400.0, 300.0), 4)
    }

    #[test]
    fn test_overlapping_regions_merge() {
        let mut t = tracker();
        t.mark_dirty(Rect::new(10.0, 10.0, 20.0, 20.0));
        t.mark_dirty(Rect::new(20.0, 20.0, 20.0, 20.0));
        assert_eq!(t.dirty_region_count(), 1);

        let regions = t.consume_dirty_regions();
        assert_eq!(regions[0].rect, Rect::new(10.0, 10.0, 30.0, 30.0));
    }

    #[test]
    fn test_adjacent_regions_merge() {
        let mut t = tracker();
        t.mark_dirty(Rect::new(0.0, 0.0, 10.0, 10.0));
        t.mark_dirty(Rect::new(10.0, 0.0, 10.0, 10.0));
        assert_eq!(t.dirty_region_count(), 1);
    }

    #[test]
    fn test_merge_is_transitive() {
        let mut t = tracker();
        t.mark_dirty(Rect::new(0.0, 0.0, 10.0, 10.0));
        t.mark_dirty(Rect::new(50.0, 0.0, 10.0, 10.0));
        assert_eq!(t.dirty_region_count(), 2);

        // Bridges both.
        t.mark_dirty(Rect::new(5.0, 0.0, 50.0, 5.0));
        assert_eq!(t.dirty_region_count(), 1);
        assert_eq!(t.consume_dirty_regions()[0].rect, Rect::new(0.0, 0.0, 60.0, 10.0));
    }

    #[test]
    fn test_ignores_degenerate_input() {
        let mut t = tracker();
        t.mark_dirty(Rect::new(0.0, 0.0, 0.0, 10.0));
        t.mark_dirty(Rect::new(f64::NAN, 0.0, 10.0, 10.0));
        t.mark_dirty(Rect::new(500.0, 500.0, 10.0, 10.0));
        assert!(!t.is_dirty());
    }

    #[test]
    fn test_clips_to_surface() {
        let mut t = tracker();
        t.mark_dirty(Rect::new(390.0, -10.0, 50.0, 20.0));
        assert_eq!(t.consume_dirty_regions()[0].rect, Rect::new(390.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_cap_collapses_to_full_surface() {
        let mut t = tracker();
        for i in 0..5 {
            t.mark_dirty(Rect::new(f64::from(i) * 50.0, 0.0, 10.0, 10.0));
        }
        assert!(t.is_full_surface());
        assert_eq!(t.dirty_region_count(), 1);
        assert_eq!(t.consume_dirty_regions()[0].rect, Rect::new(0.0, 0.0, 400.0, 300.0));
        assert!(!t.is_dirty());
    }

    #[test]
    fn test_consume_clears_and_advances_generation() {
        let mut t = tracker();
        t.mark_dirty(Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(t.consume_dirty_regions()[0].generation, 0);
        assert!(t.consume_dirty_regions().is_empty());
        assert_eq!(t.generation(), 2);

        t.mark_dirty(Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(t.consume_dirty_regions()[0].generation, 2);
    }

    #[test]
    fn test_resize_marks_everything() {
        let mut t = tracker();
        t.set_surface(Size::new(800.0, 600.0));
        assert_eq!(t.consume_dirty_regions()[0].rect, Rect::new(0.0, 0.0, 800.0, 600.0));
    }
}
