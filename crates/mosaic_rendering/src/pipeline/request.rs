//! Frame requests and their priority tiers.

use std::time::Duration;

use mosaic_shared::{LayerSet, Rect};

/// Request urgency. Lower discriminant drains first.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Always executes, ignores the frame budget.
    Critical = 0,
    /// Direct user feedback (drag, viewport change).
    High = 1,
    /// Regular updates.
    Normal = 2,
    /// Cosmetic work that can wait.
    Low = 3,
}

impl Priority {
    /// Tiers in drain order.
    pub const ALL: [Self; 4] = [Self::Critical, Self::High, Self::Normal, Self::Low];

    /// Tier index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

/// Optional context attached to a request.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameMetadata {
    /// Who asked (for logs and tracing)
    pub source: Option<&'static str>,
    /// Canvas area the request is about, if known
    pub region: Option<Rect>,
}

impl FrameMetadata {
    /// Metadata tagged with a source.
    #[must_use]
    pub const fn from_source(source: &'static str) -> Self {
        Self {
            source: Some(source),
            region: None,
        }
    }

    /// Adds a region.
    #[must_use]
    pub const fn with_region(mut self, region: Rect) -> Self {
        self.region = Some(region);
        self
    }

    /// Combines metadata of two coalesced requests.
    ///
    /// The earlier source wins. Regions are unioned; a request without a
    /// region is about the whole canvas, so it absorbs the other.
    #[must_use]
    pub fn merge(self, later: Self) -> Self {
        Self {
            source: self.source.or(later.source),
            region: match (self.region, later.region) {
                (Some(a), Some(b)) => Some(a.union(&b)),
                _ => None,
            },
        }
    }
}

/// A queued request to render a set of layers.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRequest {
    /// Layers to render
    pub layers: LayerSet,
    /// Tier
    pub priority: Priority,
    /// Clock time of the (earliest) enqueue
    pub timestamp: Duration,
    /// Source and region
    pub metadata: FrameMetadata,
    /// Enqueue order, FIFO key within a tier
    pub sequence: u64,
}
