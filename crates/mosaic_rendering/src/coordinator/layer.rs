//! The layer capability interface.

use mosaic_shared::{LayerMessage, QualityLevel, QualitySettings};

use crate::coords::CoordinateSystem;
use crate::dirty::DirtyRegion;

/// Read-only view of one frame, handed to [`Layer::render`].
#[derive(Debug)]
pub struct RenderContext<'a> {
    /// Frame being rendered
    pub frame_index: u64,
    /// Active quality level
    pub quality: QualityLevel,
    /// Settings of the active level
    pub settings: QualitySettings,
    /// Current coordinate mapping
    pub coords: &'a CoordinateSystem,
    /// Canvas areas invalidated since this layer last rendered.
    ///
    /// Empty means nobody named an area: the layer was asked to render as a
    /// whole, so it must treat the entire canvas as stale. An empty slice is
    /// never "nothing changed".
    pub dirty_regions: &'a [DirtyRegion],
}

/// A visual layer driven by the coordinator.
///
/// Layers never talk to each other directly: they receive messages through
/// [`handle_message`](Layer::handle_message) and expose whether they want a
/// redraw through the `needs_update` flag.
pub trait Layer {
    /// Draws the layer for one frame.
    fn render(&mut self, ctx: &RenderContext<'_>);

    /// Receives a directed or broadcast message.
    fn handle_message(&mut self, message: &LayerMessage);

    /// Applies a new quality level. Called before the next frame renders.
    fn update_quality(&mut self, level: QualityLevel);

    /// Whether the layer has pending visual changes.
    fn needs_update(&self) -> bool;

    /// Flags the layer for a redraw.
    fn mark_needs_update(&mut self);
}
