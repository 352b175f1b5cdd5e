//! Tiered FIFO queue with coalescing.

use std::collections::VecDeque;
use std::time::Duration;

use mosaic_shared::LayerSet;

use super::request::{FrameMetadata, FrameRequest, Priority};

/// How a push was absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushOutcome {
    /// Appended as a new request.
    Enqueued,
    /// Merged into an existing request of the same tier.
    Coalesced,
}

/// One FIFO per priority tier.
///
/// Within a tier no two requests share a layer: a push that overlaps queued
/// requests is merged into the earliest of them, and any others it now
/// overlaps are folded in too.
#[derive(Debug, Default)]
pub struct RenderQueue {
    tiers: [VecDeque<FrameRequest>; 4],
    next_sequence: u64,
}

impl RenderQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a request, coalescing with overlapping same-tier requests.
    pub fn push(
        &mut self,
        layers: LayerSet,
        priority: Priority,
        timestamp: Duration,
        metadata: FrameMetadata,
    ) -> PushOutcome {
        let tier = &mut self.tiers[priority.index()];

        let Some(first) = tier.iter().position(|r| r.layers.intersects(layers)) else {
            tier.push_back(FrameRequest {
                layers,
                priority,
                timestamp,
                metadata,
                sequence: self.next_sequence,
            });
            self.next_sequence += 1;
            return PushOutcome::Enqueued;
        };

        let mut merged = tier[first].layers.union(layers);
        let mut merged_meta = tier[first].metadata.merge(metadata);
        // Later requests the grown set now overlaps.
        let mut i = first + 1;
        while i < tier.len() {
            if tier[i].layers.intersects(merged) {
                if let Some(absorbed) = tier.remove(i) {
                    merged = merged.union(absorbed.layers);
                    merged_meta = merged_meta.merge(absorbed.metadata);
                }
            } else {
                i += 1;
            }
        }
        let target = &mut tier[first];
        target.layers = merged;
        target.metadata = merged_meta;
        PushOutcome::Coalesced
    }

    /// Oldest request of a tier.
    #[must_use]
    pub fn front(&self, priority: Priority) -> Option<&FrameRequest> {
        self.tiers[priority.index()].front()
    }

    /// Removes the oldest request of a tier.
    pub fn pop_front(&mut self, priority: Priority) -> Option<FrameRequest> {
        self.tiers[priority.index()].pop_front()
    }

    /// Removes the next request in drain order.
    pub fn pop_next(&mut self) -> Option<FrameRequest> {
        self.tiers.iter_mut().find_map(VecDeque::pop_front)
    }

    /// Requests in drain order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameRequest> {
        self.tiers.iter().flatten()
    }

    /// Requests queued in one tier.
    #[must_use]
    pub fn tier_len(&self, priority: Priority) -> usize {
        self.tiers[priority.index()].len()
    }

    /// Total queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(VecDeque::is_empty)
    }

    /// Union of every queued layer set.
    #[must_use]
    pub fn pending_layers(&self) -> LayerSet {
        self.iter().fold(LayerSet::EMPTY, |acc, r| acc.union(r.layers))
    }

    /// Discards everything.
    pub fn clear(&mut self) {
        self.tiers.iter_mut().for_each(VecDeque::clear);
    }
}
