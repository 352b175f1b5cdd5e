//! Layer identities.
//!
//! `RenderLayerType` is a lookup key. Behavior lives behind the `Layer` trait
//! in `mosaic_rendering`; nothing should branch on the layer type to decide
//! how to draw.

use serde::{Deserialize, Serialize};

use crate::constants::LAYER_TYPE_COUNT;

/// The three independently-updating visual layers.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayerType {
    /// Board, background and placed pieces. Changes rarely.
    Static = 0,
    /// Pieces in flight (dragged, animating).
    Dynamic = 1,
    /// Particles, glow, ripples.
    Effects = 2,
}

impl RenderLayerType {
    /// All layer types in canonical (bottom-to-top) order.
    pub const ALL: [Self; LAYER_TYPE_COUNT] = [Self::Static, Self::Dynamic, Self::Effects];

    /// Slot index of this layer type.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name for logs and the overlay.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Effects => "effects",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of layer types, stored as a bit mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerSet(u8);

impl LayerSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Every layer type.
    pub const ALL: Self = Self(0b111);

    /// Set containing a single layer type.
    #[must_use]
    pub const fn single(layer: RenderLayerType) -> Self {
        Self(layer.bit())
    }

    /// Set built from a slice of layer types.
    #[must_use]
    pub fn of(layers: &[RenderLayerType]) -> Self {
        layers.iter().fold(Self::EMPTY, |set, &l| set.with(l))
    }

    /// Returns a copy with `layer` added.
    #[must_use]
    pub const fn with(self, layer: RenderLayerType) -> Self {
        Self(self.0 | layer.bit())
    }

    /// Returns a copy with `layer` removed.
    #[must_use]
    pub const fn without(self, layer: RenderLayerType) -> Self {
        Self(self.0 & !layer.bit())
    }

    /// Adds a layer type in place.
    pub fn insert(&mut self, layer: RenderLayerType) {
        self.0 |= layer.bit();
    }

    /// Removes a layer type in place.
    pub fn remove(&mut self, layer: RenderLayerType) {
        self.0 &= !layer.bit();
    }

    /// True if `layer` is in the set.
    #[must_use]
    pub const fn contains(self, layer: RenderLayerType) -> bool {
        self.0 & layer.bit() != 0
    }

    /// Union of both sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Intersection of both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Elements of `self` not in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// True if the sets share at least one layer type.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if no layer type is in the set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of layer types in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = RenderLayerType> {
        RenderLayerType::ALL.into_iter().filter(move |&l| self.contains(l))
    }
}

impl From<RenderLayerType> for LayerSet {
    fn from(layer: RenderLayerType) -> Self {
        Self::single(layer)
    }
}

impl FromIterator<RenderLayerType> for LayerSet {
    fn from_iter<I: IntoIterator<Item = RenderLayerType>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl std::fmt::Display for LayerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, layer) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(layer.name())?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_set_operations() {
        let dynamic = LayerSet::single(RenderLayerType::Dynamic);
        let dyn_fx = LayerSet::of(&[RenderLayerType::Dynamic, RenderLayerType::Effects]);

        assert!(dynamic.intersects(dyn_fx));
        assert_eq!(dynamic.union(dyn_fx), dyn_fx);
        assert_eq!(dyn_fx.difference(dynamic), LayerSet::single(RenderLayerType::Effects));
        assert_eq!(dyn_fx.len(), 2);
        assert!(!LayerSet::single(RenderLayerType::Static).intersects(dyn_fx));
    }

    #[test]
    fn test_layer_set_iterates_in_canonical_order() {
        let set: LayerSet = [RenderLayerType::Effects, RenderLayerType::Static]
            .into_iter()
            .collect();
        let order: Vec<_> = set.iter().collect();
        assert_eq!(order, vec![RenderLayerType::Static, RenderLayerType::Effects]);
        assert_eq!(set.to_string(), "{static, effects}");
    }

    #[test]
    fn test_empty_set() {
        assert!(LayerSet::EMPTY.is_empty());
        assert_eq!(LayerSet::EMPTY.iter().count(), 0);
        assert_eq!(LayerSet::ALL.len(), 3);
    }
}
