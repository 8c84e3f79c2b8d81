//! Collection extent calculation
//!
//! Extents are pure aggregates over a collection's current items: the
//! result depends only on the set of items, never on insertion order or
//! on earlier extents. Recomputation runs when items are added or removed;
//! in-place item edits leave the collection marked stale until
//! [`Collection::recompute_extents`] is called explicitly.

use crate::app::models::{Bbox, Collection, Item, TemporalExtent};
use std::sync::Arc;
use tracing::trace;

/// Envelope covering every item geometry; `None` when no item has one
pub fn spatial_extent<'a>(items: impl IntoIterator<Item = &'a Item>) -> Option<Bbox> {
    items
        .into_iter()
        .filter_map(|item| item.geometry.as_ref().and_then(|g| g.bbox()))
        .reduce(|acc, bbox| acc.union(&bbox))
}

/// `[min(start), max(end)]` over all item times; unbounded when no item has one
pub fn temporal_extent<'a>(items: impl IntoIterator<Item = &'a Item>) -> TemporalExtent {
    let mut extent = TemporalExtent::unbounded();

    for time in items.into_iter().filter_map(|item| item.time) {
        extent.start = Some(extent.start.map_or(time.start(), |s| s.min(time.start())));
        extent.end = Some(extent.end.map_or(time.end(), |e| e.max(time.end())));
    }

    extent
}

impl Collection {
    /// Recompute the spatial extent from the member items
    pub fn recompute_spatial_extent(&mut self) {
        self.spatial_extent = spatial_extent(self.items.iter().map(Arc::as_ref));
    }

    /// Recompute the temporal extent from the member items
    pub fn recompute_temporal_extent(&mut self) {
        self.temporal_extent = temporal_extent(self.items.iter().map(Arc::as_ref));
    }

    /// Recompute both extents and clear the stale flag
    pub fn recompute_extents(&mut self) {
        self.recompute_spatial_extent();
        self.recompute_temporal_extent();
        self.extent_stale = false;

        trace!(
            "Recomputed extents for collection '{}': spatial={:?}, temporal={:?}",
            self.id, self.spatial_extent, self.temporal_extent
        );
    }
}
