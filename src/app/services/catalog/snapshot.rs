//! Immutable point-in-time views of the catalog

use super::CollectionMap;
use crate::app::models::{Collection, Item};
use serde::Serialize;
use std::sync::Arc;

/// Consistent read-only view of every published collection
///
/// Taking a snapshot is cheap and never waits for writers. Later commits
/// are not visible through an existing snapshot.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    collections: Arc<CollectionMap>,
}

/// Summary counts for a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStatistics {
    pub collections: usize,
    pub items: usize,
    pub collection_links: usize,
    pub item_links: usize,
    pub stale_collections: usize,
}

impl CatalogSnapshot {
    pub(crate) fn new(collections: Arc<CollectionMap>) -> Self {
        Self { collections }
    }

    /// Collections ordered by id
    pub fn collections(&self) -> impl Iterator<Item = &Arc<Collection>> {
        self.collections.values()
    }

    pub fn collection(&self, collection_id: &str) -> Option<&Arc<Collection>> {
        self.collections.get(collection_id)
    }

    /// Every item, grouped by collection in id order
    pub fn items(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.collections.values().flat_map(|c| c.items().iter())
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub fn item_count(&self) -> usize {
        self.collections.values().map(|c| c.item_count()).sum()
    }

    pub fn statistics(&self) -> CatalogStatistics {
        self.collections
            .values()
            .fold(CatalogStatistics::default(), |mut stats, collection| {
                stats.collections += 1;
                stats.items += collection.item_count();
                stats.collection_links += collection.links().len();
                stats.item_links += collection
                    .items()
                    .iter()
                    .map(|item| item.links().len())
                    .sum::<usize>();
                if collection.is_extent_stale() {
                    stats.stale_collections += 1;
                }
                stats
            })
    }
}
