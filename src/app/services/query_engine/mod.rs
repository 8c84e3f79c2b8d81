//! Spatio-temporal query engine
//!
//! Answers bounding box, time range and property queries over a catalog
//! snapshot. Results are totally ordered (item id, then collection id, by
//! default) and paginated with position cursors, so repeated queries over
//! unchanged data return identical pages and concurrent inserts never make
//! a client skip or repeat an item.

use crate::app::models::{Collection, Item};
use crate::app::services::catalog::{Catalog, CatalogSnapshot};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

pub mod cursor;
pub mod filter;

#[cfg(test)]
pub mod tests;

pub use cursor::SortPosition;
pub use filter::{QueryFilter, SortDirection, SortKey};

/// One page of query results
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    /// Matching items in sort order
    pub items: Vec<Arc<Item>>,

    /// Token for the following page; `None` on the last page
    pub next_cursor: Option<String>,

    /// Total number of matches across all pages
    pub number_matched: usize,
}

impl QueryPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl CatalogSnapshot {
    /// Run an item query returning at most `limit` items
    ///
    /// No matches is an empty page, never an error. Invalid cursors are
    /// rejected with a validation error.
    pub fn query(&self, filter: &QueryFilter, limit: usize) -> Result<QueryPage> {
        let after = filter
            .cursor
            .as_deref()
            .map(|token| cursor::decode(token, filter.sort, filter.direction))
            .transpose()?;

        let mut scanned_collections = 0usize;
        let mut matches: Vec<(SortPosition, &Arc<Item>)> = Vec::new();

        for collection in self.candidate_collections(filter) {
            scanned_collections += 1;
            matches.extend(
                collection
                    .items()
                    .iter()
                    .filter(|item| filter.matches_item(item))
                    .map(|item| (SortPosition::of(item, filter.sort), item)),
            );
        }

        let number_matched = matches.len();

        if let Some(after) = &after {
            matches.retain(|(position, _)| {
                position.cmp_directed(after, filter.direction).is_gt()
            });
        }

        matches.sort_unstable_by(|(a, _), (b, _)| a.cmp_directed(b, filter.direction));

        let has_more = matches.len() > limit;
        matches.truncate(limit);

        let next_cursor = match matches.last() {
            Some((position, _)) if has_more => {
                Some(cursor::encode(filter.sort, filter.direction, position)?)
            }
            _ => None,
        };

        debug!(
            "Query scanned {} collections, matched {} items, returning {}",
            scanned_collections,
            number_matched,
            matches.len()
        );

        Ok(QueryPage {
            items: matches.into_iter().map(|(_, item)| Arc::clone(item)).collect(),
            next_cursor,
            number_matched,
        })
    }

    /// Collections whose extents and properties satisfy the filter, by id
    ///
    /// Uses the extents as last computed.
    pub fn search_collections(&self, filter: &QueryFilter) -> Vec<Arc<Collection>> {
        self.collections()
            .filter(|collection| filter.matches_collection(collection))
            .cloned()
            .collect()
    }

    /// Collections that may hold matching items
    ///
    /// A collection with fresh extents that cannot overlap the filter is
    /// skipped without visiting its items.
    fn candidate_collections<'a>(
        &'a self,
        filter: &'a QueryFilter,
    ) -> impl Iterator<Item = &'a Arc<Collection>> + 'a {
        self.collections().filter(move |collection| {
            if let Some(wanted) = &filter.collection {
                if wanted != collection.id() {
                    return false;
                }
            }
            collection.is_extent_stale() || filter.might_contain_matches(collection)
        })
    }
}

impl Catalog {
    /// Query published items; the page size falls back to the configured default
    pub fn query(&self, filter: &QueryFilter) -> Result<QueryPage> {
        let limit = self.config.resolve_limit(filter.limit)?;
        self.snapshot().query(filter, limit)
    }

    /// Search published collections by extent and properties
    pub fn search_collections(&self, filter: &QueryFilter) -> Vec<Arc<Collection>> {
        self.snapshot().search_collections(filter)
    }
}
