//! Query filter and sort order definitions

use crate::app::models::{Bbox, Collection, Item, TemporalExtent};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field that orders query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Item id, then collection id
    #[default]
    Id,
    /// Item start time, then item id, then collection id
    Datetime,
}

/// Direction of a sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Id => write!(f, "id"),
            SortKey::Datetime => write!(f, "datetime"),
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "id" => Ok(SortKey::Id),
            "datetime" | "time" => Ok(SortKey::Datetime),
            other => Err(Error::validation(format!(
                "Unknown sort key '{}' (expected 'id' or 'datetime')",
                other
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(Error::validation(format!(
                "Unknown sort direction '{}' (expected 'asc' or 'desc')",
                other
            ))),
        }
    }
}

/// Criteria for an item or collection search
///
/// Every criterion is optional; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    /// Items must intersect this box
    pub bbox: Option<Bbox>,

    /// Items must overlap this window
    pub time_range: Option<TemporalExtent>,

    /// Exact string equality on existing property keys
    pub properties: BTreeMap<String, String>,

    /// Restrict to one collection
    pub collection: Option<String>,

    /// Restrict to these item ids
    pub ids: Vec<String>,

    pub sort: SortKey,
    pub direction: SortDirection,

    /// Token returned as `next_cursor` by the previous page
    pub cursor: Option<String>,

    /// Page size; the catalog default applies when unset
    pub limit: Option<usize>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bbox(mut self, bbox: Bbox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    pub fn with_time_range(mut self, time_range: TemporalExtent) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn in_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection = Some(collection_id.into());
        self
    }

    pub fn with_id(mut self, item_id: impl Into<String>) -> Self {
        self.ids.push(item_id.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortKey, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when the item satisfies every criterion
    pub fn matches_item(&self, item: &Item) -> bool {
        if !self.ids.is_empty() && !self.ids.iter().any(|id| id == item.id()) {
            return false;
        }

        if let Some(bbox) = &self.bbox {
            match &item.geometry {
                Some(geometry) if geometry.intersects_bbox(bbox) => {}
                _ => return false,
            }
        }

        if let Some(window) = &self.time_range {
            match &item.time {
                Some(time) if time.overlaps(window) => {}
                _ => return false,
            }
        }

        self.properties_match(item.properties())
    }

    /// True when the collection's recorded extents and properties satisfy
    /// the filter; item ids are not considered
    pub fn matches_collection(&self, collection: &Collection) -> bool {
        if let Some(wanted) = &self.collection {
            if wanted != collection.id() {
                return false;
            }
        }

        if !self.might_contain_matches(collection) {
            return false;
        }

        self.properties_match(collection.properties())
    }

    /// False only when the collection's extents rule out every bbox/time match
    pub(crate) fn might_contain_matches(&self, collection: &Collection) -> bool {
        if let Some(bbox) = &self.bbox {
            match collection.spatial_extent() {
                Some(extent) if extent.intersects(bbox) => {}
                _ => return false,
            }
        }

        if let Some(window) = &self.time_range {
            let extent = collection.temporal_extent();
            if extent.is_unbounded() || !extent.intersects(window) {
                return false;
            }
        }

        true
    }

    fn properties_match(&self, properties: &BTreeMap<String, String>) -> bool {
        self.properties
            .iter()
            .all(|(key, value)| properties.get(key) == Some(value))
    }
}
