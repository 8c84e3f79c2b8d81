//! Data models for the STAC catalog
//!
//! This module contains the core data structures for representing catalog
//! collections, items, links and assets, together with the spatial and
//! temporal primitives they are described with and the analysis result
//! records consumed from the AI workflow subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod analysis;
pub mod collection;
pub mod geometry;
pub mod item;
pub mod link;
pub mod temporal;

pub use analysis::{AnalysisResult, AnalysisStatus};
pub use collection::{Collection, CollectionSpec, Provider, ProviderRole};
pub use geometry::{Bbox, Geometry, Position};
pub use item::{Asset, Item, ItemSpec};
pub use link::Link;
pub use temporal::{ItemTime, TemporalExtent};

// =============================================================================
// Shared Entity Metadata
// =============================================================================

/// Identity and bookkeeping fields shared by collections and items
///
/// The internal id is assigned by the catalog and never changes; it is
/// distinct from the caller-chosen catalog identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Catalog-assigned internal identifier
    pub internal_id: Uuid,

    /// When the entity was first created
    pub created: DateTime<Utc>,

    /// When the entity was last modified
    pub updated: DateTime<Utc>,
}

impl EntityMeta {
    /// Fresh metadata with a new internal id
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            internal_id: Uuid::new_v4(),
            created: now,
            updated: now,
        }
    }

    /// Metadata restored from a persisted document
    pub fn restore(
        internal_id: Option<Uuid>,
        created: Option<DateTime<Utc>>,
        updated: Option<DateTime<Utc>>,
    ) -> Self {
        let fresh = Self::new();
        let created = created.unwrap_or(fresh.created);
        Self {
            internal_id: internal_id.unwrap_or(fresh.internal_id),
            created,
            updated: updated.unwrap_or(created),
        }
    }

    /// Record a modification
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

impl Default for EntityMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate that a catalog identifier is usable
///
/// Identifiers become file names and href path segments, so path separators
/// and surrounding whitespace are rejected.
pub(crate) fn validate_catalog_id(kind: &str, id: &str) -> crate::Result<()> {
    if id.trim().is_empty() {
        return Err(crate::Error::validation(format!(
            "{} id cannot be empty",
            kind
        )));
    }

    if id.trim() != id {
        return Err(crate::Error::validation(format!(
            "{} id '{}' has leading or trailing whitespace",
            kind, id
        )));
    }

    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(crate::Error::validation(format!(
            "{} id '{}' contains path characters",
            kind, id
        )));
    }

    Ok(())
}
