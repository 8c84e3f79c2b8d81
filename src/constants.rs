//! Application constants for the STAC catalog
//!
//! This module contains STAC vocabulary, default values and file naming
//! conventions used throughout the catalog.

// =============================================================================
// STAC Vocabulary
// =============================================================================

/// STAC specification version written into every exported document
pub const STAC_VERSION: &str = "1.0.0";

/// GeoJSON / STAC object type names
pub const TYPE_COLLECTION: &str = "Collection";
pub const TYPE_FEATURE: &str = "Feature";

/// Well-known link relation types
pub mod rel {
    pub const SELF: &str = "self";
    pub const PARENT: &str = "parent";
    pub const CHILD: &str = "child";
    pub const ITEM: &str = "item";
    pub const COLLECTION: &str = "collection";
    pub const ROOT: &str = "root";
    /// Link from a catalog entity to an analysis output it was derived from
    pub const DERIVED_FROM: &str = "derived_from";
}

/// Item property keys owned by the catalog rather than free-form metadata
pub mod property_keys {
    pub const DATETIME: &str = "datetime";
    pub const START_DATETIME: &str = "start_datetime";
    pub const END_DATETIME: &str = "end_datetime";
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";

    /// Keys that cannot be set through the property store
    pub const RESERVED: &[&str] = &[DATETIME, START_DATETIME, END_DATETIME, CREATED, UPDATED];
}

/// Default license for collections created without one
pub const DEFAULT_LICENSE: &str = "proprietary";

// =============================================================================
// Query Defaults
// =============================================================================

/// Page size used when a query does not specify a limit
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Upper bound on page size; larger limits are clamped
pub const MAX_PAGE_LIMIT: usize = 10_000;

// =============================================================================
// Storage Layout
// =============================================================================

/// Extension of collection documents in a catalog directory
pub const COLLECTION_FILE_EXTENSION: &str = "json";

/// Name of the application directory under the user's data/config dirs
pub const APP_DIR_NAME: &str = "stac-catalog";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";
