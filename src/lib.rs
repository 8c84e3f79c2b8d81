//! STAC Catalog Library
//!
//! A Rust library implementing the catalog engine behind a geospatial asset
//! administration system: STAC collections, items and links forming a
//! constrained graph with spatial and temporal extents.
//!
//! This library provides tools for:
//! - Modelling collections, items, links, assets and analysis results
//! - Keeping item back-references and link ownership consistent
//! - Deriving collection extents from member items
//! - Serving bounding box, time range and property queries with stable
//!   cursor pagination
//! - Persisting catalogs as STAC 1.0.0 JSON documents

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod catalog;
        pub mod extent;
        pub mod link_graph;
        pub mod properties;
        pub mod query_engine;
        pub mod stac;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{
    AnalysisResult, AnalysisStatus, Asset, Bbox, Collection, CollectionSpec, Geometry, Item,
    ItemSpec, ItemTime, Link, Provider, TemporalExtent,
};
pub use app::services::catalog::Catalog;
pub use app::services::query_engine::{QueryFilter, QueryPage, SortKey};
pub use config::CatalogConfig;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for catalog operations
///
/// `NotFound`, `Conflict` and `Validation` are caller errors. `Consistency`
/// always indicates a defect inside the catalog and is logged when raised.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Referenced collection, item, link or analysis result is absent
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Duplicate identifier on create or add
    #[error("{kind} already exists: {id}")]
    Conflict { kind: &'static str, id: String },

    /// Missing required field, malformed geometry or invalid time range
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Internal invariant violation
    #[error("Consistency error: {message}")]
    Consistency { message: String },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Create a not found error for the given entity kind
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a conflict error for the given entity kind
    pub fn conflict(kind: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a consistency error
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a serialization error with context
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for `NotFound` errors
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for `Conflict` errors
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// True for `Validation` errors
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON processing failed".to_string(),
            source: error,
        }
    }
}
