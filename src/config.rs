//! Configuration management and validation.
//!
//! Provides the catalog configuration structure, TOML loading and the
//! builder methods used by the CLI to apply command-line overrides.

use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Scope in which item identifiers must be unique
///
/// Chosen once when a catalog is opened and enforced for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemIdScope {
    /// Item ids are unique within their owning collection
    #[default]
    Collection,
    /// Item ids are unique across the whole catalog
    Global,
}

impl std::fmt::Display for ItemIdScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemIdScope::Collection => write!(f, "collection"),
            ItemIdScope::Global => write!(f, "global"),
        }
    }
}

impl std::str::FromStr for ItemIdScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "collection" => Ok(ItemIdScope::Collection),
            "global" | "catalog" => Ok(ItemIdScope::Global),
            other => Err(Error::configuration(format!(
                "Unknown item id scope '{}' (expected 'collection' or 'global')",
                other
            ))),
        }
    }
}

/// Global configuration for the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding one STAC JSON document per collection
    pub catalog_dir: PathBuf,

    /// Uniqueness scope for item identifiers
    pub item_id_scope: ItemIdScope,

    /// Page size when a query does not specify one
    pub default_limit: usize,

    /// Maximum page size; larger requests are clamped
    pub max_limit: usize,

    /// Re-check the back-reference invariant after every mutation
    pub verify_invariants: bool,

    /// Pretty-print persisted and exported JSON
    pub pretty_json: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            item_id_scope: ItemIdScope::Collection,
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
            verify_invariants: true,
            pretty_json: true,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::configuration(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Default config file location (`<config dir>/stac-catalog/config.toml`)
    pub fn default_config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::configuration("Could not determine user config directory"))
    }

    /// Validate limits and paths
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(Error::configuration("default_limit must be greater than 0"));
        }

        if self.max_limit < self.default_limit {
            return Err(Error::configuration(format!(
                "max_limit ({}) cannot be smaller than default_limit ({})",
                self.max_limit, self.default_limit
            )));
        }

        if self.catalog_dir.as_os_str().is_empty() {
            return Err(Error::configuration("catalog_dir cannot be empty"));
        }

        Ok(())
    }

    /// Set the catalog directory
    pub fn with_catalog_dir(mut self, catalog_dir: impl Into<PathBuf>) -> Self {
        self.catalog_dir = catalog_dir.into();
        self
    }

    /// Set the item id uniqueness scope
    pub fn with_item_id_scope(mut self, scope: ItemIdScope) -> Self {
        self.item_id_scope = scope;
        self
    }

    /// Set the default page size
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the maximum page size
    pub fn with_max_limit(mut self, limit: usize) -> Self {
        self.max_limit = limit;
        self
    }

    /// Disable invariant verification after mutations
    pub fn without_invariant_checks(mut self) -> Self {
        self.verify_invariants = false;
        self
    }

    /// Write compact JSON instead of pretty-printed JSON
    pub fn with_compact_json(mut self) -> Self {
        self.pretty_json = false;
        self
    }

    /// Resolve a requested page size against the configured bounds
    pub fn resolve_limit(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            None => Ok(self.default_limit),
            Some(0) => Err(Error::validation("limit must be greater than 0")),
            Some(limit) => Ok(limit.min(self.max_limit)),
        }
    }
}

fn default_catalog_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("catalog"))
        .unwrap_or_else(|| PathBuf::from("./catalog"))
}
