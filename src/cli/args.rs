//! Command-line argument definitions for the STAC catalog
//!
//! This module defines the complete CLI interface using the clap derive API.

use crate::app::models::{Bbox, TemporalExtent};
use crate::app::services::query_engine::{QueryFilter, SortDirection, SortKey};
use crate::config::ItemIdScope;
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the STAC catalog
///
/// Manages a directory of STAC collections and items: create and delete
/// collections, ingest STAC item files, run spatio-temporal queries and
/// export a static STAC catalog.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stac-catalog",
    version,
    about = "Manage and query a STAC catalog of geospatial collections and items",
    long_about = "Maintains STAC 1.0.0 collections and items in a catalog directory. \
                  Items are linked to their collections, collection extents are derived \
                  from member items, and queries filter by bounding box, time range and \
                  properties with stable cursor pagination."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List collections with their item counts and extents
    Collections(ListArgs),
    /// Show a collection or one of its items
    Show(ShowArgs),
    /// Create an empty collection
    Create(CreateArgs),
    /// Delete a collection (with all its items) or a single item
    Delete(DeleteArgs),
    /// Ingest STAC Item or FeatureCollection JSON files into a collection
    Ingest(IngestArgs),
    /// Query items by bounding box, time range and properties
    Query(QueryArgs),
    /// Export collections as a static STAC catalog
    Export(ExportArgs),
    /// Summarize the catalog
    Info(InfoArgs),
}

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct CatalogArgs {
    /// Path to configuration file
    ///
    /// TOML configuration file. If not specified, looks for
    /// <config dir>/stac-catalog/config.toml and falls back to defaults.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Catalog directory, overriding the configured one
    #[arg(
        long = "catalog-dir",
        value_name = "PATH",
        help = "Catalog directory holding one JSON document per collection"
    )]
    pub catalog_dir: Option<PathBuf>,

    /// Item id uniqueness scope, overriding the configured one
    #[arg(
        long = "id-scope",
        value_name = "SCOPE",
        help = "Item id uniqueness scope: collection or global"
    )]
    pub item_id_scope: Option<ItemIdScope>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress log output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Output format options for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// STAC JSON for scripting and other STAC tools
    Json,
    /// CSV for spreadsheets and data analysis
    Csv,
}

#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Only list collections whose extent intersects this box
    #[arg(long = "bbox", value_name = "MINX,MINY,MAXX,MAXY")]
    pub bbox: Option<Bbox>,

    /// Only list collections whose extent overlaps this interval
    #[arg(long = "datetime", value_name = "START/END")]
    pub datetime: Option<TemporalExtent>,
}

#[derive(Debug, Clone, Parser)]
pub struct ShowArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Collection id
    pub collection_id: String,

    /// Show this item instead of the collection
    #[arg(long = "item", value_name = "ID")]
    pub item_id: Option<String>,

    /// Also list the collection's items
    #[arg(long = "items", conflicts_with = "item_id")]
    pub list_items: bool,

    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Parser)]
pub struct CreateArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Collection id
    pub collection_id: String,

    #[arg(long = "title")]
    pub title: Option<String>,

    #[arg(long = "description", default_value = "")]
    pub description: String,

    /// SPDX license identifier
    #[arg(long = "license")]
    pub license: Option<String>,

    /// Keyword (repeatable)
    #[arg(short = 'k', long = "keyword", value_name = "WORD")]
    pub keywords: Vec<String>,

    /// Property as key=value (repeatable)
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<KeyValue>,
}

#[derive(Debug, Clone, Parser)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Collection id
    pub collection_id: String,

    /// Delete only this item
    #[arg(long = "item", value_name = "ID")]
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, Parser)]
pub struct IngestArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Target collection id
    pub collection_id: String,

    /// STAC JSON files, or directories scanned recursively for *.json
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Create the collection if it does not exist
    #[arg(long = "create")]
    pub create_collection: bool,

    /// Skip items whose id already exists instead of failing
    #[arg(long = "skip-existing")]
    pub skip_existing: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct QueryArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(long = "bbox", value_name = "MINX,MINY,MAXX,MAXY")]
    pub bbox: Option<Bbox>,

    /// Instant or interval, e.g. 2024-01-01/2024-06-30 or ../2024-06-30
    #[arg(long = "datetime", value_name = "START/END")]
    pub datetime: Option<TemporalExtent>,

    /// Property equality predicate as key=value (repeatable)
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<KeyValue>,

    /// Restrict to one collection
    #[arg(long = "collection", value_name = "ID")]
    pub collection: Option<String>,

    /// Restrict to these item ids (repeatable)
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Sort key: id or datetime
    #[arg(long = "sort", default_value = "id")]
    pub sort: SortKey,

    /// Sort in descending order
    #[arg(long = "desc")]
    pub descending: bool,

    /// Page size (clamped to the configured maximum)
    #[arg(short = 'n', long = "limit")]
    pub limit: Option<usize>,

    /// Cursor returned by a previous page
    #[arg(long = "cursor")]
    pub cursor: Option<String>,

    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Output directory for the static catalog
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: PathBuf,

    /// Export only this collection
    #[arg(long = "collection", value_name = "ID")]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Parser)]
pub struct InfoArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[arg(long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

/// A `key=value` pair given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl FromStr for KeyValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| Error::validation(format!("Expected KEY=VALUE, got '{}'", s)))?;

        let key = key.trim();
        if key.is_empty() {
            return Err(Error::validation(format!("Empty key in '{}'", s)));
        }

        Ok(KeyValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl CatalogArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }
}

impl QueryArgs {
    /// Build the query filter described by the arguments
    pub fn to_filter(&self) -> QueryFilter {
        let direction = if self.descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };

        QueryFilter {
            bbox: self.bbox,
            time_range: self.datetime,
            properties: self
                .properties
                .iter()
                .map(|kv| (kv.key.clone(), kv.value.clone()))
                .collect(),
            collection: self.collection.clone(),
            ids: self.ids.clone(),
            sort: self.sort,
            direction,
            cursor: self.cursor.clone(),
            limit: self.limit,
        }
    }
}
