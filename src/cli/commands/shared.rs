//! Shared components for CLI commands
//!
//! This module contains common types, utilities, and functions used across
//! multiple CLI command implementations.

use crate::app::models::{Collection, TemporalExtent};
use crate::app::services::catalog::Catalog;
use crate::cli::args::CatalogArgs;
use crate::config::CatalogConfig;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use tracing::{debug, info};

/// Statistics for reporting across all commands
#[derive(Debug, Clone, Default)]
pub struct CommandStats {
    /// Number of collections read or written
    pub collections: usize,
    /// Number of items read or written
    pub items: usize,
    /// Number of inputs skipped
    pub skipped: usize,
    /// Total command time
    pub elapsed: Duration,
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` takes precedence over the verbosity flags. Only the first call
/// installs a subscriber; later calls are no-ops.
pub fn setup_logging(args: &CatalogArgs) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stac_catalog={}", log_level)));

    let result = if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if result.is_ok() {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Load configuration and apply command-line overrides
///
/// An explicit `--config` file must exist. The default config path is used
/// only when present; otherwise built-in defaults apply.
pub fn load_config(args: &CatalogArgs) -> anyhow::Result<CatalogConfig> {
    let mut config = match &args.config_file {
        Some(path) => CatalogConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match CatalogConfig::default_config_path() {
            Ok(path) if path.is_file() => CatalogConfig::from_file(&path)?,
            _ => CatalogConfig::default(),
        },
    };

    if let Some(dir) = &args.catalog_dir {
        config = config.with_catalog_dir(dir);
    }
    if let Some(scope) = args.item_id_scope {
        config = config.with_item_id_scope(scope);
    }

    config.validate()?;
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Open the directory-backed catalog described by the arguments
pub fn open_catalog(args: &CatalogArgs) -> anyhow::Result<Catalog> {
    let config = load_config(args)?;
    let dir = config.catalog_dir.clone();
    let catalog = Catalog::open_dir(config)
        .with_context(|| format!("Failed to open catalog at {}", dir.display()))?;
    info!("Opened catalog at {}", dir.display());
    Ok(catalog)
}

/// Format an optional timestamp for reports, using `..` for open bounds
pub fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_else(|| "..".to_string())
}

/// Format a temporal extent as `start/end`
pub fn format_interval(extent: &TemporalExtent) -> String {
    format!("{}/{}", format_time(extent.start), format_time(extent.end))
}

/// Format a collection's spatial extent, or `-` when it has none
pub fn format_spatial(collection: &Collection) -> String {
    collection
        .spatial_extent()
        .map(|b| {
            let [min_x, min_y, max_x, max_y] = b.to_array();
            format!("[{}, {}, {}, {}]", min_x, min_y, max_x, max_y)
        })
        .unwrap_or_else(|| "-".to_string())
}

/// Escape CSV field values
pub fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
