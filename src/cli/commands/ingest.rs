//! Ingest command: load STAC Item documents into a collection
//!
//! Accepts single `Feature` documents and `FeatureCollection`s. Directories
//! are walked recursively for `*.json` files in path order.

use super::shared::{CommandStats, open_catalog, setup_logging};
use crate::app::models::CollectionSpec;
use crate::app::services::catalog::Catalog;
use crate::app::services::stac::{StacItem, item_from_stac};
use crate::cli::args::IngestArgs;
use crate::config::ItemIdScope;
use crate::constants::{COLLECTION_FILE_EXTENSION, TYPE_FEATURE};
use anyhow::{Context, bail};
use colored::*;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Ingest STAC item files into a collection
pub fn run_ingest(args: IngestArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);
    debug!("Ingest arguments: {:?}", args);

    let catalog = open_catalog(&args.catalog)?;

    if !catalog.contains_collection(&args.collection_id) {
        if args.create_collection {
            catalog.create_collection(CollectionSpec::new(args.collection_id.clone()))?;
        } else {
            bail!(
                "Collection '{}' does not exist (use --create to create it)",
                args.collection_id
            );
        }
    }

    let files = discover_files(&args.paths)?;
    info!(
        "Ingesting {} files into collection '{}'",
        files.len(),
        args.collection_id
    );

    let mut stats = CommandStats {
        collections: 1,
        ..Default::default()
    };
    for file in &files {
        let file_stats = ingest_file(&catalog, &args.collection_id, file, args.skip_existing)
            .with_context(|| format!("Failed to ingest {}", file.display()))?;
        stats.items += file_stats.items;
        stats.skipped += file_stats.skipped;
    }

    let collection = catalog.get_collection(&args.collection_id)?;
    catalog.close();

    println!(
        "{} Ingested {} items into {} ({} skipped, {} files, {:.2}s)",
        "✅".green(),
        stats.items,
        collection.id().bold(),
        stats.skipped,
        files.len(),
        start_time.elapsed().as_secs_f64()
    );

    stats.elapsed = start_time.elapsed();
    Ok(stats)
}

/// Expand the given paths into a sorted list of JSON files
pub(crate) fn discover_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext == COLLECTION_FILE_EXTENSION)
                })
                .collect();
            found.sort();
            debug!("Found {} JSON files under {}", found.len(), path.display());
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            bail!("Input path does not exist: {}", path.display());
        }
    }

    Ok(files)
}

/// Parse the STAC items contained in one document
pub(crate) fn read_items(path: &Path) -> anyhow::Result<Vec<StacItem>> {
    let content = std::fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content).context("Invalid JSON")?;

    match document.get("type").and_then(Value::as_str) {
        Some(TYPE_FEATURE) => Ok(vec![serde_json::from_value(document)?]),
        Some("FeatureCollection") => {
            let Some(Value::Array(features)) = document.get("features") else {
                bail!("FeatureCollection has no 'features' array");
            };
            features
                .iter()
                .cloned()
                .map(|feature| serde_json::from_value::<StacItem>(feature).map_err(anyhow::Error::from))
                .collect()
        }
        Some(other) => bail!(
            "Unsupported document type '{}' (expected Feature or FeatureCollection)",
            other
        ),
        None => bail!("Document has no 'type' field"),
    }
}

/// Insert every item of one file in a single commit, counting skipped duplicates
///
/// Without `skip_existing` the file is all or nothing: one conflicting id
/// rejects the whole file.
pub(crate) fn ingest_file(
    catalog: &Catalog,
    collection_id: &str,
    path: &Path,
    skip_existing: bool,
) -> anyhow::Result<CommandStats> {
    let mut stats = CommandStats::default();
    let collection = catalog.get_collection(collection_id)?;
    let global_scope = catalog.config().item_id_scope == ItemIdScope::Global;
    let mut batch_ids = HashSet::new();
    let mut items = Vec::new();

    for stac_item in read_items(path)? {
        let item_id = stac_item.id.clone();
        // Items are re-homed into the target collection
        if let Some(owner) = stac_item.collection.as_deref().filter(|o| *o != collection_id) {
            debug!(
                "Item '{}' names collection '{}', ingesting into '{}'",
                item_id, owner, collection_id
            );
        }

        if skip_existing {
            let taken = collection.contains_item(&item_id)
                || (global_scope && !catalog.find_items(&item_id).is_empty());
            if taken || !batch_ids.insert(item_id.clone()) {
                warn!("Skipping existing item '{}'", item_id);
                stats.skipped += 1;
                continue;
            }
        }

        let item = item_from_stac(stac_item)
            .with_context(|| format!("Invalid STAC item '{}'", item_id))?;
        items.push(item);
    }

    stats.items = catalog.insert_items(collection_id, items)?.len();
    debug!(
        "Ingested {} items from {} ({} skipped)",
        stats.items,
        path.display(),
        stats.skipped
    );
    Ok(stats)
}
