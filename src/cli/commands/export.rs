//! Export command: write a static STAC catalog
//!
//! Layout under the output directory:
//!
//! ```text
//! catalog.json
//! <collection>/collection.json
//! <collection>/items/<item>.json
//! ```
//!
//! Navigation links (`root`, `parent`, `child`, `item`, `collection`) are
//! added to the exported documents only; the stored entities are unchanged.

use super::shared::{CommandStats, open_catalog, setup_logging};
use crate::app::models::{Collection, Link};
use crate::app::services::catalog::Catalog;
use crate::app::services::stac::{to_stac_collection, to_stac_item};
use crate::cli::args::ExportArgs;
use crate::constants::{STAC_VERSION, rel};
use anyhow::Context;
use colored::*;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const CATALOG_FILE: &str = "catalog.json";
const COLLECTION_FILE: &str = "collection.json";
const ITEMS_DIR: &str = "items";
const MEDIA_TYPE_JSON: &str = "application/json";
const MEDIA_TYPE_GEOJSON: &str = "application/geo+json";

/// Export collections as a static STAC catalog
pub fn run_export(args: ExportArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);
    debug!("Export arguments: {:?}", args);

    let catalog = open_catalog(&args.catalog)?;
    let collections = match &args.collection {
        Some(id) => vec![catalog.get_collection(id)?],
        None => catalog.list_collections(),
    };

    let mut stats = export_static_catalog(&catalog, &collections, &args.output)?;
    stats.elapsed = start_time.elapsed();

    println!(
        "{} Exported {} collections and {} items to {}",
        "✅".green(),
        stats.collections,
        stats.items,
        args.output.display().to_string().bold()
    );
    Ok(stats)
}

/// Write the static catalog for the given collections
pub(crate) fn export_static_catalog(
    catalog: &Catalog,
    collections: &[Arc<Collection>],
    output: &Path,
) -> anyhow::Result<CommandStats> {
    let pretty = catalog.config().pretty_json;
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let mut stats = CommandStats::default();
    let mut root_links = vec![
        Link::new(rel::ROOT, format!("./{}", CATALOG_FILE))?.with_media_type(MEDIA_TYPE_JSON),
        Link::new(rel::SELF, format!("./{}", CATALOG_FILE))?.with_media_type(MEDIA_TYPE_JSON),
    ];

    for collection in collections {
        let collection_dir = output.join(collection.id());
        let items_dir = collection_dir.join(ITEMS_DIR);
        std::fs::create_dir_all(&items_dir)
            .with_context(|| format!("Failed to create {}", items_dir.display()))?;

        let mut stac = to_stac_collection(collection);
        stac.internal_id = None;
        push_navigation(&mut stac.links, rel::ROOT, &format!("../{}", CATALOG_FILE))?;
        push_navigation(&mut stac.links, rel::PARENT, &format!("../{}", CATALOG_FILE))?;
        push_navigation(&mut stac.links, rel::SELF, &format!("./{}", COLLECTION_FILE))?;

        for item in collection.items() {
            let mut stac_item = to_stac_item(item);
            stac_item.internal_id = None;
            let collection_href = format!("../{}", COLLECTION_FILE);
            push_navigation(&mut stac_item.links, rel::ROOT, &format!("../../{}", CATALOG_FILE))?;
            push_navigation(&mut stac_item.links, rel::PARENT, &collection_href)?;
            push_navigation(&mut stac_item.links, rel::COLLECTION, &collection_href)?;

            let item_file = format!("{}.json", item.id());
            write_json(&items_dir.join(&item_file), &stac_item, pretty)?;
            stac.links.push(
                Link::new(rel::ITEM, format!("./{}/{}", ITEMS_DIR, item_file))?
                    .with_media_type(MEDIA_TYPE_GEOJSON),
            );
            stats.items += 1;
        }

        write_json(&collection_dir.join(COLLECTION_FILE), &stac, pretty)?;
        root_links.push(
            Link::new(
                rel::CHILD,
                format!("./{}/{}", collection.id(), COLLECTION_FILE),
            )?
            .with_title(collection.title.clone().unwrap_or_else(|| collection.id().to_string()))
            .with_media_type(MEDIA_TYPE_JSON),
        );
        stats.collections += 1;
        debug!(
            "Exported collection '{}' with {} items",
            collection.id(),
            collection.item_count()
        );
    }

    let root = json!({
        "type": "Catalog",
        "stac_version": STAC_VERSION,
        "id": "stac-catalog",
        "description": format!("Static export of {} collections", stats.collections),
        "links": root_links,
    });
    write_json(&output.join(CATALOG_FILE), &root, pretty)?;

    info!(
        "Exported {} collections and {} items to {}",
        stats.collections,
        stats.items,
        output.display()
    );
    Ok(stats)
}

/// Add a navigation link unless the entity already carries it
fn push_navigation(links: &mut Vec<Link>, relation: &str, href: &str) -> anyhow::Result<()> {
    if !links.iter().any(|link| link.rel == relation) {
        links.push(Link::new(relation, href)?.with_media_type(MEDIA_TYPE_JSON));
    }
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> anyhow::Result<()> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
