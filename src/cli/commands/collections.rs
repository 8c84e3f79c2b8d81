//! Collection management commands: list, show, create, delete and info
//!
//! Each report is rendered into a string by a `generate_*` function so the
//! output can be tested without capturing stdout.

use super::shared::{
    CommandStats, csv_escape, format_interval, format_spatial, format_time, open_catalog,
    setup_logging,
};
use crate::app::models::{Collection, CollectionSpec, Item};
use crate::app::services::catalog::{Catalog, CatalogSnapshot};
use crate::app::services::query_engine::QueryFilter;
use crate::app::services::stac::{to_item_collection, to_stac_collection, to_stac_item};
use crate::cli::args::{CreateArgs, DeleteArgs, InfoArgs, ListArgs, OutputFormat, ShowArgs};
use colored::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

// =============================================================================
// collections
// =============================================================================

/// List collections, optionally restricted by extent
pub fn run_list(args: ListArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);
    debug!("List arguments: {:?}", args);

    let catalog = open_catalog(&args.catalog)?;
    let mut filter = QueryFilter::new();
    filter.bbox = args.bbox;
    filter.time_range = args.datetime;
    let collections = catalog.search_collections(&filter);

    let output = match args.output_format {
        OutputFormat::Human => generate_human_collection_list(&collections),
        OutputFormat::Json => generate_json_collection_list(&collections)?,
        OutputFormat::Csv => generate_csv_collection_list(&collections),
    };
    println!("{}", output);

    Ok(CommandStats {
        collections: collections.len(),
        items: collections.iter().map(|c| c.item_count()).sum(),
        elapsed: start_time.elapsed(),
        ..Default::default()
    })
}

pub(crate) fn generate_human_collection_list(collections: &[Arc<Collection>]) -> String {
    let mut output = format!(
        "📚 STAC Collections\n\
         ===================\n\
         📦 Collections: {}\n\
         \n",
        collections.len()
    );

    if collections.is_empty() {
        output.push_str("No collections found.\n");
        return output;
    }

    for collection in collections {
        let stale = if collection.is_extent_stale() {
            format!(" {}", "(extent stale)".yellow())
        } else {
            String::new()
        };
        output.push_str(&format!(
            "  {} {}{}\n",
            collection.id().bold(),
            collection.title.as_deref().unwrap_or("").dimmed(),
            stale
        ));
        output.push_str(&format!(
            "     items: {}  bbox: {}  time: {}\n",
            collection.item_count(),
            format_spatial(collection),
            format_interval(&collection.temporal_extent())
        ));
    }

    output
}

pub(crate) fn generate_json_collection_list(
    collections: &[Arc<Collection>],
) -> anyhow::Result<String> {
    let stac: Vec<_> = collections.iter().map(|c| to_stac_collection(c)).collect();
    let report = json!({
        "collections": stac,
        "numberReturned": stac.len(),
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

pub(crate) fn generate_csv_collection_list(collections: &[Arc<Collection>]) -> String {
    let mut csv = String::from(
        "id,title,license,items,min_x,min_y,max_x,max_y,start,end,extent_stale\n",
    );

    for collection in collections {
        let [min_x, min_y, max_x, max_y] = collection
            .spatial_extent()
            .map(|b| b.to_array().map(|v| v.to_string()))
            .unwrap_or_else(|| std::array::from_fn(|_| String::new()));
        let extent = collection.temporal_extent();

        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            csv_escape(collection.id()),
            csv_escape(collection.title.as_deref().unwrap_or("")),
            csv_escape(&collection.license),
            collection.item_count(),
            min_x,
            min_y,
            max_x,
            max_y,
            extent.start.map(|t| format_time(Some(t))).unwrap_or_default(),
            extent.end.map(|t| format_time(Some(t))).unwrap_or_default(),
            collection.is_extent_stale()
        ));
    }

    csv
}

// =============================================================================
// show
// =============================================================================

/// Show a collection, its items, or a single item
pub fn run_show(args: ShowArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);
    debug!("Show arguments: {:?}", args);

    let catalog = open_catalog(&args.catalog)?;
    let collection = catalog.get_collection(&args.collection_id)?;

    let (output, items) = match &args.item_id {
        Some(item_id) => {
            let item = catalog.get_item(&args.collection_id, item_id)?;
            (generate_item_report(&item, args.output_format)?, 1)
        }
        None => (
            generate_collection_report(&collection, args.list_items, args.output_format)?,
            collection.item_count(),
        ),
    };
    println!("{}", output);

    Ok(CommandStats {
        collections: 1,
        items,
        elapsed: start_time.elapsed(),
        ..Default::default()
    })
}

pub(crate) fn generate_collection_report(
    collection: &Collection,
    list_items: bool,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            if list_items {
                let report = json!({
                    "collection": to_stac_collection(collection),
                    "items": to_item_collection(collection.items(), None, Vec::new()),
                });
                Ok(serde_json::to_string_pretty(&report)?)
            } else {
                Ok(serde_json::to_string_pretty(&to_stac_collection(collection))?)
            }
        }
        OutputFormat::Csv => Ok(generate_csv_item_list(collection.items())),
        OutputFormat::Human => {
            let mut output = format!(
                "📦 Collection {}\n\
                 ============{}\n\
                 📝 Title: {}\n\
                 📄 License: {}\n\
                 🗺️  Spatial extent: {}\n\
                 🕒 Temporal extent: {}\n\
                 🛰️  Items: {}\n\
                 🔗 Links: {}\n",
                collection.id().bold(),
                "=".repeat(collection.id().len()),
                collection.title.as_deref().unwrap_or("-"),
                collection.license,
                format_spatial(collection),
                format_interval(&collection.temporal_extent()),
                collection.item_count(),
                collection.links().len()
            );

            if collection.is_extent_stale() {
                output.push_str(&format!(
                    "{}\n",
                    "⚠️  Extents are stale; items changed in place since the last recomputation"
                        .yellow()
                ));
            }
            if !collection.description.is_empty() {
                output.push_str(&format!("\n{}\n", collection.description));
            }
            if !collection.keywords().is_empty() {
                output.push_str(&format!("\n🏷️  Keywords: {}\n", collection.keywords().join(", ")));
            }
            for provider in collection.providers() {
                output.push_str(&format!("🏢 Provider: {}\n", provider.name));
            }
            if !collection.properties().is_empty() {
                output.push_str("\n📋 Properties:\n");
                for (key, value) in collection.properties() {
                    output.push_str(&format!("   {} = {}\n", key, value));
                }
            }
            if list_items && !collection.items().is_empty() {
                output.push_str("\n🛰️  Items:\n");
                let mut items: Vec<&Arc<Item>> = collection.items().iter().collect();
                items.sort_by(|a, b| a.id().cmp(b.id()));
                for item in items {
                    output.push_str(&format!("   {}\n", describe_item(item)));
                }
            }
            Ok(output)
        }
    }
}

pub(crate) fn generate_item_report(item: &Item, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&to_stac_item(item))?),
        OutputFormat::Csv => Ok(generate_csv_item_list(std::slice::from_ref(&Arc::new(
            item.clone(),
        )))),
        OutputFormat::Human => {
            let mut output = format!(
                "🛰️  Item {}\n\
                 📦 Collection: {}\n\
                 🗺️  Geometry: {}\n\
                 🕒 Time: {}\n\
                 🧾 Created: {}  Updated: {}\n",
                item.id().bold(),
                item.collection().unwrap_or("-"),
                item.geometry
                    .as_ref()
                    .map(|g| g.type_name())
                    .unwrap_or("none"),
                describe_time(item),
                format_time(Some(item.meta().created)),
                format_time(Some(item.meta().updated)),
            );
            if !item.assets.is_empty() {
                output.push_str("\n📎 Assets:\n");
                for (name, asset) in &item.assets {
                    output.push_str(&format!("   {} -> {}\n", name, asset.href));
                }
            }
            if !item.properties().is_empty() {
                output.push_str("\n📋 Properties:\n");
                for (key, value) in item.properties() {
                    output.push_str(&format!("   {} = {}\n", key, value));
                }
            }
            if !item.links().is_empty() {
                output.push_str("\n🔗 Links:\n");
                for link in item.links() {
                    output.push_str(&format!("   {} -> {}\n", link.rel, link.href));
                }
            }
            Ok(output)
        }
    }
}

pub(crate) fn generate_csv_item_list(items: &[Arc<Item>]) -> String {
    let mut csv = String::from("collection,id,geometry,min_x,min_y,max_x,max_y,start,end\n");

    for item in items {
        let [min_x, min_y, max_x, max_y] = item
            .geometry
            .as_ref()
            .and_then(|g| g.bbox())
            .map(|b| b.to_array().map(|v| v.to_string()))
            .unwrap_or_else(|| std::array::from_fn(|_| String::new()));

        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            csv_escape(item.collection().unwrap_or("")),
            csv_escape(item.id()),
            item.geometry.as_ref().map(|g| g.type_name()).unwrap_or(""),
            min_x,
            min_y,
            max_x,
            max_y,
            item.time.map(|t| format_time(Some(t.start()))).unwrap_or_default(),
            item.time.map(|t| format_time(Some(t.end()))).unwrap_or_default(),
        ));
    }

    csv
}

/// One-line item summary for human reports
pub(crate) fn describe_item(item: &Item) -> String {
    let bbox = item
        .geometry
        .as_ref()
        .and_then(|g| g.bbox())
        .map(|b| format!("{:?}", b.to_array()))
        .unwrap_or_else(|| "-".to_string());
    format!("{:<24} {:<40} {}", item.id(), bbox, describe_time(item))
}

fn describe_time(item: &Item) -> String {
    match item.time {
        Some(t) if t.start() == t.end() => format_time(Some(t.start())),
        Some(t) => format!("{}/{}", format_time(Some(t.start())), format_time(Some(t.end()))),
        None => "-".to_string(),
    }
}

// =============================================================================
// create / delete
// =============================================================================

/// Create an empty collection
pub fn run_create(args: CreateArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);
    debug!("Create arguments: {:?}", args);

    let catalog = open_catalog(&args.catalog)?;
    let collection = create_from_args(&catalog, &args)?;

    println!(
        "{} Created collection {}",
        "✅".green(),
        collection.id().bold()
    );
    catalog.close();

    Ok(CommandStats {
        collections: 1,
        elapsed: start_time.elapsed(),
        ..Default::default()
    })
}

pub(crate) fn create_from_args(
    catalog: &Catalog,
    args: &CreateArgs,
) -> anyhow::Result<Arc<Collection>> {
    let mut spec = CollectionSpec::new(args.collection_id.clone())
        .with_description(args.description.clone());
    if let Some(title) = &args.title {
        spec = spec.with_title(title.clone());
    }
    if let Some(license) = &args.license {
        spec = spec.with_license(license.clone());
    }
    for keyword in &args.keywords {
        spec = spec.with_keyword(keyword.clone());
    }
    for kv in &args.properties {
        spec = spec.with_property(kv.key.clone(), kv.value.clone());
    }

    Ok(catalog.create_collection(spec)?)
}

/// Delete a collection with all its items, or a single item
pub fn run_delete(args: DeleteArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);
    debug!("Delete arguments: {:?}", args);

    let catalog = open_catalog(&args.catalog)?;

    let stats = match &args.item_id {
        Some(item_id) => {
            catalog.delete_item(&args.collection_id, item_id)?;
            println!(
                "{} Deleted item {}/{}",
                "🗑️ ".red(),
                args.collection_id,
                item_id.bold()
            );
            CommandStats {
                items: 1,
                ..Default::default()
            }
        }
        None => {
            let removed = catalog.delete_collection(&args.collection_id)?;
            println!(
                "{} Deleted collection {} and {} items",
                "🗑️ ".red(),
                removed.id().bold(),
                removed.item_count()
            );
            CommandStats {
                collections: 1,
                items: removed.item_count(),
                ..Default::default()
            }
        }
    };
    catalog.close();

    Ok(CommandStats {
        elapsed: start_time.elapsed(),
        ..stats
    })
}

// =============================================================================
// info
// =============================================================================

/// Summarize the catalog
pub fn run_info(args: InfoArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);

    let catalog = open_catalog(&args.catalog)?;
    let snapshot = catalog.snapshot();
    let output = generate_info_report(&catalog, &snapshot, args.output_format)?;
    println!("{}", output);
    info!("Catalog summary generated");

    Ok(CommandStats {
        collections: snapshot.collection_count(),
        items: snapshot.item_count(),
        elapsed: start_time.elapsed(),
        ..Default::default()
    })
}

pub(crate) fn generate_info_report(
    catalog: &Catalog,
    snapshot: &CatalogSnapshot,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let stats = snapshot.statistics();
    let config = catalog.config();

    match format {
        OutputFormat::Json => {
            let report = json!({
                "catalog_dir": config.catalog_dir,
                "item_id_scope": config.item_id_scope,
                "statistics": stats,
                "generated_at": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            });
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Csv => Ok(format!(
            "collections,items,collection_links,item_links,stale_collections\n{},{},{},{},{}\n",
            stats.collections,
            stats.items,
            stats.collection_links,
            stats.item_links,
            stats.stale_collections
        )),
        OutputFormat::Human => Ok(format!(
            "📊 STAC Catalog Report\n\
             ======================\n\
             📁 Catalog: {}\n\
             🔑 Item id scope: {}\n\
             📦 Collections: {}\n\
             🛰️  Items: {}\n\
             🔗 Links: {} on collections, {} on items\n\
             ⚠️  Stale extents: {}\n",
            config.catalog_dir.display(),
            config.item_id_scope,
            stats.collections,
            stats.items,
            stats.collection_links,
            stats.item_links,
            stats.stale_collections
        )),
    }
}
