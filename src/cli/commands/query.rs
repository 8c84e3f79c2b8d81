//! Query command: spatio-temporal item search with cursor pagination

use super::collections::{describe_item, generate_csv_item_list};
use super::shared::{CommandStats, open_catalog, setup_logging};
use crate::app::models::Link;
use crate::app::services::query_engine::{QueryFilter, QueryPage};
use crate::app::services::stac::to_item_collection;
use crate::cli::args::{OutputFormat, QueryArgs};
use colored::*;
use std::time::Instant;
use tracing::{debug, info};

/// Run one page of an item query
pub fn run_query(args: QueryArgs) -> anyhow::Result<CommandStats> {
    let start_time = Instant::now();
    setup_logging(&args.catalog);
    debug!("Query arguments: {:?}", args);

    let catalog = open_catalog(&args.catalog)?;
    let filter = args.to_filter();
    let page = catalog.query(&filter)?;
    info!(
        "Query matched {} items, returning {}",
        page.number_matched,
        page.len()
    );

    let output = generate_query_report(&filter, &page, args.output_format)?;
    println!("{}", output);

    Ok(CommandStats {
        items: page.len(),
        elapsed: start_time.elapsed(),
        ..Default::default()
    })
}

pub(crate) fn generate_query_report(
    filter: &QueryFilter,
    page: &QueryPage,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut links = Vec::new();
            if let Some(cursor) = &page.next_cursor {
                links.push(Link::new("next", format!("?cursor={}", cursor))?);
            }
            let collection = to_item_collection(&page.items, Some(page.number_matched), links);
            Ok(serde_json::to_string_pretty(&collection)?)
        }
        OutputFormat::Csv => Ok(generate_csv_item_list(&page.items)),
        OutputFormat::Human => {
            let mut output = format!(
                "🔎 Query Results\n\
                 ================\n\
                 🎯 Matched: {}  Returned: {}  Sort: {} {}\n\
                 \n",
                page.number_matched,
                page.len(),
                filter.sort,
                filter.direction
            );

            if page.is_empty() {
                output.push_str("No items matched.\n");
            }

            for item in &page.items {
                output.push_str(&format!(
                    "  {:<16} {}\n",
                    item.collection().unwrap_or("-").cyan(),
                    describe_item(item)
                ));
            }

            if let Some(cursor) = &page.next_cursor {
                output.push_str(&format!("\n➡️  More results: --cursor {}\n", cursor.bold()));
            }
            Ok(output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::temporal::parse_datetime;
    use crate::app::models::{Bbox, CollectionSpec, ItemSpec, ItemTime};
    use crate::app::services::catalog::Catalog;
    use crate::config::CatalogConfig;

    fn catalog() -> Catalog {
        let catalog = Catalog::in_memory(CatalogConfig::default()).unwrap();
        catalog.create_collection(CollectionSpec::new("sat-2024")).unwrap();
        for (id, x, day) in [("I1", 0.0, "2024-01-01"), ("I2", 5.0, "2024-06-01")] {
            catalog
                .create_item(
                    "sat-2024",
                    ItemSpec::new(id)
                        .with_geometry(Bbox::new(x, x, x + 1.0, x + 1.0).unwrap().to_polygon())
                        .with_time(ItemTime::Instant(parse_datetime(day).unwrap())),
                )
                .unwrap();
        }
        catalog
    }

    #[test]
    fn test_json_report_is_feature_collection_with_next_link() {
        let catalog = catalog();
        let filter = QueryFilter::new().with_limit(1);
        let page = catalog.query(&filter).unwrap();

        let json = generate_query_report(&filter, &page, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["numberMatched"], 2);
        assert_eq!(value["numberReturned"], 1);
        assert_eq!(value["features"][0]["id"], "I1");
        assert_eq!(value["links"][0]["rel"], "next");
    }

    #[test]
    fn test_human_report_without_more_pages() {
        colored::control::set_override(false);
        let catalog = catalog();
        let filter = QueryFilter::new().with_bbox(Bbox::new(0.0, 0.0, 2.0, 2.0).unwrap());
        let page = catalog.query(&filter).unwrap();

        let report = generate_query_report(&filter, &page, OutputFormat::Human).unwrap();
        assert!(report.contains("Matched: 1"));
        assert!(report.contains("I1"));
        assert!(!report.contains("I2"));
        assert!(!report.contains("--cursor"));
    }

    #[test]
    fn test_csv_report_rows() {
        let catalog = catalog();
        let filter = QueryFilter::new();
        let page = catalog.query(&filter).unwrap();
        let csv = generate_query_report(&filter, &page, OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("sat-2024,I1,Polygon,0,0,1,1,2024-01-01T00:00:00Z"));
    }
}
