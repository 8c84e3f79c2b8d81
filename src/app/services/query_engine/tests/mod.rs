//! Shared test utilities and fixtures for query engine tests

use crate::app::models::temporal::parse_datetime;
use crate::app::models::{Bbox, CollectionSpec, ItemSpec, ItemTime};
use crate::app::services::catalog::Catalog;
use crate::config::CatalogConfig;
use chrono::{DateTime, Utc};

pub mod property_tests;
pub mod query_tests;

pub fn ts(value: &str) -> DateTime<Utc> {
    parse_datetime(value).unwrap()
}

pub fn bbox(coords: [f64; 4]) -> Bbox {
    Bbox::new(coords[0], coords[1], coords[2], coords[3]).unwrap()
}

pub fn bbox_item(id: &str, coords: [f64; 4], time: &str) -> ItemSpec {
    ItemSpec::new(id)
        .with_geometry(bbox(coords).to_polygon())
        .with_time(ItemTime::Instant(ts(time)))
}

/// Collection "sat-2024" with I1 ([0,0,1,1], 2024-01-01) and I2 ([5,5,6,6], 2024-06-01)
pub fn sat_2024_catalog() -> Catalog {
    let catalog = Catalog::in_memory(CatalogConfig::default()).unwrap();
    catalog
        .create_collection(CollectionSpec::new("sat-2024"))
        .unwrap();
    // Inserted out of id order on purpose
    catalog
        .create_item("sat-2024", bbox_item("I2", [5.0, 5.0, 6.0, 6.0], "2024-06-01"))
        .unwrap();
    catalog
        .create_item("sat-2024", bbox_item("I1", [0.0, 0.0, 1.0, 1.0], "2024-01-01"))
        .unwrap();
    catalog
}

pub fn ids(page: &crate::app::services::query_engine::QueryPage) -> Vec<String> {
    page.items.iter().map(|item| item.id().to_string()).collect()
}
