//! Tests for item matching, ordering and collection search

use super::*;
use crate::app::models::{Geometry, TemporalExtent};
use crate::app::services::query_engine::{QueryFilter, SortDirection, SortKey};

#[test]
fn test_bbox_query_returns_intersecting_items() {
    let catalog = sat_2024_catalog();
    let page = catalog
        .query(&QueryFilter::new().with_bbox(bbox([0.0, 0.0, 2.0, 2.0])))
        .unwrap();
    assert_eq!(ids(&page), ["I1"]);
    assert_eq!(page.number_matched, 1);
    assert!(page.next_cursor.is_none());
}

#[test]
fn test_time_range_query_returns_overlapping_items() {
    let catalog = sat_2024_catalog();
    let window = TemporalExtent::new(Some(ts("2024-05-01")), Some(ts("2024-07-01"))).unwrap();
    let page = catalog
        .query(&QueryFilter::new().with_time_range(window))
        .unwrap();
    assert_eq!(ids(&page), ["I2"]);
}

#[test]
fn test_empty_filter_returns_everything_by_id() {
    let catalog = sat_2024_catalog();
    let page = catalog.query(&QueryFilter::new()).unwrap();
    assert_eq!(ids(&page), ["I1", "I2"]);
    assert_eq!(page.number_matched, 2);
}

#[test]
fn test_no_match_is_an_empty_page() {
    let catalog = sat_2024_catalog();
    let page = catalog
        .query(&QueryFilter::new().with_bbox(bbox([100.0, 10.0, 110.0, 20.0])))
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.number_matched, 0);

    let page = catalog
        .query(&QueryFilter::new().in_collection("no-such-collection"))
        .unwrap();
    assert!(page.is_empty());
}

#[test]
fn test_half_open_time_semantics() {
    let catalog = sat_2024_catalog();

    // Window ending exactly at I2's instant excludes it
    let window = TemporalExtent::new(Some(ts("2024-05-01")), Some(ts("2024-06-01"))).unwrap();
    let page = catalog.query(&QueryFilter::new().with_time_range(window)).unwrap();
    assert!(page.is_empty());

    // Window starting exactly at I2's instant includes it
    let window = TemporalExtent::new(Some(ts("2024-06-01")), Some(ts("2024-06-02"))).unwrap();
    let page = catalog.query(&QueryFilter::new().with_time_range(window)).unwrap();
    assert_eq!(ids(&page), ["I2"]);

    // Zero-width window at the instant
    let window: TemporalExtent = "2024-06-01T00:00:00Z".parse().unwrap();
    let page = catalog.query(&QueryFilter::new().with_time_range(window)).unwrap();
    assert_eq!(ids(&page), ["I2"]);

    // Open start
    let window: TemporalExtent = "../2024-02-01".parse().unwrap();
    let page = catalog.query(&QueryFilter::new().with_time_range(window)).unwrap();
    assert_eq!(ids(&page), ["I1"]);
}

#[test]
fn test_range_items_overlap_rule() {
    let catalog = sat_2024_catalog();
    catalog
        .create_item(
            "sat-2024",
            ItemSpec::new("R1").with_time(
                ItemTime::range(ts("2024-03-01"), ts("2024-04-01")).unwrap(),
            ),
        )
        .unwrap();

    let touching = TemporalExtent::new(Some(ts("2024-04-01")), Some(ts("2024-04-15"))).unwrap();
    assert!(
        catalog
            .query(&QueryFilter::new().with_time_range(touching))
            .unwrap()
            .is_empty()
    );

    let inside = TemporalExtent::new(Some(ts("2024-03-10")), Some(ts("2024-03-11"))).unwrap();
    assert_eq!(
        ids(&catalog.query(&QueryFilter::new().with_time_range(inside)).unwrap()),
        ["R1"]
    );
}

#[test]
fn test_items_without_geometry_or_time_never_match_those_filters() {
    let catalog = sat_2024_catalog();
    catalog
        .create_item("sat-2024", ItemSpec::new("bare"))
        .unwrap();

    let page = catalog
        .query(&QueryFilter::new().with_bbox(bbox([-180.0, -90.0, 180.0, 90.0])))
        .unwrap();
    assert_eq!(ids(&page), ["I1", "I2"]);

    let page = catalog
        .query(&QueryFilter::new().with_time_range(TemporalExtent::new(None, Some(ts("2030-01-01"))).unwrap()))
        .unwrap();
    assert_eq!(ids(&page), ["I1", "I2"]);

    assert_eq!(catalog.query(&QueryFilter::new()).unwrap().len(), 3);
}

#[test]
fn test_exact_geometry_intersection_not_envelope() {
    let catalog = sat_2024_catalog();
    // Diagonal line whose envelope covers the query box but which misses it
    catalog
        .create_item(
            "sat-2024",
            ItemSpec::new("diagonal").with_geometry(Geometry::LineString(vec![
                [10.0, 10.0],
                [20.0, 20.0],
            ])),
        )
        .unwrap();

    let page = catalog
        .query(&QueryFilter::new().with_bbox(bbox([18.0, 10.0, 20.0, 12.0])))
        .unwrap();
    assert!(page.is_empty());

    let page = catalog
        .query(&QueryFilter::new().with_bbox(bbox([14.0, 14.0, 16.0, 16.0])))
        .unwrap();
    assert_eq!(ids(&page), ["diagonal"]);
}

#[test]
fn test_property_predicates() {
    let catalog = sat_2024_catalog();
    catalog
        .set_item_property("sat-2024", "I1", "platform", "sentinel-2a")
        .unwrap();
    catalog
        .set_item_property("sat-2024", "I2", "platform", "sentinel-2b")
        .unwrap();
    catalog
        .set_item_property("sat-2024", "I2", "level", "L2A")
        .unwrap();

    let page = catalog
        .query(&QueryFilter::new().with_property("platform", "sentinel-2b"))
        .unwrap();
    assert_eq!(ids(&page), ["I2"]);

    let page = catalog
        .query(
            &QueryFilter::new()
                .with_property("platform", "sentinel-2a")
                .with_property("level", "L2A"),
        )
        .unwrap();
    assert!(page.is_empty());

    // Case-sensitive exact equality
    let page = catalog
        .query(&QueryFilter::new().with_property("platform", "Sentinel-2A"))
        .unwrap();
    assert!(page.is_empty());
}

#[test]
fn test_collection_and_id_restrictions() {
    let catalog = sat_2024_catalog();
    catalog
        .create_collection(crate::app::models::CollectionSpec::new("aerial"))
        .unwrap();
    catalog
        .create_item("aerial", bbox_item("A1", [0.5, 0.5, 0.6, 0.6], "2024-01-02"))
        .unwrap();
    catalog
        .create_item("aerial", bbox_item("I1", [0.5, 0.5, 0.6, 0.6], "2024-01-02"))
        .unwrap();

    let page = catalog.query(&QueryFilter::new().in_collection("aerial")).unwrap();
    assert_eq!(ids(&page), ["A1", "I1"]);

    // Same id in two collections: tie broken by collection id
    let page = catalog.query(&QueryFilter::new().with_id("I1")).unwrap();
    let owners: Vec<&str> = page
        .items
        .iter()
        .map(|item| item.collection().unwrap())
        .collect();
    assert_eq!(owners, ["aerial", "sat-2024"]);
}

#[test]
fn test_datetime_sort_both_directions() {
    let catalog = sat_2024_catalog();
    catalog
        .create_item("sat-2024", bbox_item("A0", [2.0, 2.0, 3.0, 3.0], "2024-03-01"))
        .unwrap();

    let page = catalog
        .query(&QueryFilter::new().sorted_by(SortKey::Datetime, SortDirection::Asc))
        .unwrap();
    assert_eq!(ids(&page), ["I1", "A0", "I2"]);

    let page = catalog
        .query(&QueryFilter::new().sorted_by(SortKey::Datetime, SortDirection::Desc))
        .unwrap();
    assert_eq!(ids(&page), ["I2", "A0", "I1"]);

    let page = catalog
        .query(&QueryFilter::new().sorted_by(SortKey::Id, SortDirection::Desc))
        .unwrap();
    assert_eq!(ids(&page), ["I2", "I1", "A0"]);
}

#[test]
fn test_stale_collection_is_not_pruned() {
    let catalog = sat_2024_catalog();
    catalog
        .update_item("sat-2024", "I1", |item| {
            item.geometry = Some(Geometry::Point([50.0, 50.0]));
            Ok(())
        })
        .unwrap();

    // Recorded extent still says [0,0,6,6], but the item moved
    let page = catalog
        .query(&QueryFilter::new().with_bbox(bbox([49.0, 49.0, 51.0, 51.0])))
        .unwrap();
    assert_eq!(ids(&page), ["I1"]);
}

#[test]
fn test_search_collections_by_extent_and_property() {
    let catalog = sat_2024_catalog();
    catalog
        .create_collection(crate::app::models::CollectionSpec::new("empty"))
        .unwrap();
    catalog
        .create_collection(
            crate::app::models::CollectionSpec::new("europe").with_property("region", "eu"),
        )
        .unwrap();
    catalog
        .create_item("europe", bbox_item("E1", [5.0, 45.0, 15.0, 55.0], "2023-07-01"))
        .unwrap();

    let found = catalog.search_collections(&QueryFilter::new());
    assert_eq!(found.len(), 3);

    let found = catalog.search_collections(&QueryFilter::new().with_bbox(bbox([0.0, 0.0, 2.0, 2.0])));
    let found_ids: Vec<&str> = found.iter().map(|c| c.id()).collect();
    assert_eq!(found_ids, ["sat-2024"]);

    let window = TemporalExtent::new(Some(ts("2023-01-01")), Some(ts("2023-12-31"))).unwrap();
    let found = catalog.search_collections(&QueryFilter::new().with_time_range(window));
    let found_ids: Vec<&str> = found.iter().map(|c| c.id()).collect();
    assert_eq!(found_ids, ["europe"]);

    let found = catalog.search_collections(&QueryFilter::new().with_property("region", "eu"));
    assert_eq!(found.len(), 1);
}
