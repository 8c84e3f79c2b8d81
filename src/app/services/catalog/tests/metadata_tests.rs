//! Tests for links, properties, keywords and providers committed through the catalog

use super::*;
use crate::app::models::{Link, Provider, ProviderRole};

#[test]
fn test_collection_links_add_and_remove() {
    let catalog = sat_2024_catalog(ItemIdScope::Collection);
    let link = Link::new("license", "https://example.com/license")
        .unwrap()
        .with_title("License");

    catalog.add_collection_link("sat-2024", link).unwrap();
    assert_eq!(catalog.get_collection("sat-2024").unwrap().links().len(), 1);

    assert!(
        catalog
            .remove_collection_link("sat-2024", "license", "https://example.com/license")
            .unwrap()
    );
    assert!(
        !catalog
            .remove_collection_link("sat-2024", "license", "https://example.com/license")
            .unwrap()
    );
    assert!(catalog.get_collection("sat-2024").unwrap().links().is_empty());
}

#[test]
fn test_link_operations_on_missing_parents() {
    let catalog = sat_2024_catalog(ItemIdScope::Collection);
    let link = Link::new("via", "https://example.com").unwrap();

    assert!(
        catalog
            .add_collection_link("missing", link.clone())
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        catalog
            .add_item_link("sat-2024", "missing", link)
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        catalog
            .remove_item_link("sat-2024", "missing", "via", "https://example.com")
            .unwrap_err()
            .is_not_found()
    );
}

#[test]
fn test_item_links_do_not_stale_extents() {
    let catalog = sat_2024_catalog(ItemIdScope::Collection);
    catalog
        .add_item_link(
            "sat-2024",
            "I1",
            Link::new("alternate", "https://example.com/I1.html").unwrap(),
        )
        .unwrap();

    let item = catalog.get_item("sat-2024", "I1").unwrap();
    assert_eq!(item.links().len(), 1);
    assert!(!catalog.get_collection("sat-2024").unwrap().is_extent_stale());

    assert!(
        catalog
            .remove_item_link("sat-2024", "I1", "alternate", "https://example.com/I1.html")
            .unwrap()
    );
    assert!(catalog.get_item("sat-2024", "I1").unwrap().links().is_empty());
}

#[test]
fn test_collection_properties() {
    let catalog = sat_2024_catalog(ItemIdScope::Collection);
    assert_eq!(
        catalog
            .set_collection_property("sat-2024", "mission", "sentinel-2")
            .unwrap(),
        None
    );
    assert_eq!(
        catalog
            .set_collection_property("sat-2024", "mission", "landsat-9")
            .unwrap(),
        Some("sentinel-2".to_string())
    );
    assert_eq!(
        catalog.get_collection("sat-2024").unwrap().property("mission"),
        Some("landsat-9")
    );

    assert!(
        catalog
            .remove_collection_property("sat-2024", "mission")
            .unwrap()
            .is_some()
    );
    // Repeated removal never fails
    assert!(
        catalog
            .remove_collection_property("sat-2024", "mission")
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_item_properties() {
    let catalog = sat_2024_catalog(ItemIdScope::Collection);
    catalog
        .set_item_property("sat-2024", "I1", "platform", "s2a")
        .unwrap();
    catalog
        .extend_item_properties(
            "sat-2024",
            "I1",
            [("cloud_cover".to_string(), "3".to_string())],
        )
        .unwrap();

    let item = catalog.get_item("sat-2024", "I1").unwrap();
    assert_eq!(item.property("platform"), Some("s2a"));
    assert_eq!(item.property("cloud_cover"), Some("3"));

    assert!(
        catalog
            .set_item_property("sat-2024", "I1", "datetime", "2024-01-01")
            .unwrap_err()
            .is_validation()
    );
    assert_eq!(
        catalog
            .remove_item_property("sat-2024", "I1", "never-set")
            .unwrap(),
        None
    );
}

#[test]
fn test_keywords_and_providers() {
    let catalog = sat_2024_catalog(ItemIdScope::Collection);
    assert!(catalog.add_keyword("sat-2024", "optical").unwrap());
    assert!(!catalog.add_keyword("sat-2024", "optical").unwrap());
    assert!(catalog.add_keyword("sat-2024", "").unwrap_err().is_validation());

    let provider = Provider::new("ESA").unwrap().with_role(ProviderRole::Host);
    catalog.add_provider("sat-2024", provider.clone()).unwrap();
    catalog.add_provider("sat-2024", provider).unwrap();

    let collection = catalog.get_collection("sat-2024").unwrap();
    assert_eq!(collection.keywords(), ["optical"]);
    assert_eq!(collection.providers().len(), 2);

    assert!(catalog.remove_keyword("sat-2024", "optical").unwrap());
    assert!(!catalog.remove_keyword("sat-2024", "optical").unwrap());
}

#[test]
fn test_noop_removals_skip_persistence() {
    let (store, saves) = CountingStore::new();
    let catalog = Catalog::open(test_config(), Box::new(store)).unwrap();
    catalog
        .create_collection(CollectionSpec::new("sat-2024").with_property("mission", "s2"))
        .unwrap();
    catalog
        .create_item("sat-2024", bbox_item("I1", [0.0, 0.0, 1.0, 1.0], "2024-01-01"))
        .unwrap();
    let published = catalog.get_collection("sat-2024").unwrap();
    let before = saves.load(std::sync::atomic::Ordering::SeqCst);

    assert!(
        !catalog
            .remove_collection_link("sat-2024", "license", "https://example.com/license")
            .unwrap()
    );
    assert!(
        !catalog
            .remove_item_link("sat-2024", "I1", "via", "https://example.com")
            .unwrap()
    );
    assert_eq!(catalog.remove_collection_property("sat-2024", "absent").unwrap(), None);
    assert_eq!(catalog.remove_item_property("sat-2024", "I1", "absent").unwrap(), None);
    assert!(!catalog.remove_keyword("sat-2024", "absent").unwrap());

    assert_eq!(saves.load(std::sync::atomic::Ordering::SeqCst), before);
    assert!(Arc::ptr_eq(&published, &catalog.get_collection("sat-2024").unwrap()));

    // An actual removal still commits
    assert_eq!(
        catalog.remove_collection_property("sat-2024", "mission").unwrap(),
        Some("s2".to_string())
    );
    assert_eq!(saves.load(std::sync::atomic::Ordering::SeqCst), before + 1);
}
