//! Tests for the directory and in-memory stores

use super::*;
use crate::app::models::Link;
use crate::app::services::catalog::DirectoryStore;
use std::fs;
use tempfile::TempDir;

fn dir_config(dir: &TempDir) -> CatalogConfig {
    test_config().with_catalog_dir(dir.path().join("catalog"))
}

#[test]
fn test_directory_catalog_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let catalog = Catalog::open_dir(dir_config(&temp_dir)).unwrap();
        catalog
            .create_collection(CollectionSpec::new("sat-2024").with_keyword("optical"))
            .unwrap();
        catalog
            .create_item("sat-2024", bbox_item("I1", [0.0, 0.0, 1.0, 1.0], "2024-01-01"))
            .unwrap();
        catalog
            .add_item_link(
                "sat-2024",
                "I1",
                Link::new("via", "https://example.com/I1").unwrap(),
            )
            .unwrap();
        catalog
            .set_collection_property("sat-2024", "mission", "sentinel-2")
            .unwrap();
        catalog.close();
    }

    let reopened = Catalog::open_dir(dir_config(&temp_dir)).unwrap();
    let collection = reopened.get_collection("sat-2024").unwrap();
    assert_eq!(collection.keywords(), ["optical"]);
    assert_eq!(collection.property("mission"), Some("sentinel-2"));
    assert_eq!(
        collection.spatial_extent().unwrap().to_array(),
        [0.0, 0.0, 1.0, 1.0]
    );

    let item = reopened.get_item("sat-2024", "I1").unwrap();
    assert_eq!(item.collection(), Some("sat-2024"));
    assert_eq!(item.links().len(), 1);
    assert!(collection.verify().is_ok());
}

#[test]
fn test_internal_ids_are_stable_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = Catalog::open_dir(dir_config(&temp_dir)).unwrap();
    catalog.create_collection(CollectionSpec::new("c")).unwrap();
    let item = catalog
        .create_item("c", bbox_item("x", [0.0, 0.0, 1.0, 1.0], "2024-01-01"))
        .unwrap();
    let collection_meta = catalog.get_collection("c").unwrap().meta().clone();
    drop(catalog);

    let reopened = Catalog::open_dir(dir_config(&temp_dir)).unwrap();
    assert_eq!(reopened.get_item("c", "x").unwrap().meta(), item.meta());
    assert_eq!(reopened.get_collection("c").unwrap().meta(), &collection_meta);
}

#[test]
fn test_delete_collection_removes_document() {
    let temp_dir = TempDir::new().unwrap();
    let config = dir_config(&temp_dir);
    let catalog = Catalog::open_dir(config.clone()).unwrap();
    catalog.create_collection(CollectionSpec::new("c")).unwrap();

    let path = config.catalog_dir.join("c.json");
    assert!(path.exists());

    catalog.delete_collection("c").unwrap();
    assert!(!path.exists());

    let reopened = Catalog::open_dir(config).unwrap();
    assert!(reopened.get_collection("c").unwrap_err().is_not_found());
}

#[test]
fn test_compact_and_pretty_output() {
    let temp_dir = TempDir::new().unwrap();
    let collection = Collection::from_spec(CollectionSpec::new("c")).unwrap();

    let pretty = DirectoryStore::open(temp_dir.path().join("pretty"), true).unwrap();
    pretty.save_collection(&collection).unwrap();
    let text = fs::read_to_string(pretty.document_path("c")).unwrap();
    assert!(text.contains('\n'));

    let compact = DirectoryStore::open(temp_dir.path().join("compact"), false).unwrap();
    compact.save_collection(&collection).unwrap();
    let text = fs::read_to_string(compact.document_path("c")).unwrap();
    assert!(!text.contains('\n'));
    assert!(text.contains("\"stac_version\":\"1.0.0\""));
}

#[test]
fn test_load_skips_foreign_files() {
    let temp_dir = TempDir::new().unwrap();
    let store = DirectoryStore::open(temp_dir.path(), true).unwrap();
    store
        .save_collection(&Collection::from_spec(CollectionSpec::new("c")).unwrap())
        .unwrap();

    fs::write(temp_dir.path().join("notes.txt"), "not a collection").unwrap();
    fs::create_dir(temp_dir.path().join("nested")).unwrap();
    fs::write(temp_dir.path().join("nested").join("x.json"), "{}").unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), "c");
}

#[test]
fn test_load_rejects_corrupt_or_misnamed_documents() {
    let temp_dir = TempDir::new().unwrap();
    let store = DirectoryStore::open(temp_dir.path(), true).unwrap();
    store
        .save_collection(&Collection::from_spec(CollectionSpec::new("c")).unwrap())
        .unwrap();

    fs::copy(store.document_path("c"), temp_dir.path().join("renamed.json")).unwrap();
    assert!(store.load_all().unwrap_err().is_validation());
    fs::remove_file(temp_dir.path().join("renamed.json")).unwrap();

    fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();
    assert!(matches!(
        store.load_all(),
        Err(Error::Serialization { .. })
    ));
}

#[test]
fn test_deleting_absent_document_is_not_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = DirectoryStore::open(temp_dir.path(), true).unwrap();
    store.delete_collection("never-saved").unwrap();
}

#[test]
fn test_memory_store_round_trip() {
    let store = MemoryStore::new();
    assert!(store.is_empty());

    let mut collection = Collection::from_spec(CollectionSpec::new("c")).unwrap();
    collection
        .add_item(crate::Item::from_spec(bbox_item("x", [0.0, 0.0, 1.0, 1.0], "2024-01-01")).unwrap())
        .unwrap();
    store.save_collection(&collection).unwrap();
    assert!(store.contains("c"));

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded[0].item("x").unwrap().meta(), collection.item("x").unwrap().meta());

    store.delete_collection("c").unwrap();
    assert_eq!(store.len(), 0);
}
