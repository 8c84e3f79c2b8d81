//! Shared test utilities and fixtures for catalog repository tests

use super::{Catalog, CatalogStore, MemoryStore};
use crate::app::models::{Bbox, Collection, CollectionSpec, ItemSpec, ItemTime};
use crate::app::models::temporal::parse_datetime;
use crate::config::{CatalogConfig, ItemIdScope};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub mod metadata_tests;
pub mod store_tests;

pub fn ts(value: &str) -> DateTime<Utc> {
    parse_datetime(value).unwrap()
}

/// Item spec with a rectangular footprint and a single timestamp
pub fn bbox_item(id: &str, bbox: [f64; 4], time: &str) -> ItemSpec {
    ItemSpec::new(id)
        .with_geometry(
            Bbox::new(bbox[0], bbox[1], bbox[2], bbox[3])
                .unwrap()
                .to_polygon(),
        )
        .with_time(ItemTime::Instant(ts(time)))
}

pub fn test_config() -> CatalogConfig {
    CatalogConfig::default()
}

/// In-memory catalog with collection "sat-2024" holding I1 and I2
pub fn sat_2024_catalog(scope: ItemIdScope) -> Catalog {
    let catalog = Catalog::in_memory(test_config().with_item_id_scope(scope)).unwrap();
    catalog
        .create_collection(CollectionSpec::new("sat-2024").with_title("Satellite 2024"))
        .unwrap();
    catalog
        .create_item("sat-2024", bbox_item("I1", [0.0, 0.0, 1.0, 1.0], "2024-01-01"))
        .unwrap();
    catalog
        .create_item("sat-2024", bbox_item("I2", [5.0, 5.0, 6.0, 6.0], "2024-06-01"))
        .unwrap();
    catalog
}

/// Memory store whose writes can be made to fail on demand
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    /// Store plus the switch that controls it
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let store = Self::default();
        let switch = Arc::clone(&store.fail_writes);
        (store, switch)
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::io(
                "simulated write failure",
                std::io::Error::other("disk unavailable"),
            ));
        }
        Ok(())
    }
}

impl CatalogStore for FlakyStore {
    fn load_all(&self) -> Result<Vec<Collection>> {
        self.inner.load_all()
    }

    fn save_collection(&self, collection: &Collection) -> Result<()> {
        self.check()?;
        self.inner.save_collection(collection)
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        self.check()?;
        self.inner.delete_collection(collection_id)
    }

    fn describe(&self) -> String {
        "flaky test store".to_string()
    }
}

/// Memory store that counts persisted collection writes
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    saves: Arc<AtomicUsize>,
}

impl CountingStore {
    /// Store plus its save counter
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let store = Self::default();
        let saves = Arc::clone(&store.saves);
        (store, saves)
    }
}

impl CatalogStore for CountingStore {
    fn load_all(&self) -> Result<Vec<Collection>> {
        self.inner.load_all()
    }

    fn save_collection(&self, collection: &Collection) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_collection(collection)
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        self.inner.delete_collection(collection_id)
    }

    fn describe(&self) -> String {
        "counting test store".to_string()
    }
}
