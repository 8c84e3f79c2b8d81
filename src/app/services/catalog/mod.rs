//! Catalog repository: the single owner of all collections
//!
//! Readers work against immutable published snapshots and never block on
//! writers. Every mutation clones the affected collection, applies the
//! change, verifies the link graph, persists the new document and only then
//! publishes it. A failure at any step leaves the published catalog exactly
//! as it was.

use crate::app::models::{AnalysisResult, Collection, CollectionSpec, Item, ItemSpec};
use crate::config::{CatalogConfig, ItemIdScope};
use crate::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod analysis;
pub mod metadata;
pub mod snapshot;
pub mod store;

#[cfg(test)]
pub mod tests;

pub use snapshot::{CatalogSnapshot, CatalogStatistics};
pub use store::{CatalogStore, DirectoryStore, MemoryStore};

/// Published collections keyed by id
pub(crate) type CollectionMap = BTreeMap<String, Arc<Collection>>;

/// Concurrent catalog of collections, items and links
#[derive(Debug)]
pub struct Catalog {
    pub(crate) config: CatalogConfig,

    /// Persistence backend
    pub(crate) store: Box<dyn CatalogStore>,

    /// Currently published state; swapped wholesale on every commit
    pub(crate) collections: RwLock<Arc<CollectionMap>>,

    /// Serializes writers per collection id
    ///
    /// Entries are created only for ids that exist or are being created,
    /// and are never removed, so every writer of an id (including one that
    /// re-creates a deleted collection) contends on the same mutex.
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,

    /// Item id -> owning collection id, maintained only for global id scope
    item_owners: Mutex<HashMap<String, String>>,

    /// Analysis result records keyed by id
    pub(crate) analysis_results: RwLock<BTreeMap<String, AnalysisResult>>,

    opened_at: Instant,
}

impl Catalog {
    /// Open a catalog over a store, loading and verifying everything in it
    pub fn open(config: CatalogConfig, store: Box<dyn CatalogStore>) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let mut collections = CollectionMap::new();
        let mut item_owners = HashMap::new();

        for collection in store.load_all()? {
            collection.verify()?;

            if config.item_id_scope == ItemIdScope::Global {
                for item in collection.items() {
                    if let Some(owner) =
                        item_owners.insert(item.id().to_string(), collection.id().to_string())
                    {
                        return Err(Error::conflict(
                            "Item",
                            format!("{} (in '{}' and '{}')", item.id(), owner, collection.id()),
                        ));
                    }
                }
            }

            let id = collection.id().to_string();
            if collections.insert(id.clone(), Arc::new(collection)).is_some() {
                return Err(Error::conflict("Collection", id));
            }
        }

        info!(
            "Opened catalog with {} collections from {} in {:.2}s",
            collections.len(),
            store.describe(),
            start.elapsed().as_secs_f64()
        );

        Ok(Self {
            config,
            store,
            collections: RwLock::new(Arc::new(collections)),
            write_locks: Mutex::new(HashMap::new()),
            item_owners: Mutex::new(item_owners),
            analysis_results: RwLock::new(BTreeMap::new()),
            opened_at: Instant::now(),
        })
    }

    /// Open a catalog backed by the configured catalog directory
    pub fn open_dir(config: CatalogConfig) -> Result<Self> {
        let store = DirectoryStore::open(&config.catalog_dir, config.pretty_json)?;
        Self::open(config, Box::new(store))
    }

    /// Open an empty catalog that lives only in memory
    pub fn in_memory(config: CatalogConfig) -> Result<Self> {
        Self::open(config, Box::new(MemoryStore::new()))
    }

    /// Release the catalog; every commit has already been persisted
    pub fn close(self) {
        let snapshot = self.snapshot();
        info!(
            "Closed catalog ({} collections, {} items) after {:.2}s",
            snapshot.collection_count(),
            snapshot.item_count(),
            self.opened_at.elapsed().as_secs_f64()
        );
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Immutable view of the currently published state
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot::new(Arc::clone(&self.collections.read()))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get_collection(&self, collection_id: &str) -> Result<Arc<Collection>> {
        self.collections
            .read()
            .get(collection_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Collection", collection_id))
    }

    /// All collections ordered by id
    pub fn list_collections(&self) -> Vec<Arc<Collection>> {
        self.collections.read().values().cloned().collect()
    }

    pub fn contains_collection(&self, collection_id: &str) -> bool {
        self.collections.read().contains_key(collection_id)
    }

    pub fn get_item(&self, collection_id: &str, item_id: &str) -> Result<Arc<Item>> {
        self.get_collection(collection_id)?
            .item(item_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Item", format!("{}/{}", collection_id, item_id)))
    }

    /// Items of a collection in insertion order
    pub fn list_items(&self, collection_id: &str) -> Result<Vec<Arc<Item>>> {
        Ok(self.get_collection(collection_id)?.items().to_vec())
    }

    /// Every item with the given id, across all collections
    pub fn find_items(&self, item_id: &str) -> Vec<Arc<Item>> {
        self.collections
            .read()
            .values()
            .filter_map(|collection| collection.item(item_id).cloned())
            .collect()
    }

    // =========================================================================
    // Collections
    // =========================================================================

    /// Create an empty collection
    pub fn create_collection(&self, spec: CollectionSpec) -> Result<Arc<Collection>> {
        let collection = Collection::from_spec(spec)?;
        let id = collection.id().to_string();

        let lock = self.write_lock(&id);
        let _guard = lock.lock();

        if self.contains_collection(&id) {
            return Err(Error::conflict("Collection", id));
        }

        self.commit(collection)
            .inspect(|_| info!("Created collection '{}'", id))
    }

    /// Insert a fully built collection, such as one parsed from a STAC document
    ///
    /// Items already inside it are subject to the catalog's id scope.
    pub fn import_collection(&self, collection: Collection) -> Result<Arc<Collection>> {
        collection.verify()?;
        let id = collection.id().to_string();

        let lock = self.write_lock(&id);
        let _guard = lock.lock();

        if self.contains_collection(&id) {
            return Err(Error::conflict("Collection", id));
        }

        let item_ids: Vec<String> = collection.items().iter().map(|i| i.id().to_string()).collect();
        self.reserve_item_ids(&id, &item_ids)?;

        let result = self.commit(collection);
        if result.is_err() {
            self.release_item_ids(&item_ids);
        } else {
            info!("Imported collection '{}' with {} items", id, item_ids.len());
        }
        result
    }

    /// Delete a collection together with all of its items and links
    ///
    /// The cascade is a single document removal in the store, so it either
    /// happens entirely or not at all. Deleting again yields `NotFound`.
    pub fn delete_collection(&self, collection_id: &str) -> Result<Arc<Collection>> {
        let lock = self.existing_write_lock(collection_id)?;
        let _guard = lock.lock();

        let removed = self.get_collection(collection_id)?;
        self.store.delete_collection(collection_id)?;

        {
            let mut published = self.collections.write();
            Arc::make_mut(&mut published).remove(collection_id);
        }

        let item_ids: Vec<String> = removed.items().iter().map(|i| i.id().to_string()).collect();
        self.release_item_ids(&item_ids);

        info!(
            "Deleted collection '{}' with {} items",
            collection_id,
            item_ids.len()
        );
        Ok(removed)
    }

    /// Recompute the extents of a collection after in-place item edits
    pub fn refresh_extents(&self, collection_id: &str) -> Result<Arc<Collection>> {
        self.modify_collection(collection_id, |collection| {
            collection.recompute_extents();
            Ok(())
        })?;
        self.get_collection(collection_id)
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Create an item inside an existing collection
    ///
    /// Fails with `NotFound` if the collection is absent and `Conflict` if
    /// the id is taken within the configured scope. The collection's extents
    /// are recomputed as part of the same commit.
    pub fn create_item(&self, collection_id: &str, spec: ItemSpec) -> Result<Arc<Item>> {
        self.insert_item(collection_id, Item::from_spec(spec)?)
    }

    /// Insert an already built item, such as one parsed from a STAC document
    ///
    /// A back-reference naming another collection is rejected.
    pub fn insert_item(&self, collection_id: &str, item: Item) -> Result<Arc<Item>> {
        let item_id = item.id().to_string();
        self.insert_items(collection_id, vec![item])?
            .pop()
            .ok_or_else(|| Error::consistency(format!("item '{}' vanished on insert", item_id)))
    }

    /// Insert a batch of items in a single commit
    ///
    /// The batch is all or nothing: one invalid item or id conflict leaves
    /// the collection unchanged. Extents are recomputed once and the
    /// collection is persisted once, whatever the batch size.
    pub fn insert_items(&self, collection_id: &str, items: Vec<Item>) -> Result<Vec<Arc<Item>>> {
        for item in &items {
            if let Some(owner) = item.collection() {
                if owner != collection_id {
                    return Err(Error::validation(format!(
                        "Item '{}' belongs to collection '{}', not '{}'",
                        item.id(),
                        owner,
                        collection_id
                    )));
                }
            }
            item.validate()?;
        }

        if items.is_empty() {
            self.get_collection(collection_id)?;
            return Ok(Vec::new());
        }

        let ids: Vec<String> = items.iter().map(|item| item.id().to_string()).collect();
        self.reserve_item_ids(collection_id, &ids)?;

        let result = self.modify_collection(collection_id, |collection| {
            collection.add_items(items)?;
            ids.iter()
                .map(|id| {
                    collection.item(id).cloned().ok_or_else(|| {
                        Error::consistency(format!("item '{}' vanished on insert", id))
                    })
                })
                .collect::<Result<Vec<_>>>()
        });

        match &result {
            Ok(_) if ids.len() == 1 => debug!("Created item '{}/{}'", collection_id, ids[0]),
            Ok(_) => debug!("Created {} items in '{}'", ids.len(), collection_id),
            Err(e) => {
                self.release_item_ids(&ids);
                debug!(
                    "Insert of {} items into '{}' failed: {}",
                    ids.len(),
                    collection_id,
                    e
                );
            }
        }
        result
    }

    /// Delete an item; the collection's extents are recomputed
    pub fn delete_item(&self, collection_id: &str, item_id: &str) -> Result<Item> {
        let removed = self.modify_collection(collection_id, |collection| {
            collection
                .remove_item(item_id)
                .ok_or_else(|| Error::not_found("Item", format!("{}/{}", collection_id, item_id)))
        })?;

        self.release_item_ids(&[item_id.to_string()]);
        debug!("Deleted item '{}/{}'", collection_id, item_id);
        Ok(removed)
    }

    /// Edit an item in place
    ///
    /// Identity and membership cannot change. The collection's extents are
    /// marked stale rather than recomputed; call [`Catalog::refresh_extents`]
    /// to bring them up to date.
    pub fn update_item<F>(&self, collection_id: &str, item_id: &str, edit: F) -> Result<Arc<Item>>
    where
        F: FnOnce(&mut Item) -> Result<()>,
    {
        self.modify_collection(collection_id, |collection| {
            let item = collection
                .item_mut(item_id)
                .ok_or_else(|| Error::not_found("Item", format!("{}/{}", collection_id, item_id)))?;

            edit(item)?;
            item.validate()?;
            item.meta.touch();

            collection
                .item(item_id)
                .cloned()
                .ok_or_else(|| Error::consistency(format!("item '{}' vanished on update", item_id)))
        })
    }

    // =========================================================================
    // Commit machinery
    // =========================================================================

    /// Writer mutex for a collection id
    fn write_lock(&self, collection_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.write_locks
                .lock()
                .entry(collection_id.to_string())
                .or_default(),
        )
    }

    /// Writer mutex for a collection that is currently published
    ///
    /// Unknown ids fail with `NotFound` without allocating a lock entry.
    /// Callers must still re-check existence once they hold the lock.
    fn existing_write_lock(&self, collection_id: &str) -> Result<Arc<Mutex<()>>> {
        if !self.contains_collection(collection_id) {
            return Err(Error::not_found("Collection", collection_id));
        }
        Ok(self.write_lock(collection_id))
    }

    /// Apply a change to a working copy of a collection and commit it
    ///
    /// The edit runs on a clone; if it, verification or persistence fails the
    /// published collection is untouched.
    pub(crate) fn modify_collection<T, F>(&self, collection_id: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Collection) -> Result<T>,
    {
        self.modify_collection_if_changed(collection_id, |collection| {
            edit(collection).map(|value| (value, true))
        })
    }

    /// Like [`Catalog::modify_collection`], but the edit reports whether it
    /// changed anything; unchanged working copies are dropped without a commit
    pub(crate) fn modify_collection_if_changed<T, F>(
        &self,
        collection_id: &str,
        edit: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Collection) -> Result<(T, bool)>,
    {
        let lock = self.existing_write_lock(collection_id)?;
        let _guard = lock.lock();

        let current = self.get_collection(collection_id)?;
        let mut working = Collection::clone(&current);
        let (value, changed) = edit(&mut working)?;

        if changed {
            self.commit(working)?;
        } else {
            debug!("No change to collection '{}', skipping commit", collection_id);
        }
        Ok(value)
    }

    /// Verify, persist and publish a collection; caller holds its write lock
    fn commit(&self, collection: Collection) -> Result<Arc<Collection>> {
        if self.config.verify_invariants {
            collection.verify()?;
        }

        self.store.save_collection(&collection).inspect_err(|e| {
            warn!(
                "Failed to persist collection '{}', keeping previous state: {}",
                collection.id(),
                e
            )
        })?;

        let published = Arc::new(collection);
        let mut collections = self.collections.write();
        Arc::make_mut(&mut collections)
            .insert(published.id().to_string(), Arc::clone(&published));
        Ok(published)
    }

    /// Claim item ids for a collection under global id scope
    ///
    /// Claims are taken before the collection lock and released if the
    /// commit fails, so two collections can never both accept the same id.
    fn reserve_item_ids(&self, collection_id: &str, item_ids: &[String]) -> Result<()> {
        if self.config.item_id_scope != ItemIdScope::Global {
            return Ok(());
        }

        let mut owners = self.item_owners.lock();
        if let Some(taken) = item_ids.iter().find(|id| owners.contains_key(*id)) {
            return Err(Error::conflict("Item", taken.clone()));
        }

        for id in item_ids {
            owners.insert(id.clone(), collection_id.to_string());
        }
        Ok(())
    }

    fn release_item_ids(&self, item_ids: &[String]) {
        if self.config.item_id_scope != ItemIdScope::Global {
            return;
        }

        let mut owners = self.item_owners.lock();
        for id in item_ids {
            owners.remove(id);
        }
    }
}
