//! Persistence backends for the catalog
//!
//! A store persists whole collection documents: one collection with all of
//! its items and links. Saving or deleting a document is a single atomic
//! operation, which makes cascades all-or-nothing and failed writes safe to
//! retry.

use crate::app::models::Collection;
use crate::app::services::stac::{self, CollectionDocument};
use crate::constants::COLLECTION_FILE_EXTENSION;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Backing store for catalog collections
pub trait CatalogStore: Send + Sync + std::fmt::Debug {
    /// Load every persisted collection
    fn load_all(&self) -> Result<Vec<Collection>>;

    /// Persist a collection document, replacing any previous version
    fn save_collection(&self, collection: &Collection) -> Result<()>;

    /// Remove a collection document; absent documents are not an error
    fn delete_collection(&self, collection_id: &str) -> Result<()>;

    /// Short description for log messages
    fn describe(&self) -> String;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Volatile store for tests and embedded use
///
/// Documents are kept in their serialized STAC shape so that loading
/// exercises the same conversion path as the directory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, CollectionDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.lock().is_empty()
    }

    pub fn contains(&self, collection_id: &str) -> bool {
        self.documents.lock().contains_key(collection_id)
    }
}

impl CatalogStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Collection>> {
        self.documents
            .lock()
            .values()
            .cloned()
            .map(stac::from_document)
            .collect()
    }

    fn save_collection(&self, collection: &Collection) -> Result<()> {
        self.documents
            .lock()
            .insert(collection.id().to_string(), stac::to_document(collection));
        Ok(())
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        self.documents.lock().remove(collection_id);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}

// =============================================================================
// Directory Store
// =============================================================================

/// One STAC JSON document per collection in a directory
///
/// Documents are written to a temporary file in the same directory and
/// renamed into place, so readers and crashes never see partial files.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    pretty: bool,
}

impl DirectoryStore {
    /// Open (and create if needed) a catalog directory
    pub fn open(root: impl Into<PathBuf>, pretty: bool) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            Error::io(
                format!("Failed to create catalog directory {}", root.display()),
                e,
            )
        })?;

        debug!("Opened catalog directory {}", root.display());
        Ok(Self { root, pretty })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for a collection id
    pub fn document_path(&self, collection_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", collection_id, COLLECTION_FILE_EXTENSION))
    }

    fn read_document(&self, path: &Path) -> Result<Collection> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))?;

        let document: CollectionDocument = serde_json::from_str(&content).map_err(|e| {
            Error::serialization(format!("Invalid collection document {}", path.display()), e)
        })?;

        let collection = stac::from_document(document)?;

        let expected_stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if collection.id() != expected_stem {
            return Err(Error::validation(format!(
                "Document {} holds collection '{}'",
                path.display(),
                collection.id()
            )));
        }

        Ok(collection)
    }
}

impl CatalogStore for DirectoryStore {
    fn load_all(&self) -> Result<Vec<Collection>> {
        let mut paths: Vec<PathBuf> = Vec::new();

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let message = format!("Failed to scan {}", self.root.display());
                match e.into_io_error() {
                    Some(io_error) => Error::io(message, io_error),
                    None => Error::configuration(message),
                }
            })?;

            let path = entry.path();
            let is_document = entry.file_type().is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == COLLECTION_FILE_EXTENSION);

            if is_document {
                paths.push(path.to_path_buf());
            } else {
                debug!("Skipping non-document entry {}", path.display());
            }
        }

        paths.sort();

        let collections = paths
            .iter()
            .map(|path| self.read_document(path))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Loaded {} collections from {}",
            collections.len(),
            self.root.display()
        );
        Ok(collections)
    }

    fn save_collection(&self, collection: &Collection) -> Result<()> {
        let document = stac::to_document(collection);
        let json = if self.pretty {
            serde_json::to_vec_pretty(&document)
        } else {
            serde_json::to_vec(&document)
        }
        .map_err(|e| {
            Error::serialization(
                format!("Failed to encode collection '{}'", collection.id()),
                e,
            )
        })?;

        let path = self.document_path(collection.id());
        let mut temp = NamedTempFile::new_in(&self.root).map_err(|e| {
            Error::io(
                format!("Failed to create temporary file in {}", self.root.display()),
                e,
            )
        })?;

        temp.write_all(&json)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;

        temp.persist(&path)
            .map_err(|e| Error::io(format!("Failed to replace {}", path.display()), e.error))?;

        debug!(
            "Saved collection '{}' ({} items) to {}",
            collection.id(),
            collection.item_count(),
            path.display()
        );
        Ok(())
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        let path = self.document_path(collection_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Document {} was already absent", path.display());
                Ok(())
            }
            Err(e) => Err(Error::io(format!("Failed to remove {}", path.display()), e)),
        }
    }

    fn describe(&self) -> String {
        format!("directory store at {}", self.root.display())
    }
}
