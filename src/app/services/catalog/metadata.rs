//! Link and metadata mutations committed through the catalog
//!
//! These edits never move an item's geometry or time, so they do not mark
//! collection extents stale.

use super::Catalog;
use crate::app::models::{Collection, Item, Link, Provider};
use crate::app::services::link_graph::LinkParent;
use crate::{Error, Result};
use tracing::debug;

impl Catalog {
    // =========================================================================
    // Links
    // =========================================================================

    /// Attach a link to a collection
    pub fn add_collection_link(&self, collection_id: &str, link: Link) -> Result<()> {
        self.modify_collection(collection_id, |collection| collection.add_link(link))
    }

    /// Remove a collection link; returns false if no such link existed
    pub fn remove_collection_link(&self, collection_id: &str, rel: &str, href: &str) -> Result<bool> {
        self.modify_collection_if_changed(collection_id, |collection| {
            let removed = collection.remove_link(rel, href).is_some();
            Ok((removed, removed))
        })
    }

    /// Attach a link to an item
    pub fn add_item_link(&self, collection_id: &str, item_id: &str, link: Link) -> Result<()> {
        self.modify_item_metadata(collection_id, item_id, |item| item.add_link(link))
    }

    /// Remove an item link; returns false if no such link existed
    pub fn remove_item_link(
        &self,
        collection_id: &str,
        item_id: &str,
        rel: &str,
        href: &str,
    ) -> Result<bool> {
        self.modify_item_metadata_if_changed(collection_id, item_id, |item| {
            let removed = item.remove_link(rel, href).is_some();
            Ok((removed, removed))
        })
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Set a collection property; returns the previous value
    pub fn set_collection_property(
        &self,
        collection_id: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<String>> {
        self.modify_collection(collection_id, |collection| {
            collection.set_property(key, value)
        })
    }

    /// Remove a collection property; absent keys are not an error
    pub fn remove_collection_property(
        &self,
        collection_id: &str,
        key: &str,
    ) -> Result<Option<String>> {
        self.modify_collection_if_changed(collection_id, |collection| {
            let removed = collection.remove_property(key);
            let changed = removed.is_some();
            Ok((removed, changed))
        })
    }

    /// Set an item property; returns the previous value
    pub fn set_item_property(
        &self,
        collection_id: &str,
        item_id: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<String>> {
        self.modify_item_metadata(collection_id, item_id, |item| item.set_property(key, value))
    }

    /// Remove an item property; absent keys are not an error
    pub fn remove_item_property(
        &self,
        collection_id: &str,
        item_id: &str,
        key: &str,
    ) -> Result<Option<String>> {
        self.modify_item_metadata_if_changed(collection_id, item_id, |item| {
            let removed = item.remove_property(key);
            let changed = removed.is_some();
            Ok((removed, changed))
        })
    }

    /// Upsert several item properties at once, keeping unmentioned keys
    pub fn extend_item_properties(
        &self,
        collection_id: &str,
        item_id: &str,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<usize> {
        self.modify_item_metadata(collection_id, item_id, |item| item.extend_properties(entries))
    }

    // =========================================================================
    // Keywords and providers
    // =========================================================================

    /// Add a keyword; returns false if it was already present
    pub fn add_keyword(&self, collection_id: &str, keyword: &str) -> Result<bool> {
        self.modify_collection_if_changed(collection_id, |collection| {
            collection.add_keyword(keyword).map(|added| (added, added))
        })
    }

    /// Remove a keyword; returns false if it was not present
    pub fn remove_keyword(&self, collection_id: &str, keyword: &str) -> Result<bool> {
        self.modify_collection_if_changed(collection_id, |collection| {
            let removed = collection.remove_keyword(keyword);
            Ok((removed, removed))
        })
    }

    pub fn add_provider(&self, collection_id: &str, provider: Provider) -> Result<()> {
        self.modify_collection(collection_id, |collection| collection.add_provider(provider))
    }

    /// Commit an edit to one item that leaves the extents valid
    fn modify_item_metadata<T, F>(&self, collection_id: &str, item_id: &str, edit: F) -> Result<T>
    where
        F: FnOnce(&mut Item) -> Result<T>,
    {
        self.modify_item_metadata_if_changed(collection_id, item_id, |item| {
            edit(item).map(|value| (value, true))
        })
    }

    /// Item metadata edit that reports whether anything changed
    fn modify_item_metadata_if_changed<T, F>(
        &self,
        collection_id: &str,
        item_id: &str,
        edit: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Item) -> Result<(T, bool)>,
    {
        self.modify_collection_if_changed(collection_id, |collection: &mut Collection| {
            let item = collection
                .item_metadata_mut(item_id)
                .ok_or_else(|| Error::not_found("Item", format!("{}/{}", collection_id, item_id)))?;
            let (value, changed) = edit(item)?;
            if changed {
                debug!("Updated metadata of item '{}/{}'", collection_id, item_id);
            }
            Ok((value, changed))
        })
    }
}
