//! Link graph management
//!
//! Owns the relations between collections, items and links: appending and
//! detaching items with their back-references, validating and removing
//! links, and verifying the back-reference invariant. Every mutation of a
//! collection's item list goes through this module.

use crate::app::models::{Collection, Item, Link};
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

impl Collection {
    /// Append an item and point its back-reference at this collection
    ///
    /// Fails with a conflict if an item with the same id is already a
    /// member; the item list is left unchanged in that case. Extents are
    /// recomputed on success.
    pub fn add_item(&mut self, item: Item) -> Result<()> {
        self.add_items(vec![item]).map(|_| ())
    }

    /// Append a batch of items, recomputing the extents once at the end
    ///
    /// All or nothing: a duplicate id, against existing members or within
    /// the batch, fails with a conflict before any item is attached.
    pub fn add_items(&mut self, items: Vec<Item>) -> Result<usize> {
        {
            let mut batch = HashSet::with_capacity(items.len());
            for item in &items {
                if self.item_index.contains_key(&item.id) || !batch.insert(item.id.as_str()) {
                    return Err(Error::conflict(
                        "Item",
                        format!("{}/{}", self.id, item.id),
                    ));
                }
            }
        }

        let count = items.len();
        if count == 0 {
            return Ok(0);
        }

        self.items.reserve(count);
        self.item_index.reserve(count);
        for mut item in items {
            item.collection = Some(self.id.clone());
            self.item_index.insert(item.id.clone(), self.items.len());
            self.items.push(Arc::new(item));
        }

        self.recompute_extents();
        self.meta.touch();
        Ok(count)
    }

    /// Detach an item, clearing its back-reference
    ///
    /// Returns the removed item, or `None` if it was not a member.
    pub fn remove_item(&mut self, item_id: &str) -> Option<Item> {
        let position = self.item_index.remove(item_id)?;
        let removed = self.items.remove(position);

        // Positions after the removed item shift down by one
        for (offset, item) in self.items[position..].iter().enumerate() {
            self.item_index.insert(item.id.clone(), position + offset);
        }

        self.recompute_extents();
        self.meta.touch();

        let mut item = Arc::unwrap_or_clone(removed);
        item.collection = None;
        Some(item)
    }

    /// Detach every item, leaving an empty collection
    pub fn clear_items(&mut self) -> Vec<Item> {
        self.item_index.clear();
        let detached = std::mem::take(&mut self.items)
            .into_iter()
            .map(|item| {
                let mut item = Arc::unwrap_or_clone(item);
                item.collection = None;
                item
            })
            .collect();
        self.recompute_extents();
        self.meta.touch();
        detached
    }

    /// Mutable access to a member item for in-place edits
    ///
    /// Marks the extents stale; the caller decides when to recompute.
    pub(crate) fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        let position = *self.item_index.get(item_id)?;
        self.extent_stale = true;
        Some(Arc::make_mut(&mut self.items[position]))
    }

    /// Mutable access for edits that cannot move the extents (links, properties)
    pub(crate) fn item_metadata_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        let position = *self.item_index.get(item_id)?;
        Some(Arc::make_mut(&mut self.items[position]))
    }

    /// Verify the back-reference invariant and the id index
    ///
    /// A failure here is a defect in the catalog, never a caller error.
    pub fn verify(&self) -> Result<()> {
        if self.item_index.len() != self.items.len() {
            return Err(consistency_violation(format!(
                "collection '{}' indexes {} items but holds {}",
                self.id,
                self.item_index.len(),
                self.items.len()
            )));
        }

        for (position, item) in self.items.iter().enumerate() {
            if item.collection.as_deref() != Some(self.id.as_str()) {
                return Err(consistency_violation(format!(
                    "item '{}' in collection '{}' points at {:?}",
                    item.id, self.id, item.collection
                )));
            }

            if self.item_index.get(&item.id) != Some(&position) {
                return Err(consistency_violation(format!(
                    "item '{}' in collection '{}' is not indexed at position {}",
                    item.id, self.id, position
                )));
            }
        }

        Ok(())
    }
}

fn consistency_violation(message: String) -> Error {
    error!("Link graph invariant violated: {}", message);
    Error::consistency(message)
}

/// An entity that owns links
pub trait LinkParent {
    /// Human-readable identity used in log messages
    fn describe(&self) -> String;

    /// Links in insertion order
    fn links(&self) -> &[Link];

    /// Validate and append a link
    fn add_link(&mut self, link: Link) -> Result<()>;

    /// Remove the link with identity `(rel, href)`; returns it if present
    fn remove_link(&mut self, rel: &str, href: &str) -> Option<Link>;
}

fn add_link_to(owner: &str, links: &mut Vec<Link>, link: Link) -> Result<()> {
    link.validate()?;
    debug!("Adding '{}' link to {} -> {}", link.rel, owner, link.href);
    links.push(link);
    Ok(())
}

fn remove_link_from(links: &mut Vec<Link>, rel: &str, href: &str) -> Option<Link> {
    let position = links.iter().position(|link| link.is(rel, href))?;
    Some(links.remove(position))
}

impl LinkParent for Collection {
    fn describe(&self) -> String {
        format!("collection '{}'", self.id)
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn add_link(&mut self, link: Link) -> Result<()> {
        let owner = self.describe();
        add_link_to(&owner, &mut self.links, link)?;
        self.meta.touch();
        Ok(())
    }

    fn remove_link(&mut self, rel: &str, href: &str) -> Option<Link> {
        let removed = remove_link_from(&mut self.links, rel, href);
        if removed.is_some() {
            self.meta.touch();
        }
        removed
    }
}

impl LinkParent for Item {
    fn describe(&self) -> String {
        format!("item '{}'", self.id)
    }

    fn links(&self) -> &[Link] {
        &self.links
    }

    fn add_link(&mut self, link: Link) -> Result<()> {
        let owner = self.describe();
        add_link_to(&owner, &mut self.links, link)?;
        self.meta.touch();
        Ok(())
    }

    fn remove_link(&mut self, rel: &str, href: &str) -> Option<Link> {
        let removed = remove_link_from(&mut self.links, rel, href);
        if removed.is_some() {
            self.meta.touch();
        }
        removed
    }
}
