//! Metadata and property store
//!
//! Free-form metadata attached to collections and items. Property maps are
//! only changed one key at a time (or by an additive upsert); there is no
//! wholesale replacement that could silently drop keys. Keywords behave as
//! a set, providers as an ordered list that permits duplicates.

use crate::app::models::item::validate_property_key;
use crate::app::models::{Collection, Item, Provider};
use crate::{Error, Result};
use std::collections::BTreeMap;

fn set_entry(
    map: &mut BTreeMap<String, String>,
    key: String,
    value: String,
) -> Result<Option<String>> {
    validate_property_key(&key)?;
    Ok(map.insert(key, value))
}

fn extend_entries(
    map: &mut BTreeMap<String, String>,
    entries: impl IntoIterator<Item = (String, String)>,
) -> Result<usize> {
    // Validate everything first so a bad key leaves the map untouched
    let entries: Vec<(String, String)> = entries.into_iter().collect();
    for (key, _) in &entries {
        validate_property_key(key)?;
    }

    let count = entries.len();
    map.extend(entries);
    Ok(count)
}

impl Collection {
    /// Insert or replace a property; returns the previous value
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>> {
        let previous = set_entry(&mut self.properties, key.into(), value.into())?;
        self.meta.touch();
        Ok(previous)
    }

    /// Remove a property; absent keys are a no-op
    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        let removed = self.properties.remove(key);
        if removed.is_some() {
            self.meta.touch();
        }
        removed
    }

    /// Upsert several properties, keeping keys not mentioned
    pub fn extend_properties(
        &mut self,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<usize> {
        let count = extend_entries(&mut self.properties, entries)?;
        self.meta.touch();
        Ok(count)
    }

    /// Add a keyword; returns false if it was already present
    pub fn add_keyword(&mut self, keyword: impl Into<String>) -> Result<bool> {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            return Err(Error::validation(format!(
                "Collection '{}' cannot have an empty keyword",
                self.id
            )));
        }

        if self.keywords.contains(&keyword) {
            return Ok(false);
        }

        self.keywords.push(keyword);
        self.meta.touch();
        Ok(true)
    }

    /// Remove a keyword; returns false if it was not present
    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        let before = self.keywords.len();
        self.keywords.retain(|existing| existing != keyword);
        let removed = self.keywords.len() != before;
        if removed {
            self.meta.touch();
        }
        removed
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|existing| existing == keyword)
    }

    /// Append a provider; providers sharing a name are allowed
    pub fn add_provider(&mut self, provider: Provider) -> Result<()> {
        provider.validate()?;
        self.providers.push(provider);
        self.meta.touch();
        Ok(())
    }
}

impl Item {
    /// Insert or replace a property; returns the previous value
    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>> {
        let previous = set_entry(&mut self.properties, key.into(), value.into())?;
        self.meta.touch();
        Ok(previous)
    }

    /// Remove a property; absent keys are a no-op
    pub fn remove_property(&mut self, key: &str) -> Option<String> {
        let removed = self.properties.remove(key);
        if removed.is_some() {
            self.meta.touch();
        }
        removed
    }

    /// Upsert several properties, keeping keys not mentioned
    pub fn extend_properties(
        &mut self,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<usize> {
        let count = extend_entries(&mut self.properties, entries)?;
        self.meta.touch();
        Ok(count)
    }
}
