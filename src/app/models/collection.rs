//! Collection records: named groups of items sharing metadata

use super::{Bbox, EntityMeta, Item, Link, TemporalExtent, validate_catalog_id};
use crate::app::services::link_graph::LinkParent;
use crate::constants::DEFAULT_LICENSE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Role an organisation plays for a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    Licensor,
    Producer,
    Processor,
    Host,
}

/// Organisation that captured, processed or hosts the data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub roles: BTreeSet<ProviderRole>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Provider {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let provider = Self {
            name: name.into(),
            description: None,
            roles: BTreeSet::new(),
            url: None,
        };
        provider.validate()?;
        Ok(provider)
    }

    pub fn with_role(mut self, role: ProviderRole) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Provider name cannot be empty"));
        }
        Ok(())
    }
}

/// Caller-supplied fields for creating a collection
#[derive(Debug, Clone, Default)]
pub struct CollectionSpec {
    pub id: String,
    pub title: Option<String>,
    pub description: String,
    pub license: Option<String>,
    pub providers: Vec<Provider>,
    pub keywords: Vec<String>,
    pub properties: BTreeMap<String, String>,
    pub links: Vec<Link>,
}

impl CollectionSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }
}

/// A named group of items sharing spatial, temporal and license metadata
///
/// The collection owns its items and links. Items are added and removed
/// only through the link graph operations so that back-references, the id
/// index and the extents stay consistent.
#[derive(Debug, Clone)]
pub struct Collection {
    pub(crate) meta: EntityMeta,
    pub(crate) id: String,
    pub title: Option<String>,
    pub description: String,
    pub license: String,
    pub(crate) temporal_extent: TemporalExtent,
    pub(crate) spatial_extent: Option<Bbox>,

    /// Set when an item changed in place after the last recomputation
    pub(crate) extent_stale: bool,

    pub(crate) providers: Vec<Provider>,
    pub(crate) keywords: Vec<String>,
    pub(crate) items: Vec<Arc<Item>>,

    /// Item id -> position in `items`
    pub(crate) item_index: HashMap<String, usize>,

    pub(crate) links: Vec<Link>,
    pub(crate) properties: BTreeMap<String, String>,
}

impl Collection {
    /// Build an empty collection from a spec
    ///
    /// Keywords are de-duplicated and properties validated through the
    /// same rules as the property store.
    pub fn from_spec(spec: CollectionSpec) -> Result<Self> {
        validate_catalog_id("Collection", &spec.id)?;

        let mut collection = Self {
            meta: EntityMeta::new(),
            id: spec.id,
            title: spec.title,
            description: spec.description,
            license: spec
                .license
                .unwrap_or_else(|| DEFAULT_LICENSE.to_string()),
            temporal_extent: TemporalExtent::unbounded(),
            spatial_extent: None,
            extent_stale: false,
            providers: Vec::new(),
            keywords: Vec::new(),
            items: Vec::new(),
            item_index: HashMap::new(),
            links: Vec::new(),
            properties: BTreeMap::new(),
        };

        for provider in spec.providers {
            collection.add_provider(provider)?;
        }
        for keyword in spec.keywords {
            collection.add_keyword(keyword)?;
        }
        for (key, value) in spec.properties {
            collection.set_property(key, value)?;
        }
        for link in spec.links {
            collection.add_link(link)?;
        }

        Ok(collection)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    /// Bounding envelope of all item geometries, as of the last recomputation
    pub fn spatial_extent(&self) -> Option<Bbox> {
        self.spatial_extent
    }

    /// Time bounds of all items, as of the last recomputation
    pub fn temporal_extent(&self) -> TemporalExtent {
        self.temporal_extent
    }

    /// True when an item was edited in place since the extents were computed
    pub fn is_extent_stale(&self) -> bool {
        self.extent_stale
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Items in insertion order
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    pub fn item(&self, item_id: &str) -> Option<&Arc<Item>> {
        self.item_index.get(item_id).map(|&pos| &self.items[pos])
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.item_index.contains_key(item_id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
