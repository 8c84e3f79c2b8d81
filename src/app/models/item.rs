//! Item records: single geospatial assets with geometry and time

use super::{EntityMeta, Geometry, ItemTime, Link, validate_catalog_id};
use crate::constants::property_keys;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to a file or URI making up part of an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Asset {
    /// Create an asset pointing at `href`
    pub fn new(href: impl Into<String>) -> Result<Self> {
        let asset = Self {
            href: href.into(),
            media_type: None,
            title: None,
            roles: Vec::new(),
        };
        asset.validate()?;
        Ok(asset)
    }

    /// Set the media type
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a role (`data`, `thumbnail`, `metadata`, ...)
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.href.trim().is_empty() {
            return Err(Error::validation("Asset href cannot be empty"));
        }
        Ok(())
    }
}

/// Caller-supplied fields for creating an item
#[derive(Debug, Clone, Default)]
pub struct ItemSpec {
    pub id: String,
    pub geometry: Option<Geometry>,
    pub time: Option<ItemTime>,
    pub assets: BTreeMap<String, Asset>,
    pub properties: BTreeMap<String, String>,
    pub links: Vec<Link>,
}

impl ItemSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_time(mut self, time: ItemTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_asset(mut self, name: impl Into<String>, asset: Asset) -> Self {
        self.assets.insert(name.into(), asset);
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

/// A single geospatial asset record
///
/// The back-reference to the owning collection is maintained by the link
/// graph operations and is `None` only while the item is detached.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) meta: EntityMeta,
    pub(crate) id: String,
    pub(crate) collection: Option<String>,

    /// Footprint of the asset; `None` for non-spatial records
    pub geometry: Option<Geometry>,

    /// Acquisition or observation time
    pub time: Option<ItemTime>,

    /// Named asset references
    pub assets: BTreeMap<String, Asset>,

    pub(crate) properties: BTreeMap<String, String>,
    pub(crate) links: Vec<Link>,
}

impl Item {
    /// Build a detached item from a validated spec
    pub fn from_spec(spec: ItemSpec) -> Result<Self> {
        let item = Self {
            meta: EntityMeta::new(),
            id: spec.id,
            collection: None,
            geometry: spec.geometry,
            time: spec.time,
            assets: spec.assets,
            properties: spec.properties,
            links: spec.links,
        };
        item.validate()?;
        Ok(item)
    }

    /// Check identifier, geometry, time, assets, links and property keys
    pub fn validate(&self) -> Result<()> {
        validate_catalog_id("Item", &self.id)?;

        if let Some(geometry) = &self.geometry {
            geometry.validate().map_err(|e| {
                Error::validation(format!("Item '{}' has invalid geometry: {}", self.id, e))
            })?;
        }

        if let Some(time) = &self.time {
            time.validate()?;
        }

        for (name, asset) in &self.assets {
            if name.trim().is_empty() {
                return Err(Error::validation(format!(
                    "Item '{}' has an asset with an empty name",
                    self.id
                )));
            }
            asset.validate()?;
        }

        for link in &self.links {
            link.validate()?;
        }

        for key in self.properties.keys() {
            validate_property_key(key)?;
        }

        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the owning collection
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }
}

/// Reject empty keys and keys the catalog derives itself
pub(crate) fn validate_property_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::validation("Property key cannot be empty"));
    }

    if property_keys::RESERVED.contains(&key) {
        return Err(Error::validation(format!(
            "Property key '{}' is reserved",
            key
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::temporal::parse_datetime;

    #[test]
    fn test_item_from_spec() {
        let spec = ItemSpec::new("scene-001")
            .with_geometry(Geometry::Point([10.0, 50.0]))
            .with_time(ItemTime::Instant(parse_datetime("2024-01-01").unwrap()))
            .with_asset(
                "visual",
                Asset::new("s3://bucket/scene-001.tif")
                    .unwrap()
                    .with_media_type("image/tiff")
                    .with_role("data"),
            )
            .with_property("platform", "sentinel-2a");

        let item = Item::from_spec(spec).unwrap();
        assert_eq!(item.id(), "scene-001");
        assert!(item.collection().is_none());
        assert_eq!(item.property("platform"), Some("sentinel-2a"));
        assert_eq!(item.assets["visual"].roles, vec!["data".to_string()]);
    }

    #[test]
    fn test_item_validation_failures() {
        assert!(Item::from_spec(ItemSpec::new("")).is_err());

        let bad_geometry = ItemSpec::new("a").with_geometry(Geometry::Point([0.0, 91.0]));
        assert!(Item::from_spec(bad_geometry).unwrap_err().is_validation());

        let reserved = ItemSpec::new("a").with_property("datetime", "2024-01-01");
        assert!(Item::from_spec(reserved).unwrap_err().is_validation());

        let bad_link = ItemSpec::new("a").with_link(Link {
            rel: "self".to_string(),
            href: String::new(),
            title: None,
            media_type: None,
        });
        assert!(Item::from_spec(bad_link).unwrap_err().is_validation());

        assert!(Asset::new("").is_err());
    }
}
