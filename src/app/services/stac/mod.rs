//! STAC JSON serialization
//!
//! Converts catalog entities to and from STAC 1.0.0 `Collection`, `Item`
//! (GeoJSON `Feature`) and `Link` objects. The same shapes form the
//! persisted representation used by the directory store, with the internal
//! identifier carried in a `catalog:uid` extension field and the `created`
//! / `updated` timestamps in their STAC common-metadata positions.

use crate::app::models::temporal::parse_datetime;
use crate::app::models::{
    Asset, Bbox, Collection, CollectionSpec, EntityMeta, Geometry, Item, ItemSpec, ItemTime, Link,
    Provider,
};
use crate::constants::{STAC_VERSION, TYPE_COLLECTION, TYPE_FEATURE, property_keys};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;


/// Bounding box used for collections that have no spatial extent yet
const WHOLE_WORLD: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

// =============================================================================
// STAC Document Shapes
// =============================================================================

/// STAC Item (GeoJSON Feature)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacItem {
    #[serde(rename = "type")]
    pub object_type: String,

    #[serde(default = "default_stac_version")]
    pub stac_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Bbox>,

    #[serde(default)]
    pub properties: Map<String, Value>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,

    #[serde(
        rename = "catalog:uid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_id: Option<Uuid>,
}

/// STAC Collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacCollection {
    #[serde(rename = "type")]
    pub object_type: String,

    #[serde(default = "default_stac_version")]
    pub stac_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    pub license: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,

    pub extent: StacExtent,

    #[serde(default)]
    pub links: Vec<Link>,

    /// Free-form collection metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(
        rename = "catalog:uid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_id: Option<Uuid>,
}

/// `extent` object of a STAC Collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacExtent {
    pub spatial: StacSpatialExtent,
    pub temporal: StacTemporalExtent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacSpatialExtent {
    pub bbox: Vec<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacTemporalExtent {
    pub interval: Vec<[Option<DateTime<Utc>>; 2]>,
}

/// GeoJSON FeatureCollection of items, as returned by STAC API searches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCollection {
    #[serde(rename = "type")]
    pub object_type: String,

    pub features: Vec<StacItem>,

    #[serde(rename = "numberMatched", default, skip_serializing_if = "Option::is_none")]
    pub number_matched: Option<usize>,

    #[serde(rename = "numberReturned")]
    pub number_returned: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// Persisted form of one collection with all of its items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub collection: StacCollection,

    #[serde(default)]
    pub items: Vec<StacItem>,
}

fn default_stac_version() -> String {
    STAC_VERSION.to_string()
}

fn format_datetime(value: DateTime<Utc>) -> Value {
    Value::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

// =============================================================================
// Items
// =============================================================================

/// Export an item as a STAC Item
pub fn to_stac_item(item: &Item) -> StacItem {
    let mut properties = Map::new();

    match item.time {
        Some(ItemTime::Instant(t)) => {
            properties.insert(property_keys::DATETIME.to_string(), format_datetime(t));
        }
        Some(ItemTime::Range { start, end }) => {
            properties.insert(property_keys::DATETIME.to_string(), Value::Null);
            properties.insert(
                property_keys::START_DATETIME.to_string(),
                format_datetime(start),
            );
            properties.insert(property_keys::END_DATETIME.to_string(), format_datetime(end));
        }
        None => {
            properties.insert(property_keys::DATETIME.to_string(), Value::Null);
        }
    }

    properties.insert(
        property_keys::CREATED.to_string(),
        format_datetime(item.meta.created),
    );
    properties.insert(
        property_keys::UPDATED.to_string(),
        format_datetime(item.meta.updated),
    );

    for (key, value) in &item.properties {
        properties.insert(key.clone(), Value::String(value.clone()));
    }

    StacItem {
        object_type: TYPE_FEATURE.to_string(),
        stac_version: STAC_VERSION.to_string(),
        stac_extensions: Vec::new(),
        id: item.id.clone(),
        collection: item.collection.clone(),
        bbox: item.geometry.as_ref().and_then(Geometry::bbox),
        geometry: item.geometry.clone(),
        properties,
        links: item.links.clone(),
        assets: item.assets.clone(),
        internal_id: Some(item.meta.internal_id),
    }
}

/// Import a STAC Item as a detached item
///
/// Reserved timing properties are lifted into the item's time and
/// metadata; every other property is kept as a string (non-string JSON
/// values keep their JSON text).
pub fn item_from_stac(stac: StacItem) -> Result<Item> {
    if stac.object_type != TYPE_FEATURE {
        return Err(Error::validation(format!(
            "Item '{}' has type '{}', expected '{}'",
            stac.id, stac.object_type, TYPE_FEATURE
        )));
    }

    let mut properties = stac.properties;
    let datetime = take_datetime(&mut properties, property_keys::DATETIME)?;
    let start = take_datetime(&mut properties, property_keys::START_DATETIME)?;
    let end = take_datetime(&mut properties, property_keys::END_DATETIME)?;
    let created = take_datetime(&mut properties, property_keys::CREATED)?;
    let updated = take_datetime(&mut properties, property_keys::UPDATED)?;

    let time = match (start, end, datetime) {
        (Some(start), Some(end), _) => Some(ItemTime::range(start, end)?),
        (None, None, Some(instant)) => Some(ItemTime::Instant(instant)),
        (None, None, None) => None,
        _ => {
            return Err(Error::validation(format!(
                "Item '{}' must set both start_datetime and end_datetime",
                stac.id
            )));
        }
    };

    let mut spec = ItemSpec::new(stac.id);
    spec.geometry = stac.geometry;
    spec.time = time;
    spec.assets = stac.assets;
    spec.links = stac.links;
    spec.properties = properties
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect();

    let mut item = Item::from_spec(spec)?;
    item.meta = EntityMeta::restore(stac.internal_id, created, updated);
    Ok(item)
}

fn take_datetime(properties: &mut Map<String, Value>, key: &str) -> Result<Option<DateTime<Utc>>> {
    match properties.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_datetime(&s).map(Some),
        Some(other) => Err(Error::validation(format!(
            "Property '{}' must be a timestamp string, found {}",
            key, other
        ))),
    }
}

/// Wrap items in a FeatureCollection
pub fn to_item_collection<'a>(
    items: impl IntoIterator<Item = &'a Arc<Item>>,
    number_matched: Option<usize>,
    links: Vec<Link>,
) -> ItemCollection {
    let features: Vec<StacItem> = items.into_iter().map(|item| to_stac_item(item)).collect();
    ItemCollection {
        object_type: "FeatureCollection".to_string(),
        number_returned: features.len(),
        features,
        number_matched,
        links,
    }
}

// =============================================================================
// Collections
// =============================================================================

/// Export a collection (without its items) as a STAC Collection
pub fn to_stac_collection(collection: &Collection) -> StacCollection {
    let bbox = collection
        .spatial_extent
        .map(|b| b.to_array())
        .unwrap_or(WHOLE_WORLD);
    let temporal = collection.temporal_extent;

    StacCollection {
        object_type: TYPE_COLLECTION.to_string(),
        stac_version: STAC_VERSION.to_string(),
        stac_extensions: Vec::new(),
        id: collection.id.clone(),
        title: collection.title.clone(),
        description: collection.description.clone(),
        keywords: collection.keywords.clone(),
        license: collection.license.clone(),
        providers: collection.providers.clone(),
        extent: StacExtent {
            spatial: StacSpatialExtent { bbox: vec![bbox] },
            temporal: StacTemporalExtent {
                interval: vec![[temporal.start, temporal.end]],
            },
        },
        links: collection.links.clone(),
        properties: collection.properties.clone(),
        created: Some(collection.meta.created),
        updated: Some(collection.meta.updated),
        internal_id: Some(collection.meta.internal_id),
    }
}

/// Export a collection together with all of its items
pub fn to_document(collection: &Collection) -> CollectionDocument {
    CollectionDocument {
        collection: to_stac_collection(collection),
        items: collection
            .items
            .iter()
            .map(|item| to_stac_item(item))
            .collect(),
    }
}

/// Rebuild a collection and its items from STAC documents
///
/// Extents are recomputed from the items rather than trusted from the
/// document. Items naming a different collection are rejected.
pub fn collection_from_stac(stac: StacCollection, items: Vec<StacItem>) -> Result<Collection> {
    if stac.object_type != TYPE_COLLECTION {
        return Err(Error::validation(format!(
            "Collection '{}' has type '{}', expected '{}'",
            stac.id, stac.object_type, TYPE_COLLECTION
        )));
    }

    let spec = CollectionSpec {
        id: stac.id,
        title: stac.title,
        description: stac.description,
        license: Some(stac.license),
        providers: stac.providers,
        keywords: stac.keywords,
        properties: stac.properties,
        links: stac.links,
    };
    let mut collection = Collection::from_spec(spec)?;

    let mut members = Vec::with_capacity(items.len());
    for stac_item in items {
        if let Some(owner) = &stac_item.collection {
            if owner != &collection.id {
                return Err(Error::validation(format!(
                    "Item '{}' belongs to collection '{}', not '{}'",
                    stac_item.id, owner, collection.id
                )));
            }
        }
        members.push(item_from_stac(stac_item)?);
    }
    collection.add_items(members)?;

    collection.meta = EntityMeta::restore(stac.internal_id, stac.created, stac.updated);
    collection.verify()?;
    Ok(collection)
}

/// Rebuild a collection from its persisted document
pub fn from_document(document: CollectionDocument) -> Result<Collection> {
    collection_from_stac(document.collection, document.items)
}
