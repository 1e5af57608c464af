//! Catalog items and the deduplicated, insertion-ordered catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One deduplicated remote asset record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Source-assigned identifier, unique within a catalog.
    pub id: String,
    /// Display name (`description`, else `name`, else the id).
    pub name: String,
    /// Partitions the item was observed in, in observation order.
    #[serde(default)]
    pub partitions: Vec<String>,
    /// Raw fields of the first-seen record.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Artifact file stem, fixed once the item is written to a snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_name: Option<String>,
}

impl CatalogItem {
    /// Builds an item from a raw search record.
    ///
    /// Returns `None` for records that are not objects or carry no usable `id`.
    #[must_use]
    pub fn from_record(record: &Value, partition: &str) -> Option<Self> {
        let attributes = record.as_object()?;
        let id = record_id(record)?;
        let name = display_name(attributes).unwrap_or_else(|| id.clone());
        Some(Self {
            id,
            name,
            partitions: vec![partition.to_string()],
            attributes: attributes.clone(),
            artifact_name: None,
        })
    }

    /// Motion type from the raw attributes, when present.
    #[must_use]
    pub fn product_type(&self) -> Option<&str> {
        self.attributes
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }
}

/// Extracts a record identifier; numeric ids are accepted and stringified.
#[must_use]
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn display_name(attributes: &Map<String, Value>) -> Option<String> {
    ["description", "name"].iter().find_map(|key| {
        attributes
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

/// Deduplicated catalog keyed by identifier, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unique items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when the catalog holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if an item with `id` is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Looks up an item by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// Inserts a new item. An existing entry with the same id is never replaced;
    /// returns false in that case.
    pub fn insert(&mut self, item: CatalogItem) -> bool {
        if self.index.contains_key(&item.id) {
            return false;
        }
        self.index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
        true
    }

    /// Records that `id` was observed again in `partition`.
    pub fn note_partition(&mut self, id: &str, partition: &str) {
        if let Some(&position) = self.index.get(id) {
            let partitions = &mut self.items[position].partitions;
            if !partitions.iter().any(|p| p == partition) {
                partitions.push(partition.to_string());
            }
        }
    }

    /// Iterates items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogItem> {
        self.items.iter()
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Items in insertion order, for updating fields other than the id.
    pub(crate) fn items_mut(&mut self) -> &mut [CatalogItem] {
        &mut self.items
    }

    /// Consumes the catalog, returning its items in insertion order.
    #[must_use]
    pub fn into_items(self) -> Vec<CatalogItem> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogItem;
    type IntoIter = std::slice::Iter<'a, CatalogItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<CatalogItem> for Catalog {
    fn from_iter<I: IntoIterator<Item = CatalogItem>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}
