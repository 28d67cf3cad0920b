//! Id-keyed entity collections.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::Error;

/// Opaque entity identifier.
///
/// New ids are UUID v7 strings (time-sortable). Ids that arrive from a remote
/// snapshot are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new unique id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("id must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Anything stored in an [`EntityCollection`].
pub trait Entity {
    fn id(&self) -> &EntityId;
}

/// Ordered collection whose items have unique ids.
///
/// Newest items sit at the front. Serialized as a plain JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCollection<T> {
    items: Vec<T>,
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityCollection<T> {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a collection from untrusted items, keeping the first occurrence
    /// of each id.
    pub fn from_items(items: Vec<T>) -> Self {
        let mut collection = Self::new();
        collection.replace_all(items);
        collection
    }

    /// Replace every item. Returns how many duplicate ids were dropped.
    pub fn replace_all(&mut self, items: Vec<T>) -> usize {
        let total = items.len();
        let mut seen = HashSet::with_capacity(total);
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.id().clone()))
            .collect();
        let dropped = total - self.items.len();
        if dropped > 0 {
            tracing::warn!(dropped, "Dropped entities with duplicate ids");
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Insert a new item at the front.
    pub fn insert(&mut self, item: T) -> crate::Result<()> {
        if self.contains(item.id()) {
            return Err(Error::DuplicateId(item.id().to_string()));
        }
        self.items.insert(0, item);
        Ok(())
    }

    pub fn remove(&mut self, id: &EntityId) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    /// Items whose id starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&T> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| item.id().as_str().starts_with(prefix))
            .collect()
    }
}

impl<T: Clone> EntityCollection<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<'a, T> IntoIterator for &'a EntityCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for EntityCollection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Entity + Deserialize<'de>> Deserialize<'de> for EntityCollection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_items)
    }
}
