use crate::records::Identified;
use crate::{RecordError, RecordResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Insertion-ordered list of entities with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<E> {
    items: Vec<E>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<E: Identified> Collection<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records that must already have unique ids.
    pub fn try_from_vec(items: Vec<E>) -> RecordResult<Self> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(RecordError::DuplicateId {
                    collection: E::COLLECTION,
                    id: item.id().to_string(),
                });
            }
        }
        Ok(Self { items })
    }

    /// Build from stored records, keeping the first of any repeated id.
    pub fn from_hydrated(items: Vec<E>) -> Self {
        let mut collection = Self::new();
        for item in items {
            if collection.contains(item.id()) {
                tracing::warn!(
                    collection = E::COLLECTION,
                    id = item.id(),
                    "dropping stored record with repeated id"
                );
                continue;
            }
            collection.items.push(item);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.items.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Append `item`. Fails if its id is already present.
    pub fn add(&mut self, item: E) -> RecordResult<&E> {
        if self.contains(item.id()) {
            return Err(RecordError::DuplicateId {
                collection: E::COLLECTION,
                id: item.id().to_string(),
            });
        }
        self.items.push(item);
        let index = self.items.len() - 1;
        Ok(&self.items[index])
    }

    /// Edit the entity with `id` in place.
    ///
    /// `edit` works on a copy; the stored entity is replaced only if `edit` succeeds.
    pub fn update_with<F>(&mut self, id: &str, edit: F) -> RecordResult<&E>
    where
        E: Clone,
        F: FnOnce(&mut E) -> RecordResult<()>,
    {
        let index = self.position(id)?;
        let mut updated = self.items[index].clone();
        edit(&mut updated)?;
        self.items[index] = updated;
        Ok(&self.items[index])
    }

    pub fn remove(&mut self, id: &str) -> RecordResult<E> {
        let index = self.position(id)?;
        Ok(self.items.remove(index))
    }

    /// Keep entities matching `keep`. Returns how many were removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&E) -> bool,
    {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    pub fn into_vec(self) -> Vec<E> {
        self.items
    }

    fn position(&self, id: &str) -> RecordResult<usize> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| RecordError::NotFound {
                collection: E::COLLECTION,
                id: id.to_string(),
            })
    }
}

impl<'a, E> IntoIterator for &'a Collection<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
