//! # In-Memory Collection Store

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::backend::{validate_collection_name, Collection, CollectionStore};
use super::document::Document;
use super::errors::{StorageError, StorageResult};

/// Process-local store; rename is atomic under the write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl CollectionStore for MemoryStore {
    fn ensure_collection(&self, name: &str) -> StorageResult<bool> {
        validate_collection_name(name)?;
        let mut collections = self.write()?;
        if collections.contains_key(name) {
            return Ok(false);
        }
        collections.insert(name.to_string(), Collection::default());
        Ok(true)
    }

    fn collection_exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.read()?.contains_key(name))
    }

    fn list_collections(&self) -> StorageResult<Vec<String>> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn rename_collection(&self, from: &str, to: &str) -> StorageResult<()> {
        validate_collection_name(to)?;
        let mut collections = self.write()?;
        if !collections.contains_key(from) {
            return Err(StorageError::CollectionNotFound(from.to_string()));
        }
        if collections.contains_key(to) {
            return Err(StorageError::CollectionExists(to.to_string()));
        }
        if let Some(coll) = collections.remove(from) {
            collections.insert(to.to_string(), coll);
        }
        Ok(())
    }

    fn drop_collection(&self, name: &str) -> StorageResult<bool> {
        Ok(self.write()?.remove(name).is_some())
    }

    fn create_index(&self, name: &str, field: &str) -> StorageResult<bool> {
        validate_collection_name(name)?;
        let mut collections = self.write()?;
        let coll = collections.entry(name.to_string()).or_default();
        Ok(coll.indexes.insert(field.to_string()))
    }

    fn list_indexes(&self, name: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .read()?
            .get(name)
            .map(|c| c.indexes.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn insert(&self, name: &str, doc: Document) -> StorageResult<Document> {
        validate_collection_name(name)?;
        let mut collections = self.write()?;
        collections.entry(name.to_string()).or_default().insert(doc)
    }

    fn get(&self, name: &str, id: &str) -> StorageResult<Option<Document>> {
        Ok(self.read()?.get(name).and_then(|c| c.get(id).cloned()))
    }

    fn replace(&self, name: &str, doc: Document) -> StorageResult<Document> {
        let mut collections = self.write()?;
        match collections.get_mut(name) {
            Some(coll) => coll.replace(doc),
            None => Err(StorageError::DocumentNotFound(doc.id)),
        }
    }

    fn delete(&self, name: &str, id: &str) -> StorageResult<bool> {
        Ok(self
            .write()?
            .get_mut(name)
            .map(|c| c.delete(id))
            .unwrap_or(false))
    }

    fn count(&self, name: &str) -> StorageResult<usize> {
        Ok(self.read()?.get(name).map(|c| c.documents.len()).unwrap_or(0))
    }

    fn scan(&self, name: &str, skip: usize, limit: usize) -> StorageResult<Vec<Document>> {
        Ok(self
            .read()?
            .get(name)
            .map(|c| c.scan(skip, limit))
            .unwrap_or_default())
    }
}
