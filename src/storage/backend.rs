//! # Collection Store Trait
//!
//! The physical layer behind every page. A collection is created lazily by
//! the first write (or explicitly by provisioning); reads against a missing
//! collection see it as empty.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::document::Document;
use super::errors::{StorageError, StorageResult};

/// Maximum collection name length
pub const MAX_COLLECTION_NAME_LEN: usize = 64;

/// Backend trait for physical collections
pub trait CollectionStore: Send + Sync + std::fmt::Debug {
    /// Create the collection if absent. Returns true if it was created.
    fn ensure_collection(&self, name: &str) -> StorageResult<bool>;

    /// Check if a collection exists
    fn collection_exists(&self, name: &str) -> StorageResult<bool>;

    /// List collection names, sorted
    fn list_collections(&self) -> StorageResult<Vec<String>>;

    /// Rename a collection atomically.
    ///
    /// Fails with `CollectionNotFound` if `from` is missing and
    /// `CollectionExists` if `to` is already present.
    fn rename_collection(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Drop a collection. Returns false if it was not there.
    fn drop_collection(&self, name: &str) -> StorageResult<bool>;

    /// Declare an ascending index on a field. Returns true if it was new.
    fn create_index(&self, name: &str, field: &str) -> StorageResult<bool>;

    /// List indexed fields of a collection
    fn list_indexes(&self, name: &str) -> StorageResult<Vec<String>>;

    /// Insert a new document
    fn insert(&self, name: &str, doc: Document) -> StorageResult<Document>;

    /// Fetch a document by id
    fn get(&self, name: &str, id: &str) -> StorageResult<Option<Document>>;

    /// Replace an existing document (matched by id)
    fn replace(&self, name: &str, doc: Document) -> StorageResult<Document>;

    /// Delete a document. Returns false if it was not there.
    fn delete(&self, name: &str, id: &str) -> StorageResult<bool>;

    /// Number of documents
    fn count(&self, name: &str) -> StorageResult<usize>;

    /// Documents in insertion order, after skipping `skip`, at most `limit`
    fn scan(&self, name: &str, skip: usize, limit: usize) -> StorageResult<Vec<Document>>;

    /// Every document in insertion order
    fn all(&self, name: &str) -> StorageResult<Vec<Document>> {
        self.scan(name, 0, usize::MAX)
    }
}

/// Checks a collection name: 1-64 chars of `[A-Za-z0-9_-]`.
pub fn validate_collection_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.len() > MAX_COLLECTION_NAME_LEN {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Contents of one collection, shared by the memory and file stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub indexes: BTreeSet<String>,
    pub documents: Vec<Document>,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.position(id).map(|i| &self.documents[i])
    }

    pub fn insert(&mut self, doc: Document) -> StorageResult<Document> {
        if self.position(&doc.id).is_some() {
            return Err(StorageError::DuplicateId(doc.id));
        }
        self.documents.push(doc.clone());
        Ok(doc)
    }

    pub fn replace(&mut self, doc: Document) -> StorageResult<Document> {
        let idx = self
            .position(&doc.id)
            .ok_or_else(|| StorageError::DocumentNotFound(doc.id.clone()))?;
        self.documents[idx] = doc.clone();
        Ok(doc)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(idx) => {
                self.documents.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn scan(&self, skip: usize, limit: usize) -> Vec<Document> {
        self.documents.iter().skip(skip).take(limit).cloned().collect()
    }
}
