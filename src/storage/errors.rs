//! # Collection Storage Errors

use std::io;

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Physical collection errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    // Collection errors
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Invalid collection name: {0}")]
    InvalidName(String),

    // Document errors
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    // Durability errors
    #[error("Checksum mismatch in collection file: {0}")]
    ChecksumMismatch(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Whether the error only signals that the target collection is absent
    pub fn is_absent(&self) -> bool {
        matches!(self, StorageError::CollectionNotFound(_))
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
