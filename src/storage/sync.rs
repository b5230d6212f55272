//! Physical side effects of the page lifecycle
//!
//! - provision on create (and again after update, for new indexes)
//! - rename when a page's table name changes
//! - drop on delete
//!
//! A missing source on rename and a missing target on drop are benign and
//! reported as success. Any other failure surfaces as `STORAGE_SYNC_FAILED`.

use std::sync::Arc;

use super::backend::CollectionStore;
use super::errors::StorageError;
use crate::errors::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::FieldSpec;

/// Outcome of a rename request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// The source collection was never materialized
    SourceAbsent,
    /// Old and new names are equal
    Unchanged,
}

/// Keeps physical collections aligned with page metadata
#[derive(Debug, Clone)]
pub struct StorageSync {
    store: Arc<dyn CollectionStore>,
}

impl StorageSync {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// Creates the collection if absent and builds indexes for every
    /// `is_indexed` field. Idempotent.
    pub fn provision(&self, table_name: &str, fields: &[FieldSpec]) -> EngineResult<()> {
        let created = self
            .store
            .ensure_collection(table_name)
            .map_err(|e| sync_failure("provision", table_name, e))?;

        let mut new_indexes = Vec::new();
        for field in fields.iter().filter(|f| f.is_indexed) {
            let added = self
                .store
                .create_index(table_name, &field.field_name)
                .map_err(|e| sync_failure("index", table_name, e))?;
            if added {
                new_indexes.push(field.field_name.as_str());
            }
        }

        if created || !new_indexes.is_empty() {
            let indexes = new_indexes.join(",");
            log_event_with_fields(
                Event::CollectionProvisioned,
                &[("table", table_name), ("new_indexes", &indexes)],
            );
        }
        Ok(())
    }

    /// Renames `old` to `new`.
    ///
    /// # Errors
    ///
    /// `STORAGE_SYNC_FAILED` for anything other than a missing source,
    /// e.g. when `new` is already taken. The caller must not commit
    /// metadata after such a failure.
    pub fn rename(&self, old: &str, new: &str) -> EngineResult<RenameOutcome> {
        if old == new {
            return Ok(RenameOutcome::Unchanged);
        }
        match self.store.rename_collection(old, new) {
            Ok(()) => {
                log_event_with_fields(Event::CollectionRenamed, &[("from", old), ("to", new)]);
                Ok(RenameOutcome::Renamed)
            }
            Err(e) if e.is_absent() => Ok(RenameOutcome::SourceAbsent),
            Err(e) => {
                let reason = e.to_string();
                log_event_with_fields(
                    Event::RenameFailed,
                    &[("from", old), ("to", new), ("reason", &reason)],
                );
                Err(EngineError::storage_sync("Failed to rename database table."))
            }
        }
    }

    /// Drops the collection. Returns whether anything was removed.
    pub fn drop(&self, table_name: &str) -> EngineResult<bool> {
        match self.store.drop_collection(table_name) {
            Ok(dropped) => {
                if dropped {
                    log_event_with_fields(Event::CollectionDropped, &[("table", table_name)]);
                }
                Ok(dropped)
            }
            Err(e) if e.is_absent() => Ok(false),
            Err(e) => Err(sync_failure("drop", table_name, e)),
        }
    }

    pub fn exists(&self, table_name: &str) -> EngineResult<bool> {
        self.store
            .collection_exists(table_name)
            .map_err(|e| sync_failure("lookup", table_name, e))
    }
}

fn sync_failure(action: &str, table_name: &str, err: StorageError) -> EngineError {
    EngineError::storage_sync(format!(
        "Failed to {} table '{}': {}",
        action, table_name, err
    ))
}
