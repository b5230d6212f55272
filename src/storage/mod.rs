//! Physical storage for page records and page metadata
//!
//! Every page's records live in one collection named by its table name.
//! Collections whose names start with `_` are reserved for the engine
//! (`_pages`, `_renames`).
//!
//! # Design Principles
//!
//! - Collections are open: documents carry any keys
//! - Reads of a missing collection see it as empty
//! - Rename is atomic in both stores
//! - File store verifies a checksum on every load

mod backend;
mod document;
mod errors;
mod file;
mod memory;
mod sync;
mod value;

pub use backend::{validate_collection_name, Collection, CollectionStore, MAX_COLLECTION_NAME_LEN};
pub use document::{is_reserved_key, Document, RESERVED_KEYS};
pub use errors::{StorageError, StorageResult};
pub use file::{compute_checksum, FileStore};
pub use memory::MemoryStore;
pub use sync::{RenameOutcome, StorageSync};
pub use value::FieldValue;
