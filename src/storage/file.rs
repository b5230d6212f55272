//! Durable collection store
//!
//! One file per collection at `<root>/collections/<name>.json`:
//!
//! ```text
//! <crc32 of body, 8 hex digits>\n
//! <body: serialized Collection as JSON>
//! ```
//!
//! - Every load verifies the checksum; a mismatch aborts the operation.
//! - Every write goes to `<name>.json.tmp` and is renamed into place.
//! - Collection rename is a single `fs::rename`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crc32fast::Hasher;

use super::backend::{validate_collection_name, Collection, CollectionStore};
use super::document::Document;
use super::errors::{StorageError, StorageResult};

const FILE_EXTENSION: &str = "json";

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// File-backed store
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let dir = data_dir.join("collections");
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Directory holding the collection files
    pub fn collections_dir(&self) -> &Path {
        &self.dir
    }

    fn guard(&self) -> StorageResult<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn path_for(&self, name: &str) -> StorageResult<PathBuf> {
        validate_collection_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, FILE_EXTENSION)))
    }

    fn load(&self, name: &str) -> StorageResult<Option<Collection>> {
        let path = self.path_for(name)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let (header, body) = content
            .split_once('\n')
            .ok_or_else(|| StorageError::ChecksumMismatch(name.to_string()))?;
        let expected = u32::from_str_radix(header.trim(), 16)
            .map_err(|_| StorageError::ChecksumMismatch(name.to_string()))?;
        if compute_checksum(body.as_bytes()) != expected {
            return Err(StorageError::ChecksumMismatch(name.to_string()));
        }

        Ok(Some(serde_json::from_str(body)?))
    }

    fn save(&self, name: &str, coll: &Collection) -> StorageResult<()> {
        let path = self.path_for(name)?;
        let body = serde_json::to_string(coll)?;
        let content = format!("{:08x}\n{}", compute_checksum(body.as_bytes()), body);

        let tmp = path.with_extension(format!("{}.tmp", FILE_EXTENSION));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Loads, mutates, and saves one collection, creating it if absent.
    fn modify<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Collection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let _guard = self.guard()?;
        let mut coll = self.load(name)?.unwrap_or_default();
        let out = f(&mut coll)?;
        self.save(name, &coll)?;
        Ok(out)
    }

    fn read_only<T>(
        &self,
        name: &str,
        f: impl FnOnce(Option<&Collection>) -> T,
    ) -> StorageResult<T> {
        let _guard = self.guard()?;
        let coll = self.load(name)?;
        Ok(f(coll.as_ref()))
    }
}

impl CollectionStore for FileStore {
    fn ensure_collection(&self, name: &str) -> StorageResult<bool> {
        let _guard = self.guard()?;
        if self.path_for(name)?.exists() {
            return Ok(false);
        }
        self.save(name, &Collection::default())?;
        Ok(true)
    }

    fn collection_exists(&self, name: &str) -> StorageResult<bool> {
        match self.path_for(name) {
            Ok(path) => Ok(path.exists()),
            Err(StorageError::InvalidName(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn list_collections(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn rename_collection(&self, from: &str, to: &str) -> StorageResult<()> {
        let _guard = self.guard()?;
        let from_path = self.path_for(from)?;
        let to_path = self.path_for(to)?;
        if !from_path.exists() {
            return Err(StorageError::CollectionNotFound(from.to_string()));
        }
        if to_path.exists() {
            return Err(StorageError::CollectionExists(to.to_string()));
        }
        match fs::rename(&from_path, &to_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::CollectionNotFound(from.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn drop_collection(&self, name: &str) -> StorageResult<bool> {
        let _guard = self.guard()?;
        match fs::remove_file(self.path_for(name)?) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn create_index(&self, name: &str, field: &str) -> StorageResult<bool> {
        self.modify(name, |coll| Ok(coll.indexes.insert(field.to_string())))
    }

    fn list_indexes(&self, name: &str) -> StorageResult<Vec<String>> {
        self.read_only(name, |coll| {
            coll.map(|c| c.indexes.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn insert(&self, name: &str, doc: Document) -> StorageResult<Document> {
        self.modify(name, |coll| coll.insert(doc))
    }

    fn get(&self, name: &str, id: &str) -> StorageResult<Option<Document>> {
        self.read_only(name, |coll| coll.and_then(|c| c.get(id).cloned()))
    }

    fn replace(&self, name: &str, doc: Document) -> StorageResult<Document> {
        let _guard = self.guard()?;
        let mut coll = self
            .load(name)?
            .ok_or_else(|| StorageError::DocumentNotFound(doc.id.clone()))?;
        let out = coll.replace(doc)?;
        self.save(name, &coll)?;
        Ok(out)
    }

    fn delete(&self, name: &str, id: &str) -> StorageResult<bool> {
        let _guard = self.guard()?;
        let Some(mut coll) = self.load(name)? else {
            return Ok(false);
        };
        if !coll.delete(id) {
            return Ok(false);
        }
        self.save(name, &coll)?;
        Ok(true)
    }

    fn count(&self, name: &str) -> StorageResult<usize> {
        self.read_only(name, |coll| coll.map(|c| c.documents.len()).unwrap_or(0))
    }

    fn scan(&self, name: &str, skip: usize, limit: usize) -> StorageResult<Vec<Document>> {
        self.read_only(name, |coll| {
            coll.map(|c| c.scan(skip, limit)).unwrap_or_default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FieldValue;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn doc(n: f64) -> Document {
        let mut fields = BTreeMap::new();
        fields.insert("n".to_string(), FieldValue::Number(n));
        Document::new(fields)
    }

    #[test]
    fn test_checksum_deterministic() {
        let data = b"collection body";
        assert_eq!(compute_checksum(data), compute_checksum(data));
        assert_ne!(compute_checksum(b"a"), compute_checksum(b"b"));
    }

    #[test]
    fn test_documents_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let id = {
            let store = FileStore::open(tmp.path()).unwrap();
            store.insert("t", doc(1.0)).unwrap().id
        };

        let store = FileStore::open(tmp.path()).unwrap();
        let loaded = store.get("t", &id).unwrap().unwrap();
        assert_eq!(loaded.get("n"), Some(&FieldValue::Number(1.0)));
    }

    #[test]
    fn test_corruption_is_detected() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.insert("t", doc(1.0)).unwrap();

        let path = store.collections_dir().join("t.json");
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("1.0", "2.0")).unwrap();

        assert!(matches!(
            store.count("t"),
            Err(StorageError::ChecksumMismatch(_))
        ));
    }

    #[test]
    fn test_rename_and_drop() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        let d = store.insert("old", doc(2.0)).unwrap();

        store.rename_collection("old", "new").unwrap();
        assert_eq!(store.list_collections().unwrap(), vec!["new"]);
        assert_eq!(store.get("new", &d.id).unwrap(), Some(d));
        assert!(store.rename_collection("old", "other").unwrap_err().is_absent());

        assert!(store.drop_collection("new").unwrap());
        assert!(!store.drop_collection("new").unwrap());
    }

    #[test]
    fn test_scan_order_and_count() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        for n in 0..5 {
            store.insert("t", doc(n as f64)).unwrap();
        }
        assert_eq!(store.count("t").unwrap(), 5);
        let page: Vec<_> = store
            .scan("t", 2, 2)
            .unwrap()
            .into_iter()
            .map(|d| d.get("n").cloned())
            .collect();
        assert_eq!(
            page,
            vec![Some(FieldValue::Number(2.0)), Some(FieldValue::Number(3.0))]
        );
    }

    #[test]
    fn test_invalid_names_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        assert!(matches!(
            store.insert("../x", doc(1.0)),
            Err(StorageError::InvalidName(_))
        ));
        assert!(!store.collection_exists("../x").unwrap());
    }
}
