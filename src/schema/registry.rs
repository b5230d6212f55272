//! Page registry
//!
//! Durable store of page definitions, kept in the reserved `_pages`
//! collection of the same store that holds the records. The registry is the
//! single source of truth for which pages and tables exist.
//!
//! Table renames are journaled: the pending page is written to `_renames`
//! before storage is touched and removed after the metadata commit. A crash
//! in between leaves the intent behind for [`SchemaRegistry::reconcile`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::types::{route_for, table_name_for, FieldSpec, PageSchema};
use crate::errors::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{CollectionStore, Document, FieldValue, StorageSync};

/// Collection holding page metadata
pub const PAGES_COLLECTION: &str = "_pages";

/// Collection holding in-flight rename intents
pub const RENAMES_COLLECTION: &str = "_renames";

/// Body of a page create request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInput {
    #[serde(default)]
    pub page_name: String,
    #[serde(default)]
    pub page_description: String,
    /// Derived from `page_name` when absent or blank
    #[serde(default)]
    pub route: Option<String>,
    /// Derived from `page_name` when absent or blank
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Body of a page update request; absent keys keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageUpdate {
    #[serde(default)]
    pub page_name: Option<String>,
    #[serde(default)]
    pub page_description: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldSpec>>,
    /// Expected stored version; a mismatch fails with `CONFLICT`
    #[serde(default)]
    pub version: Option<u64>,
}

/// Registry of page definitions
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    store: Arc<dyn CollectionStore>,
    sync: StorageSync,
}

impl SchemaRegistry {
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        let sync = StorageSync::new(Arc::clone(&store));
        Self { store, sync }
    }

    /// Store shared with the data service
    pub fn store(&self) -> Arc<dyn CollectionStore> {
        Arc::clone(&self.store)
    }

    pub fn sync(&self) -> &StorageSync {
        &self.sync
    }

    /// All pages in creation order
    pub fn list(&self) -> EngineResult<Vec<PageSchema>> {
        self.store
            .all(PAGES_COLLECTION)?
            .iter()
            .map(decode_page)
            .collect()
    }

    pub fn get(&self, id: &str) -> EngineResult<PageSchema> {
        match self.store.get(PAGES_COLLECTION, id)? {
            Some(doc) => decode_page(&doc),
            None => Err(EngineError::page_not_found(id)),
        }
    }

    /// Resolves the page owning `table_name`.
    pub fn find_by_table(&self, table_name: &str) -> EngineResult<PageSchema> {
        self.list()?
            .into_iter()
            .find(|p| p.table_name == table_name)
            .ok_or_else(|| EngineError::table_not_found(table_name))
    }

    /// Creates a page and provisions its collection.
    ///
    /// # Errors
    ///
    /// - `VALIDATION_FAILED` for a malformed definition
    /// - `CONFLICT` if name, route or table is taken
    pub fn create(&self, input: PageInput) -> EngineResult<PageSchema> {
        let page_name = input.page_name.trim().to_string();
        let route = non_blank(input.route).unwrap_or_else(|| route_for(&page_name));
        let table_name = non_blank(input.table_name).unwrap_or_else(|| table_name_for(&page_name));

        let mut page = PageSchema {
            id: Uuid::new_v4().to_string(),
            page_name,
            page_description: input.page_description.trim().to_string(),
            route,
            table_name,
            fields: input.fields,
            version: 1,
            created_at: Utc::now(),
        };
        page.fields.iter_mut().for_each(FieldSpec::normalize);
        page.validate_structure().map_err(EngineError::invalid)?;
        self.ensure_unique(&page, None)?;

        self.store.insert(PAGES_COLLECTION, encode_page(&page)?)?;
        if let Err(e) = self.sync.provision(&page.table_name, &page.fields) {
            self.store.delete(PAGES_COLLECTION, &page.id)?;
            return Err(e);
        }

        log_event_with_fields(
            Event::PageCreated,
            &[("page_id", &page.id), ("table", &page.table_name)],
        );
        Ok(page)
    }

    /// Applies a partial update.
    ///
    /// When the table name changes, storage is renamed before the new
    /// metadata is committed; a rename failure leaves the stored page
    /// untouched.
    pub fn update(&self, id: &str, changes: PageUpdate) -> EngineResult<PageSchema> {
        let current = self.get(id)?;

        if let Some(expected) = changes.version {
            if expected != current.version {
                return Err(EngineError::conflict(format!(
                    "Page was modified concurrently (expected version {}, found {})",
                    expected, current.version
                )));
            }
        }

        let mut next = current.clone();
        if let Some(name) = changes.page_name {
            next.page_name = name.trim().to_string();
        }
        if let Some(description) = changes.page_description {
            next.page_description = description.trim().to_string();
        }
        if let Some(route) = changes.route {
            next.route = route.trim().to_string();
        }
        if let Some(table_name) = changes.table_name {
            next.table_name = table_name.trim().to_string();
        }
        if let Some(fields) = changes.fields {
            next.fields = fields;
        }
        next.fields.iter_mut().for_each(FieldSpec::normalize);
        next.validate_structure().map_err(EngineError::invalid)?;
        self.ensure_unique(&next, Some(id))?;
        next.version = current.version + 1;

        if next.table_name != current.table_name {
            self.write_intent(&current.table_name, &next)?;
            if let Err(e) = self.sync.rename(&current.table_name, &next.table_name) {
                self.clear_intent(id)?;
                return Err(e);
            }
            self.store.replace(PAGES_COLLECTION, encode_page(&next)?)?;
            self.clear_intent(id)?;
        } else {
            self.store.replace(PAGES_COLLECTION, encode_page(&next)?)?;
        }

        self.sync.provision(&next.table_name, &next.fields)?;

        let version = next.version.to_string();
        log_event_with_fields(
            Event::PageUpdated,
            &[
                ("page_id", &next.id),
                ("table", &next.table_name),
                ("version", &version),
            ],
        );
        Ok(next)
    }

    /// Drops the page's collection, then its metadata.
    pub fn delete(&self, id: &str) -> EngineResult<PageSchema> {
        let page = self.get(id)?;
        self.sync.drop(&page.table_name)?;
        self.store.delete(PAGES_COLLECTION, id)?;
        self.clear_intent(id)?;

        log_event_with_fields(
            Event::PageDeleted,
            &[("page_id", &page.id), ("table", &page.table_name)],
        );
        Ok(page)
    }

    /// Finishes renames interrupted between the storage step and the
    /// metadata commit. Returns the number of intents processed.
    ///
    /// For each intent:
    /// - page gone: the intent is discarded
    /// - source present, target free: storage is renamed, then committed
    /// - source gone, target present: the metadata is committed
    /// - both present: the update is rolled back
    pub fn reconcile(&self) -> EngineResult<usize> {
        let intents = self.store.all(RENAMES_COLLECTION)?;
        let mut processed = 0;

        for intent in &intents {
            let pending = decode_intent(intent)?;
            if self.store.get(PAGES_COLLECTION, &intent.id)?.is_some() {
                let from_exists = self.sync.exists(&pending.from)?;
                let to_exists = self.sync.exists(&pending.page.table_name)?;
                let commit = match (from_exists, to_exists) {
                    (true, false) => {
                        self.sync.rename(&pending.from, &pending.page.table_name)?;
                        true
                    }
                    (true, true) => false,
                    (false, _) => true,
                };
                if commit {
                    self.store
                        .replace(PAGES_COLLECTION, encode_page(&pending.page)?)?;
                }
            }
            self.clear_intent(&intent.id)?;
            processed += 1;
        }

        let count = processed.to_string();
        log_event_with_fields(Event::ReconcileComplete, &[("intents", &count)]);
        Ok(processed)
    }

    fn ensure_unique(&self, page: &PageSchema, exclude_id: Option<&str>) -> EngineResult<()> {
        for other in self.list()? {
            if Some(other.id.as_str()) == exclude_id {
                continue;
            }
            if other.page_name == page.page_name {
                return Err(EngineError::conflict(format!(
                    "A page named '{}' already exists",
                    page.page_name
                )));
            }
            if other.route == page.route {
                return Err(EngineError::conflict(format!(
                    "Route '{}' is already in use",
                    page.route
                )));
            }
            if other.table_name == page.table_name {
                return Err(EngineError::conflict(format!(
                    "Table '{}' is already in use",
                    page.table_name
                )));
            }
        }
        Ok(())
    }

    fn write_intent(&self, from: &str, next: &PageSchema) -> EngineResult<()> {
        let mut fields = BTreeMap::new();
        fields.insert("from".to_string(), FieldValue::Text(from.to_string()));
        fields.insert("page".to_string(), FieldValue::Other(to_json(next)?));
        self.clear_intent(&next.id)?;
        self.store
            .insert(RENAMES_COLLECTION, Document::with_id(next.id.clone(), fields))?;
        Ok(())
    }

    fn clear_intent(&self, page_id: &str) -> EngineResult<()> {
        self.store.delete(RENAMES_COLLECTION, page_id)?;
        Ok(())
    }
}

struct RenameIntent {
    from: String,
    page: PageSchema,
}

fn decode_intent(doc: &Document) -> EngineResult<RenameIntent> {
    let from = doc.get("from").and_then(FieldValue::as_text);
    let page = doc.get("page").map(FieldValue::to_json);
    match (from, page) {
        (Some(from), Some(page)) => Ok(RenameIntent {
            from,
            page: serde_json::from_value(page)
                .map_err(|e| EngineError::internal(format!("Corrupt rename intent: {}", e)))?,
        }),
        _ => Err(EngineError::internal(format!(
            "Corrupt rename intent for page '{}'",
            doc.id
        ))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn to_json(page: &PageSchema) -> EngineResult<Value> {
    serde_json::to_value(page)
        .map_err(|e| EngineError::internal(format!("Failed to encode page: {}", e)))
}

fn encode_page(page: &PageSchema) -> EngineResult<Document> {
    match to_json(page)? {
        Value::Object(obj) => Ok(Document::from_json_object(page.id.clone(), obj)),
        _ => Err(EngineError::internal("Page did not encode as an object")),
    }
}

fn decode_page(doc: &Document) -> EngineResult<PageSchema> {
    let mut obj = doc.fields_json();
    obj.insert("id".to_string(), Value::String(doc.id.clone()));
    serde_json::from_value(Value::Object(obj))
        .map_err(|e| EngineError::internal(format!("Corrupt page metadata '{}': {}", doc.id, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::schema::FieldType;
    use crate::storage::MemoryStore;

    fn registry() -> (Arc<MemoryStore>, SchemaRegistry) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SchemaRegistry::new(store))
    }

    fn products() -> PageInput {
        PageInput {
            page_name: "Products".into(),
            page_description: "All products".into(),
            route: None,
            table_name: None,
            fields: vec![FieldSpec::required("title", FieldType::Text)],
        }
    }

    #[test]
    fn test_create_derives_route_and_table() {
        let (store, reg) = registry();
        let page = reg.create(products()).unwrap();
        assert_eq!(page.route, "/products");
        assert_eq!(page.table_name, "table_products");
        assert_eq!(page.version, 1);
        assert!(store.collection_exists("table_products").unwrap());
        assert_eq!(reg.get(&page.id).unwrap(), page);
    }

    #[test]
    fn test_create_requires_name_and_description() {
        let (_, reg) = registry();
        let err = reg.create(PageInput::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.message(), "Please add a page name");

        let err = reg
            .create(PageInput {
                page_name: "X".into(),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.message(), "Please add a description");
    }

    #[test]
    fn test_create_conflicts() {
        let (_, reg) = registry();
        reg.create(products()).unwrap();

        let err = reg.create(products()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);

        let mut other = products();
        other.page_name = "Other".into();
        other.table_name = Some("table_products".into());
        assert_eq!(reg.create(other).unwrap_err().code(), ErrorCode::Conflict);
    }

    #[test]
    fn test_reserved_table_names_rejected() {
        let (_, reg) = registry();
        let mut input = products();
        input.table_name = Some("_pages".into());
        assert_eq!(
            reg.create(input).unwrap_err().code(),
            ErrorCode::ValidationFailed
        );
    }

    #[test]
    fn test_reserved_field_names_rejected() {
        let (store, reg) = registry();
        let mut input = products();
        input.fields.push(FieldSpec::required("createdAt", FieldType::Date));

        let err = reg.create(input).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(err.message().contains("reserved"));
        assert!(reg.list().unwrap().is_empty());
        assert!(!store.collection_exists("table_products").unwrap());

        let page = reg.create(products()).unwrap();
        let err = reg
            .update(
                &page.id,
                PageUpdate {
                    fields: Some(vec![FieldSpec::new("id", FieldType::Text)]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_create_derives_names_from_punctuated_titles() {
        let (store, reg) = registry();
        for (name, table, route) in [
            ("Sales (2024)", "table_sales_2024", "/sales-2024"),
            ("Café Menu", "table_caf_menu", "/caf-menu"),
            ("Q&A", "table_q_a", "/q-a"),
        ] {
            let page = reg
                .create(PageInput {
                    page_name: name.into(),
                    page_description: "Derived".into(),
                    ..Default::default()
                })
                .unwrap();
            assert_eq!(page.table_name, table);
            assert_eq!(page.route, route);
            assert!(store.collection_exists(table).unwrap());
        }
    }

    #[test]
    fn test_failed_provision_unregisters_page() {
        use crate::storage::FileStore;
        use std::fs;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        fs::write(
            store.collections_dir().join("table_products.json"),
            "00000000\n{}",
        )
        .unwrap();
        let reg = SchemaRegistry::new(store.clone());

        let mut input = products();
        input.fields[0].is_indexed = true;
        let err = reg.create(input).unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageSyncFailed);
        assert!(reg.list().unwrap().is_empty());
    }

    #[test]
    fn test_metadata_survives_round_trip() {
        let (_, reg) = registry();
        let mut input = products();
        let mut price = FieldSpec::new("price", FieldType::Number);
        price.default_value = Some(serde_json::json!(5));
        price.is_used_for_stats = true;
        input.fields.push(price);
        let page = reg.create(input).unwrap();

        let loaded = reg.find_by_table("table_products").unwrap();
        assert_eq!(loaded, page);
    }

    #[test]
    fn test_update_is_partial_and_bumps_version() {
        let (_, reg) = registry();
        let page = reg.create(products()).unwrap();
        let updated = reg
            .update(
                &page.id,
                PageUpdate {
                    page_description: Some("Catalog".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.page_description, "Catalog");
        assert_eq!(updated.page_name, "Products");
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn test_update_stale_version_conflicts() {
        let (_, reg) = registry();
        let page = reg.create(products()).unwrap();
        let err = reg
            .update(
                &page.id,
                PageUpdate {
                    version: Some(7),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[test]
    fn test_update_unknown_page() {
        let (_, reg) = registry();
        let err = reg.update("nope", PageUpdate::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PageNotFound);
    }

    #[test]
    fn test_rename_moves_collection() {
        let (store, reg) = registry();
        let page = reg.create(products()).unwrap();
        store
            .insert("table_products", Document::new(BTreeMap::new()))
            .unwrap();

        reg.update(
            &page.id,
            PageUpdate {
                table_name: Some("table_catalog".into()),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!store.collection_exists("table_products").unwrap());
        assert_eq!(store.count("table_catalog").unwrap(), 1);
        assert!(store.all(RENAMES_COLLECTION).unwrap().is_empty());
    }

    #[test]
    fn test_failed_rename_keeps_metadata() {
        let (store, reg) = registry();
        let page = reg.create(products()).unwrap();
        store.ensure_collection("table_orphan").unwrap();

        let err = reg
            .update(
                &page.id,
                PageUpdate {
                    table_name: Some("table_orphan".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::StorageSyncFailed);
        assert_eq!(reg.get(&page.id).unwrap().table_name, "table_products");
        assert!(store.all(RENAMES_COLLECTION).unwrap().is_empty());
    }

    #[test]
    fn test_update_provisions_new_indexes() {
        let (store, reg) = registry();
        let page = reg.create(products()).unwrap();
        let mut fields = page.fields.clone();
        fields[0].is_indexed = true;
        reg.update(
            &page.id,
            PageUpdate {
                fields: Some(fields),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            store.list_indexes("table_products").unwrap(),
            vec!["title".to_string()]
        );
    }

    #[test]
    fn test_delete_drops_collection() {
        let (store, reg) = registry();
        let page = reg.create(products()).unwrap();
        reg.delete(&page.id).unwrap();
        assert!(!store.collection_exists("table_products").unwrap());
        assert_eq!(reg.get(&page.id).unwrap_err().code(), ErrorCode::PageNotFound);
        assert_eq!(
            reg.find_by_table("table_products").unwrap_err().code(),
            ErrorCode::TableNotFound
        );
    }

    #[test]
    fn test_reconcile_completes_interrupted_rename() {
        let (store, reg) = registry();
        let page = reg.create(products()).unwrap();
        store
            .insert("table_products", Document::new(BTreeMap::new()))
            .unwrap();

        // Simulate a crash right after the intent was journaled.
        let mut next = page.clone();
        next.table_name = "table_catalog".into();
        next.version = 2;
        reg.write_intent("table_products", &next).unwrap();

        assert_eq!(reg.reconcile().unwrap(), 1);
        assert_eq!(reg.get(&page.id).unwrap().table_name, "table_catalog");
        assert_eq!(store.count("table_catalog").unwrap(), 1);
        assert!(store.all(RENAMES_COLLECTION).unwrap().is_empty());
    }

    #[test]
    fn test_reconcile_commits_after_storage_rename() {
        let (store, reg) = registry();
        let page = reg.create(products()).unwrap();
        let mut next = page.clone();
        next.table_name = "table_catalog".into();
        reg.write_intent("table_products", &next).unwrap();
        store
            .rename_collection("table_products", "table_catalog")
            .unwrap();

        reg.reconcile().unwrap();
        assert_eq!(reg.get(&page.id).unwrap().table_name, "table_catalog");
    }

    #[test]
    fn test_reconcile_with_nothing_pending() {
        let (_, reg) = registry();
        assert_eq!(reg.reconcile().unwrap(), 0);
    }
}
