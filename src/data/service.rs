//! Generic CRUD over any page's records
//!
//! Every operation resolves `table_name -> page -> compiled handle` afresh,
//! so the field list in effect is always the one currently stored.

use serde_json::{Map, Value};

use super::pagination::{PageRequest, Paginated, Pagination};
use super::stats::{self, TableStats};
use crate::errors::{EngineError, EngineResult};
use crate::model::{ModelCompiler, ModelHandle};
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{validate, PageSchema, SchemaRegistry};
use crate::storage::Document;

/// Record operations for every registered page
#[derive(Debug, Clone)]
pub struct GenericDataService {
    registry: SchemaRegistry,
    compiler: ModelCompiler,
}

impl GenericDataService {
    pub fn new(registry: SchemaRegistry) -> Self {
        let compiler = ModelCompiler::new(registry.store());
        Self { registry, compiler }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    fn resolve(&self, table_name: &str) -> EngineResult<(PageSchema, ModelHandle)> {
        let page = self.registry.find_by_table(table_name)?;
        let handle = self.compiler.compile(&page.table_name, &page.fields);
        Ok((page, handle))
    }

    /// Records in insertion order. A page past the end is empty, not an error.
    pub fn list(&self, table_name: &str, request: PageRequest) -> EngineResult<Paginated> {
        let (_, handle) = self.resolve(table_name)?;
        let total = handle.count()?;
        let items = handle.scan(request.skip(), request.limit)?;
        Ok(Paginated {
            items,
            pagination: Pagination::new(total, request),
        })
    }

    /// Case-insensitive substring match over the page's search fields.
    ///
    /// A blank term is a plain listing.
    pub fn search(
        &self,
        table_name: &str,
        term: &str,
        request: PageRequest,
    ) -> EngineResult<Paginated> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.list(table_name, request);
        }

        let (page, handle) = self.resolve(table_name)?;
        let search_fields: Vec<&str> = page
            .search_fields()
            .map(|f| f.field_name.as_str())
            .collect();

        let matches = handle
            .all()?
            .into_iter()
            .filter(|doc| {
                search_fields.iter().any(|name| {
                    doc.get(name)
                        .and_then(|v| v.as_text())
                        .is_some_and(|text| text.to_lowercase().contains(&term))
                })
            })
            .collect();

        Ok(Paginated::from_all(matches, request))
    }

    pub fn get(&self, table_name: &str, id: &str) -> EngineResult<Document> {
        let (_, handle) = self.resolve(table_name)?;
        handle
            .find(id)?
            .ok_or_else(|| EngineError::record_not_found(id))
    }

    /// Seeds defaults, validates, then writes.
    ///
    /// # Errors
    ///
    /// `VALIDATION_FAILED` with the first violated rule; nothing is written.
    pub fn create(&self, table_name: &str, input: Map<String, Value>) -> EngineResult<Document> {
        let (page, handle) = self.resolve(table_name)?;

        let mut input = input;
        for field in &page.fields {
            if let Some(default) = &field.default_value {
                if !input.contains_key(&field.field_name) {
                    input.insert(field.field_name.clone(), default.clone());
                }
            }
        }

        validate(&page.fields, &input).map_err(|e| rejected(table_name, e))?;
        handle.insert(&input).map_err(|e| rejected(table_name, e))
    }

    /// Validates the submitted payload (not the merged record) against the
    /// full field list, then overwrites only the submitted keys.
    pub fn update(
        &self,
        table_name: &str,
        id: &str,
        input: Map<String, Value>,
    ) -> EngineResult<Document> {
        let (page, handle) = self.resolve(table_name)?;
        validate(&page.fields, &input).map_err(|e| rejected(table_name, e))?;
        handle
            .update(id, &input)
            .map_err(|e| rejected(table_name, e))?
            .ok_or_else(|| EngineError::record_not_found(id))
    }

    /// Removes a record, returning it.
    pub fn delete(&self, table_name: &str, id: &str) -> EngineResult<Document> {
        let (_, handle) = self.resolve(table_name)?;
        let doc = handle
            .find(id)?
            .ok_or_else(|| EngineError::record_not_found(id))?;
        if !handle.delete(id)? {
            return Err(EngineError::record_not_found(id));
        }
        Ok(doc)
    }

    pub fn stats(&self, table_name: &str) -> EngineResult<TableStats> {
        let (page, handle) = self.resolve(table_name)?;
        let docs = handle.all()?;
        Ok(stats::compute(page.stats_fields(), &docs))
    }
}

fn rejected(table_name: &str, err: EngineError) -> EngineError {
    if let Some(field) = err.field() {
        log_event_with_fields(
            Event::RecordRejected,
            &[("table", table_name), ("field", field)],
        );
    }
    err
}
