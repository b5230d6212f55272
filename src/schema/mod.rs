//! Page definitions, record validation and the page registry
//!
//! # Design Principles
//!
//! - Pages are data: declared at runtime, stored as metadata
//! - Records are validated against the current field list before any write
//! - The first violated rule is the only one reported
//! - Registry changes drive the physical collection lifecycle

mod registry;
mod types;
mod validator;

pub use registry::{PageInput, PageUpdate, SchemaRegistry, PAGES_COLLECTION, RENAMES_COLLECTION};
pub use types::{
    route_for, table_name_for, validate_table_name, FieldSpec, FieldType, PageSchema,
    ValidationRules,
};
pub use validator::{validate, RecordValidator};
