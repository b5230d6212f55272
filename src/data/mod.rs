//! Record operations over compiled page models
//!
//! List, search, get, create, update, delete and statistics for any table
//! owned by a registered page.

mod pagination;
mod service;
mod stats;

pub use pagination::{PageRequest, Paginated, Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use service::GenericDataService;
pub use stats::{FieldStats, TableStats};
