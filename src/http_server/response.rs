//! # Response Envelopes
//!
//! Success bodies carry `"success": true` next to their payload.

use serde::Serialize;
use serde_json::Value;

use crate::data::{Paginated, Pagination};

/// Single item response
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Unpaginated list response
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

/// Paginated record listing
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse {
    pub success: bool,
    /// Items in this window
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

impl From<Paginated> for PaginatedResponse {
    fn from(page: Paginated) -> Self {
        let data: Vec<Value> = page.items.iter().map(|d| d.to_json()).collect();
        Self {
            success: true,
            count: data.len(),
            pagination: page.pagination,
            data,
        }
    }
}

/// Body of a successful delete: `{"success": true, "data": {}}`
pub fn deleted() -> DataResponse<Value> {
    DataResponse::new(Value::Object(Default::default()))
}
