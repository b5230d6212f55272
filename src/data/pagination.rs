//! Page/limit handling for record listings

use serde::{Deserialize, Serialize};

use crate::storage::Document;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// Requested window. Both values are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Zero values fall back to the defaults.
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Parses raw query values. Missing, non-numeric, zero or negative
    /// values fall back to the defaults.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(parse_positive(page), parse_positive(limit))
    }

    /// Number of records before this window
    pub fn skip(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok()).unwrap_or(0)
}

/// Pagination block of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    /// `ceil(total / limit)`
    pub pages: usize,
}

impl Pagination {
    pub fn new(total: usize, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            pages: total.div_ceil(request.limit),
        }
    }
}

/// One window of records plus its pagination block
#[derive(Debug, Clone)]
pub struct Paginated {
    pub items: Vec<Document>,
    pub pagination: Pagination,
}

impl Paginated {
    /// Cuts a window out of an already filtered list.
    pub fn from_all(all: Vec<Document>, request: PageRequest) -> Self {
        let pagination = Pagination::new(all.len(), request);
        let items = all
            .into_iter()
            .skip(request.skip())
            .take(request.limit)
            .collect();
        Self { items, pagination }
    }
}
