//! Page arithmetic for newest-first feeds and listings
//!
//! Page numbers are 1-based. A missing or non-numeric page resolves to the
//! first page, a page past the end resolves to the last one, and an empty
//! collection still has one (empty) page.

use serde::{Deserialize, Serialize};

/// Number of items per page
pub const PAGE_SIZE: i64 = 10;

/// Raw `?page=` query parameter
///
/// Kept as a string so `?page=abc` falls back to page 1 instead of failing
/// extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Resolve a requested page number against the collection size
    pub fn resolve(requested: Option<&str>, total: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        let number = match requested.and_then(|raw| raw.trim().parse::<i64>().ok()) {
            Some(n) if n >= 1 && n <= num_pages => n,
            Some(n) if n > num_pages => num_pages,
            Some(_) => num_pages,
            None => 1,
        };

        Self {
            number,
            num_pages,
            total,
            per_page,
        }
    }

    /// SQL `OFFSET` of this page
    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    /// SQL `LIMIT` of this page
    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// One page of items plus navigation data
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub num_pages: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest) -> Self {
        Self {
            items,
            page: request.number,
            num_pages: request.num_pages,
            total: request.total,
            has_next: request.has_next(),
            has_previous: request.has_previous(),
        }
    }
}
