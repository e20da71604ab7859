//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Pagination query parameters (DRY - reusable across all list endpoints)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
pub struct PaginationParams {
    /// 1-indexed page number
    #[serde(default = "default_page")]
    pub page: u64,
    /// Items per page (capped at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Page number, never below 1
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Calculate offset for database query
    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.limit()
    }

    /// Get limit clamped to 1..=MAX_PAGE_SIZE
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results as returned by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl<T> Paginated<T> {
    /// Create new paginated result
    pub fn new(items: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        Self {
            items,
            total,
            page: params.page(),
            per_page: params.limit(),
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.per_page > 0 {
            self.total.div_ceil(self.per_page)
        } else {
            0
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Pagination block attached to list responses
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub total: u64,
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub next_page_url: Option<String>,
    pub prev_page_url: Option<String>,
}

impl PaginationMeta {
    /// Build metadata with absolute links.
    ///
    /// `base_url` is the public origin plus request path; `query` is the raw
    /// query string of the current request, whose `page` parameter is replaced.
    pub fn new<T>(page: &Paginated<T>, base_url: &str, query: Option<&str>) -> Self {
        let link = |target: u64| page_url(base_url, query, target);

        Self {
            total: page.total,
            count: page.items.len() as u64,
            per_page: page.per_page,
            current_page: page.page,
            total_pages: page.total_pages(),
            next_page_url: page.has_next().then(|| link(page.page + 1)),
            prev_page_url: page.has_prev().then(|| link(page.page - 1)),
        }
    }
}

fn page_url(base_url: &str, query: Option<&str>, page: u64) -> String {
    let mut pairs: Vec<&str> = query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page="))
        .collect();
    let page_pair = format!("page={}", page);
    pairs.push(&page_pair);

    format!("{}?{}", base_url, pairs.join("&"))
}
