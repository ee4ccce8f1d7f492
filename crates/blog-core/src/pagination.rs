//! Page arithmetic for post listings.

use crate::error::DomainError;

/// Fixed page size of every post listing.
pub const POSTS_PER_PAGE: u64 = 10;

/// Page requested through the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    /// 1-based page number.
    Number(u64),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

impl PageRequest {
    /// Parse the raw query value. Missing or empty means the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Ok(PageRequest::default());
        }
        if raw == "last" {
            return Ok(PageRequest::Last);
        }
        match raw.parse::<u64>() {
            Ok(n) if n >= 1 => Ok(PageRequest::Number(n)),
            _ => Err(DomainError::InvalidPage(raw.to_string())),
        }
    }

    /// Resolve against the page count, returning the 1-based page number if it exists.
    pub fn resolve(self, total_pages: u64) -> Option<u64> {
        match self {
            PageRequest::Last => Some(total_pages),
            PageRequest::Number(n) if n <= total_pages => Some(n),
            PageRequest::Number(_) => None,
        }
    }
}

/// Number of pages for `total_items`. An empty listing still has one (empty) page.
pub fn page_count(total_items: u64, per_page: u64) -> u64 {
    total_items.div_ceil(per_page).max(1)
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}
