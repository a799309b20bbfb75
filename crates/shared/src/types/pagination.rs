//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Upper bound on a single page.
pub const MAX_PER_PAGE: u32 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-indexed).
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    /// Page size clamped to `1..=MAX_PER_PAGE`.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// Calculates the offset for database queries.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.per_page())
    }

    /// Returns the limit for database queries.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.per_page())
    }
}

/// Response wrapper for paginated data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items in the current page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    /// Creates a new paginated response.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, total: u64) -> Self {
        let per_page = request.per_page();
        let total_pages = total.div_ceil(u64::from(per_page)).max(1);

        Self {
            data,
            meta: PageMeta {
                page: request.page.max(1),
                per_page,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let request = PageRequest {
            page: 3,
            per_page: 25,
        };
        assert_eq!(request.offset(), 50);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn test_page_zero_is_treated_as_first_page() {
        let request = PageRequest {
            page: 0,
            per_page: 10,
        };
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_per_page_is_clamped() {
        let request = PageRequest {
            page: 1,
            per_page: 10_000,
        };
        assert_eq!(request.limit(), u64::from(MAX_PER_PAGE));
    }

    #[test]
    fn test_total_pages() {
        let request = PageRequest::default();
        assert_eq!(PageResponse::<()>::new(vec![], &request, 0).meta.total_pages, 1);
        assert_eq!(PageResponse::<()>::new(vec![], &request, 20).meta.total_pages, 1);
        assert_eq!(PageResponse::<()>::new(vec![], &request, 21).meta.total_pages, 2);
    }
}
