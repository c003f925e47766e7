use serde::Serialize;

use crate::records::Page;

/// Pagination metadata included in list responses.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 10)]
    pub page_size: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total_items: u64,
    /// `ceil(total_items / page_size)`.
    #[schema(example = 5)]
    pub total_pages: u64,
}

impl<T> From<&Page<T>> for Pagination {
    fn from(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}
