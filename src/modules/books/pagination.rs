//! Pagination envelope builder.

use super::models::{PageRequest, PaginationMetadata, SearchResponse};

impl PaginationMetadata {
    /// Derive page counts and navigation flags. The requested page is never
    /// clamped to the last page.
    pub fn new(total_items: u64, request: PageRequest) -> Self {
        let results_per_page = request.results_per_page();
        let current_page = request.page();
        let total_pages = total_items.div_ceil(u64::from(results_per_page));

        Self {
            total_items,
            current_page,
            total_pages,
            results_per_page,
            has_next_page: u64::from(current_page) < total_pages,
            has_previous_page: current_page > 1,
        }
    }
}

/// Wrap one page of upstream items with pagination metadata
pub fn build<T>(total_items: u64, request: PageRequest, items: Vec<T>) -> SearchResponse<T> {
    SearchResponse {
        items,
        pagination: PaginationMetadata::new(total_items, request),
    }
}
