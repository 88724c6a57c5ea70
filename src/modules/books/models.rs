use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog field a search term is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    /// Free-text search across all fields
    Any,
    Title,
    Author,
    Subject,
}

impl SearchField {
    /// Qualifier understood by the upstream catalog, if any
    pub const fn qualifier(self) -> Option<&'static str> {
        match self {
            SearchField::Any => None,
            SearchField::Title => Some("intitle"),
            SearchField::Author => Some("inauthor"),
            SearchField::Subject => Some("subject"),
        }
    }
}

/// A search term plus the field it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub field: SearchField,
}

impl SearchQuery {
    pub fn new(field: SearchField, term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            field,
        }
    }
}

/// Renders the upstream `q` parameter, e.g. `intitle:Dune`.
impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field.qualifier() {
            Some(qualifier) => write!(f, "{}:{}", qualifier, self.term),
            None => f.write_str(&self.term),
        }
    }
}

/// One violated pagination constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pagination parameters")]
pub struct InvalidPageRequest {
    pub violations: Vec<FieldViolation>,
}

/// Validated page coordinates. Only constructible through [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    results_per_page: u32,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_RESULTS_PER_PAGE: u32 = 10;
    pub const MAX_RESULTS_PER_PAGE: u32 = 40;

    /// Validate raw query values: `page >= 1`, `1 <= results_per_page <= 40`.
    /// Every violated field is reported.
    pub fn new(page: i64, results_per_page: i64) -> Result<Self, InvalidPageRequest> {
        let mut violations = Vec::new();

        let page = match u32::try_from(page) {
            Ok(page) if page >= 1 => Some(page),
            _ => {
                violations.push(FieldViolation {
                    field: "page",
                    error: format!("must be an integer between 1 and {}", u32::MAX),
                });
                None
            }
        };

        let results_per_page = match u32::try_from(results_per_page) {
            Ok(n) if (1..=Self::MAX_RESULTS_PER_PAGE).contains(&n) => Some(n),
            _ => {
                violations.push(FieldViolation {
                    field: "results_per_page",
                    error: format!("must be between 1 and {}", Self::MAX_RESULTS_PER_PAGE),
                });
                None
            }
        };

        match (page, results_per_page) {
            (Some(page), Some(results_per_page)) => Ok(Self {
                page,
                results_per_page,
            }),
            _ => Err(InvalidPageRequest { violations }),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results_per_page(&self) -> u32 {
        self.results_per_page
    }

    /// Zero-based index of the first result on this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.results_per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            results_per_page: Self::DEFAULT_RESULTS_PER_PAGE,
        }
    }
}

/// Pagination block of a search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub total_items: u64,
    pub current_page: u32,
    pub total_pages: u64,
    pub results_per_page: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Envelope returned by every search route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMetadata,
}
