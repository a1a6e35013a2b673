//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use serde::Deserialize;

use crate::models::ListParams;

// ============================================================================
// Pagination Query Types
// ============================================================================

/// Limit/offset pagination query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationQuery {
    /// Clamp to the allowed page window
    pub fn params(&self) -> ListParams {
        ListParams::new(self.limit, self.offset)
    }
}

/// Pagination with an optional substring search
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.limit, self.offset)
    }

    /// The search term, with blank input treated as no filter
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
