//! Limit/offset pagination shared by every list endpoint

use serde::{Deserialize, Serialize};

/// Page size used when the client does not ask for one
pub const DEFAULT_LIMIT: i64 = 10;
/// Upper bound on the page size
pub const MAX_LIMIT: i64 = 100;

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Maximum number of items returned
    pub limit: i64,
    /// Number of items skipped
    pub offset: i64,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ListParams {
    /// Create pagination parameters, clamping out-of-range values
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Total number of matching items
    pub count: i64,
    pub limit: i64,
    pub offset: i64,
    /// Items in the current window
    pub results: Vec<T>,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(results: Vec<T>, count: i64, params: &ListParams) -> Self {
        Self {
            count,
            limit: params.limit,
            offset: params.offset,
            results,
        }
    }
}
