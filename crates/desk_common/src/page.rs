//! Page results for offset/limit list retrieval.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints
pub const DEFAULT_LIMIT: u64 = 25;

/// One bounded slice of a larger result set.
///
/// `has_more` is true iff `offset + items.len() < total`; it is computed
/// at fetch time and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub total: u64,
}

impl<T> Page<T> {
    /// Build a page from a fetched window plus the filtered total count.
    pub fn new(items: Vec<T>, offset: u64, total: u64) -> Self {
        let has_more = offset + (items.len() as u64) < total;
        Self {
            items,
            has_more,
            total,
        }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
            total: 0,
        }
    }
}

/// Offset/limit window for one list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub offset: u64,
    pub limit: u64,
}

impl ListQuery {
    /// Clamp limit to at least 1; a zero limit would make pagination spin.
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: limit.max(1),
        }
    }

    /// Parse from raw query-string values, degrading to defaults on
    /// anything unusable (negative, empty, non-numeric).
    pub fn from_params(offset: Option<&str>, limit: Option<&str>) -> Self {
        let offset = offset.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0);
        let limit = limit
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&v| v > 0)
            .unwrap_or(DEFAULT_LIMIT);
        Self { offset, limit }
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_more_reflects_window_position() {
        let page = Page::new(vec![1, 2, 3], 0, 10);
        assert!(page.has_more);

        let page = Page::new(vec![1, 2, 3], 7, 10);
        assert!(!page.has_more);

        let page: Page<i32> = Page::new(vec![], 0, 0);
        assert!(!page.has_more);
    }

    #[test]
    fn query_params_degrade_to_defaults() {
        let q = ListQuery::from_params(Some("-5"), Some("abc"));
        assert_eq!(q.offset, 0);
        assert_eq!(q.limit, DEFAULT_LIMIT);

        let q = ListQuery::from_params(Some("50"), Some("0"));
        assert_eq!(q.offset, 50);
        assert_eq!(q.limit, DEFAULT_LIMIT);

        let q = ListQuery::from_params(Some("10"), Some("100"));
        assert_eq!(q.offset, 10);
        assert_eq!(q.limit, 100);
    }

    #[test]
    fn zero_limit_is_clamped() {
        assert_eq!(ListQuery::new(0, 0).limit, 1);
    }
}
