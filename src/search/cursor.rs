//! Page-number arithmetic.
//!
//! Turns the `page` / `page_size` query parameters into a validated [`PageRequest`] and the
//! half-open `[start_index, end_index)` window it addresses. Nothing here knows the total hit
//! count, so windows are never clamped: a window past the end of the results simply yields an
//! empty slice when executed.

use serde::{Deserialize, Serialize};

use crate::{error::SearchError, types::PageParams};

pub const PAGE_QUERY_PARAM: &str = "page";
pub const PAGE_SIZE_QUERY_PARAM: &str = "page_size";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Used when the caller does not pass `page_size`.
    pub default_page_size: u64,
    /// Upper bound for an explicit `page_size`, if any.
    pub max_page_size: Option<u64>,
    /// Out-of-range pages fail with [`SearchError::PageNotFound`] instead of returning an
    /// empty page.
    pub strict: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: Some(100),
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u64,
    pub page_size: u64,
}

/// Half-open index window `[start_index, end_index)` of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBounds {
    pub start_index: u64,
    pub end_index: u64,
}

impl PageBounds {
    /// Number of items the page can hold.
    pub fn limit(&self) -> u64 {
        self.end_index - self.start_index
    }
}

impl PageRequest {
    pub fn new(
        page_number: u64,
        page_size: u64,
        config: &PaginationConfig,
    ) -> Result<Self, SearchError> {
        if page_number < 1 {
            return Err(SearchError::InvalidPage(format!(
                "`{}` must be a positive integer, got {}",
                PAGE_QUERY_PARAM, page_number
            )));
        }
        if page_size < 1 {
            return Err(SearchError::InvalidPageSize(format!(
                "`{}` must be a positive integer, got {}",
                PAGE_SIZE_QUERY_PARAM, page_size
            )));
        }
        if let Some(max) = config.max_page_size {
            if page_size > max {
                return Err(SearchError::InvalidPageSize(format!(
                    "`{}` must not exceed {}, got {}",
                    PAGE_SIZE_QUERY_PARAM, max, page_size
                )));
            }
        }
        // Reject pages whose window cannot be represented.
        (page_number - 1)
            .checked_mul(page_size)
            .and_then(|start| start.checked_add(page_size))
            .ok_or_else(|| {
                SearchError::InvalidPage(format!(
                    "`{}` {} is out of range",
                    PAGE_QUERY_PARAM, page_number
                ))
            })?;

        Ok(Self {
            page_number,
            page_size,
        })
    }

    /// Parses request parameters. An absent `page` means page 1 and an absent `page_size`
    /// means the configured default; a present but malformed value is an error.
    pub fn from_params(params: &PageParams, config: &PaginationConfig) -> Result<Self, SearchError> {
        let page_number = match params.page.as_deref() {
            None => 1,
            Some(raw) => parse_positive(raw).ok_or_else(|| {
                SearchError::InvalidPage(format!(
                    "`{}` must be a positive integer, got {:?}",
                    PAGE_QUERY_PARAM, raw
                ))
            })?,
        };
        let page_size = match params.page_size.as_deref() {
            None => config.default_page_size,
            Some(raw) => parse_positive(raw).ok_or_else(|| {
                SearchError::InvalidPageSize(format!(
                    "`{}` must be a positive integer, got {:?}",
                    PAGE_SIZE_QUERY_PARAM, raw
                ))
            })?,
        };
        Self::new(page_number, page_size, config)
    }

    pub fn bounds(&self) -> PageBounds {
        let start_index = (self.page_number - 1) * self.page_size;
        PageBounds {
            start_index,
            end_index: start_index + self.page_size,
        }
    }

    /// True when this is the first page, i.e. there is nothing before `start_index`.
    pub fn is_first(&self) -> bool {
        self.bounds().start_index < self.page_size
    }
}

/// Computes the window for `page_number` / `page_size` under `config`.
pub struct PageCursor;

impl PageCursor {
    pub fn compute(
        page_number: u64,
        page_size: u64,
        config: &PaginationConfig,
    ) -> Result<PageBounds, SearchError> {
        PageRequest::new(page_number, page_size, config).map(|request| request.bounds())
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|value| *value >= 1)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn params(page: Option<&str>, page_size: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn absent_params_use_defaults() {
        let config = PaginationConfig::default();
        let request = PageRequest::from_params(&params(None, None), &config).unwrap();
        assert_eq!(
            request,
            PageRequest {
                page_number: 1,
                page_size: 10
            }
        );
        assert_eq!(
            request.bounds(),
            PageBounds {
                start_index: 0,
                end_index: 10
            }
        );
    }

    #[test]
    fn third_page_window() {
        let bounds = PageCursor::compute(3, 10, &PaginationConfig::default()).unwrap();
        assert_eq!(bounds.start_index, 20);
        assert_eq!(bounds.end_index, 30);
        assert_eq!(bounds.limit(), 10);
    }

    #[test]
    fn malformed_page_is_rejected() {
        let config = PaginationConfig::default();
        for raw in ["abc", "", "0", "-1", "1.5"] {
            let err = PageRequest::from_params(&params(Some(raw), None), &config).unwrap_err();
            assert!(matches!(err, SearchError::InvalidPage(_)), "page={raw:?}");
        }
    }

    #[test]
    fn invalid_page_size_is_rejected() {
        let config = PaginationConfig::default();
        for raw in ["0", "abc", "101"] {
            let err = PageRequest::from_params(&params(None, Some(raw)), &config).unwrap_err();
            assert!(matches!(err, SearchError::InvalidPageSize(_)), "page_size={raw:?}");
        }
    }

    #[test]
    fn page_size_is_unbounded_without_max() {
        let config = PaginationConfig {
            max_page_size: None,
            ..PaginationConfig::default()
        };
        let request = PageRequest::from_params(&params(Some("2"), Some("5000")), &config).unwrap();
        assert_eq!(request.bounds().start_index, 5000);
    }

    #[test]
    fn injected_default_page_size() {
        let config = PaginationConfig {
            default_page_size: 3,
            ..PaginationConfig::default()
        };
        let request = PageRequest::from_params(&params(Some("4"), None), &config).unwrap();
        assert_eq!(request.bounds().start_index, 9);
        assert_eq!(request.bounds().end_index, 12);
    }

    #[test]
    fn overflowing_page_is_rejected() {
        let config = PaginationConfig::default();
        let err = PageRequest::new(u64::MAX, 100, &config).unwrap_err();
        assert!(matches!(err, SearchError::InvalidPage(_)));
    }

    #[test]
    fn first_page_detection() {
        let config = PaginationConfig::default();
        assert!(PageRequest::new(1, 10, &config).unwrap().is_first());
        assert!(!PageRequest::new(2, 10, &config).unwrap().is_first());
    }

    proptest! {
        #[test]
        fn bounds_follow_page_arithmetic(page_number in 1u64..100_000, page_size in 1u64..=100) {
            let bounds = PageCursor::compute(page_number, page_size, &PaginationConfig::default()).unwrap();
            prop_assert_eq!(bounds.start_index, (page_number - 1) * page_size);
            prop_assert_eq!(bounds.end_index, bounds.start_index + page_size);
        }

        #[test]
        fn adjacent_pages_tile_without_gaps(page_number in 1u64..100_000, page_size in 1u64..=100) {
            let config = PaginationConfig::default();
            let current = PageCursor::compute(page_number, page_size, &config).unwrap();
            let next = PageCursor::compute(page_number + 1, page_size, &config).unwrap();
            prop_assert_eq!(current.end_index, next.start_index);
        }
    }
}
