//! Pagination types shared by every list endpoint

use serde::Deserialize;
use utoipa::IntoParams;

/// Default page size for anamnesis listings
pub const ANAMNESIS_PAGE_SIZE: u32 = 5;
/// Default page size for patient listings
pub const PATIENT_PAGE_SIZE: u32 = 20;
/// Default page size for doctor listings
pub const DOCTOR_PAGE_SIZE: u32 = 20;

/// Query string accepted by list endpoints.
///
/// Numeric values are kept as text so that malformed input falls back to
/// defaults instead of rejecting the request.
#[derive(Debug, Deserialize, IntoParams, Clone, Default)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Free-text search
    pub query: Option<String>,

    #[param(example = 20, minimum = 1)]
    pub page_size: Option<String>,

    #[param(example = 1, minimum = 1)]
    pub current_page: Option<String>,
}

impl ListParams {
    pub fn query(&self) -> &str {
        self.query.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn page(&self, default_page_size: u32) -> PageRequest {
        PageRequest::new(
            parse_positive(self.page_size.as_deref()).unwrap_or(default_page_size),
            parse_positive(self.current_page.as_deref()).unwrap_or(1),
        )
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

/// A resolved page: both values are at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_size: u32,
    current_page: u32,
}

impl PageRequest {
    pub fn new(page_size: u32, current_page: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: current_page.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Get the limit for SQL queries (alias for page_size)
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Calculate the offset for SQL queries
    pub fn offset(&self) -> i64 {
        i64::from(self.current_page - 1) * i64::from(self.page_size)
    }

    /// Slice an already ordered collection to this page
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(self.page_size).unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(size: Option<&str>, page: Option<&str>) -> ListParams {
        ListParams {
            query: None,
            page_size: size.map(str::to_string),
            current_page: page.map(str::to_string),
        }
    }

    #[test]
    fn test_pagination_defaults() {
        let page = params(None, None).page(PATIENT_PAGE_SIZE);
        assert_eq!(page.current_page(), 1);
        assert_eq!(page.page_size(), 20);
        assert_eq!(params(None, None).page(ANAMNESIS_PAGE_SIZE).page_size(), 5);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        for bad in ["0", "-3", "abc", "", "2.5"] {
            let page = params(Some(bad), Some(bad)).page(DOCTOR_PAGE_SIZE);
            assert_eq!(page.page_size(), DOCTOR_PAGE_SIZE, "page_size={bad}");
            assert_eq!(page.current_page(), 1, "current_page={bad}");
        }
    }

    #[test]
    fn test_pagination_offset() {
        let page = params(Some("10"), Some("3")).page(PATIENT_PAGE_SIZE);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_pagination_offset_first_page() {
        assert_eq!(PageRequest::new(20, 1).offset(), 0);
    }

    #[test]
    fn test_apply_second_page() {
        let page = PageRequest::new(2, 2);
        assert_eq!(page.apply(vec![1, 2, 3, 4, 5]), vec![3, 4]);
    }

    #[test]
    fn test_apply_beyond_last_page_is_empty() {
        let page = PageRequest::new(2, 4);
        assert!(page.apply(vec![1, 2, 3, 4, 5]).is_empty());
    }

    #[test]
    fn test_query_is_trimmed() {
        let p = ListParams {
            query: Some("  ana ".into()),
            ..Default::default()
        };
        assert_eq!(p.query(), "ana");
        assert_eq!(ListParams::default().query(), "");
    }

    proptest! {
        #[test]
        fn apply_matches_offset_and_limit(len in 0usize..60, size in 1u32..15, page in 1u32..10) {
            let items: Vec<usize> = (0..len).collect();
            let req = PageRequest::new(size, page);
            let got = req.apply(items);
            let start = (page as usize - 1) * size as usize;
            let expected: Vec<usize> = (start..len.max(start)).take(size as usize).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
