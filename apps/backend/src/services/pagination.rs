//! In-memory pagination over an already filtered and ordered list.

use crate::config::MomentsConfig;
use crate::error::{AppError, Result};

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Validate raw query values against the configured bounds.
    ///
    /// `page` defaults to 1 and must be at least 1; `limit` defaults to
    /// `default_limit` and must lie in `1..=max_limit`.
    pub fn from_query(page: Option<i64>, limit: Option<i64>, bounds: &MomentsConfig) -> Result<Self> {
        let page = page.unwrap_or(1);
        if page < 1 || page > i64::from(u32::MAX) {
            return Err(AppError::BadRequest(format!(
                "page must be between 1 and {}, got {}",
                u32::MAX,
                page
            )));
        }

        let limit = limit.unwrap_or_else(|| i64::from(bounds.default_limit));
        if limit < 1 || limit > i64::from(bounds.max_limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}, got {}",
                bounds.max_limit, limit
            )));
        }

        Ok(Self {
            page: page as u32,
            limit: limit as u32,
        })
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }
}

/// One page of results plus metadata describing the whole filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Transform the items while keeping the page metadata.
    pub fn try_map<U, F>(self, f: F) -> Result<Page<U>>
    where
        F: FnMut(T) -> Result<U>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<Vec<_>>>()?,
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        })
    }
}

/// Number of pages for `total` items. An empty set still has one page.
pub fn total_pages(total: usize, limit: u32) -> u32 {
    if total == 0 {
        return 1;
    }
    let limit = limit.max(1) as usize;
    total.div_ceil(limit).min(u32::MAX as usize) as u32
}

/// Slice `items` to the requested page.
///
/// `items` must already be filtered; `total` is its full length. A page past
/// the end yields no items rather than an error.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len();
    let items = items
        .into_iter()
        .skip(request.offset())
        .take(request.limit as usize)
        .collect();

    Page {
        items,
        total,
        page: request.page,
        limit: request.limit,
        total_pages: total_pages(total, request.limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(page: u32, limit: u32) -> PageRequest {
        PageRequest { page, limit }
    }

    #[test]
    fn test_defaults() {
        let req = PageRequest::from_query(None, None, &MomentsConfig::default()).unwrap();
        assert_eq!(req, request(1, 20));
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_rejects_out_of_bounds() {
        let bounds = MomentsConfig::default();
        assert!(PageRequest::from_query(Some(0), None, &bounds).is_err());
        assert!(PageRequest::from_query(Some(-3), None, &bounds).is_err());
        assert!(PageRequest::from_query(None, Some(0), &bounds).is_err());
        assert!(PageRequest::from_query(None, Some(101), &bounds).is_err());
        assert!(PageRequest::from_query(Some(2), Some(100), &bounds).is_ok());
    }

    #[test]
    fn test_page_error_names_both_bounds() {
        let bounds = MomentsConfig::default();
        for page in [0, i64::from(u32::MAX) + 1] {
            match PageRequest::from_query(Some(page), None, &bounds).unwrap_err() {
                AppError::BadRequest(msg) => {
                    assert!(msg.contains("between 1 and 4294967295"), "{}", msg);
                    assert!(msg.ends_with(&page.to_string()));
                }
                other => panic!("unexpected error: {:?}", other),
            }
        }
    }

    #[test]
    fn test_pages_of_seven_with_limit_three() {
        let items: Vec<u32> = (1..=7).collect();

        let sizes: Vec<usize> = (1..=3)
            .map(|page| {
                let result = paginate(items.clone(), request(page, 3));
                assert_eq!(result.total, 7);
                assert_eq!(result.total_pages, 3);
                result.items.len()
            })
            .collect();

        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(paginate(items, request(3, 3)).items, vec![7]);
    }

    #[test]
    fn test_empty_set_has_one_page() {
        let result = paginate(Vec::<u32>::new(), request(1, 20));
        assert_eq!(result.total, 0);
        assert_eq!(result.total_pages, 1);
        assert!(result.items.is_empty());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let result = paginate(vec![1, 2, 3], request(5, 2));
        assert!(result.items.is_empty());
        assert_eq!(result.total, 3);
        assert_eq!(result.total_pages, 2);
    }

    #[test]
    fn test_order_is_preserved() {
        let result = paginate(vec!["c", "b", "a", "z"], request(2, 2));
        assert_eq!(result.items, vec!["a", "z"]);
    }

    #[test]
    fn test_try_map_keeps_metadata() {
        let page = paginate(vec![1, 2, 3, 4, 5], request(2, 2));
        let mapped = page.try_map(|n| Ok(n * 10)).unwrap();
        assert_eq!(mapped.items, vec![30, 40]);
        assert_eq!(mapped.total, 5);
        assert_eq!(mapped.total_pages, 3);
        assert_eq!(mapped.page, 2);
    }

    #[test]
    fn test_total_pages_exact_multiple() {
        assert_eq!(total_pages(6, 3), 2);
        assert_eq!(total_pages(7, 3), 3);
        assert_eq!(total_pages(1, 100), 1);
    }
}
