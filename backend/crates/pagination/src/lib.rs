//! Offset pagination primitives shared by review catalogue queries.
//!
//! [`PageRequest`] turns caller-supplied page numbers into a clamped,
//! always-valid request, and [`Page`] is the envelope returned alongside the
//! total size of the narrowed result set.
//!
//! # Example
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::clamped(0, -4);
//! assert_eq!(request.page(), 1);
//! assert_eq!(request.page_size(), 1);
//!
//! let page = Page::new(vec!["a"], 3, request);
//! assert_eq!(page.total_pages(), 3);
//! ```

use serde::{Deserialize, Serialize};

/// Page size applied when callers do not supply one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A validated one-based page request.
///
/// Out-of-range inputs are clamped rather than rejected: page numbers and
/// sizes below one become one. Larger sizes are honoured as given, up to
/// `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Build a request from raw caller input, clamping invalid values.
    #[must_use]
    pub fn clamped(page: i64, page_size: i64) -> Self {
        Self {
            page: clamp_to_u32(page),
            page_size: clamp_to_u32(page_size),
        }
    }

    /// First page with the default page size.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of rows per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip before the first row of this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)).saturating_mul(u64::from(self.page_size))
    }

    /// Rows to take for this page.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    let bounded = value.clamp(1, i64::from(u32::MAX));
    u32::try_from(bounded).unwrap_or(u32::MAX)
}

/// One page of results plus the size of the whole result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    total_count: u64,
    page: u32,
    page_size: u32,
}

impl<T> Page<T> {
    /// Wrap `items` for `request`, recording the unpaged `total_count`.
    #[must_use]
    pub const fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// Rows on this page, in order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the envelope and return its rows.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Size of the narrowed result set before paging.
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    /// One-based page number this envelope represents.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size used to cut this page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of pages needed to cover `total_count` rows.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.page_size.max(1)))
    }

    /// Transform every row while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for page clamping and envelope metadata.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 10, 1, 10)]
    #[case(0, 10, 1, 10)]
    #[case(-3, 0, 1, 1)]
    #[case(4, -1, 4, 1)]
    #[case(2, 150, 2, 150)]
    #[case(1, 5_000, 1, 5_000)]
    #[case(1, i64::MAX, 1, u32::MAX)]
    #[case(i64::MAX, 5, u32::MAX, 5)]
    fn clamps_raw_input(
        #[case] page: i64,
        #[case] page_size: i64,
        #[case] expected_page: u32,
        #[case] expected_size: u32,
    ) {
        let request = PageRequest::clamped(page, page_size);
        assert_eq!(request.page(), expected_page);
        assert_eq!(request.page_size(), expected_size);
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(3, 10, 20)]
    #[case(2, 1, 1)]
    fn offset_skips_previous_pages(#[case] page: i64, #[case] size: i64, #[case] offset: u64) {
        assert_eq!(PageRequest::clamped(page, size).offset(), offset);
    }

    #[rstest]
    fn large_page_size_takes_every_requested_row() {
        let request = PageRequest::clamped(1, 150);
        assert_eq!(request.limit(), 150);
        assert_eq!(PageRequest::clamped(2, 150).offset(), 150);
    }

    #[rstest]
    fn default_request_is_first_page() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(10, 1)]
    #[case(11, 2)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] pages: u64) {
        let page: Page<u8> = Page::new(Vec::new(), total, PageRequest::clamped(1, 10));
        assert_eq!(page.total_pages(), pages);
    }

    #[rstest]
    fn map_preserves_metadata() {
        let page = Page::new(vec![1_u8, 2], 7, PageRequest::clamped(2, 2)).map(u32::from);
        assert_eq!(page.items(), &[1_u32, 2]);
        assert_eq!(page.total_count(), 7);
        assert_eq!(page.page(), 2);
        assert_eq!(page.page_size(), 2);
    }

    #[rstest]
    fn serialises_in_camel_case() {
        let page = Page::new(vec!["x"], 1, PageRequest::first());
        let value = serde_json::to_value(&page).unwrap_or_else(|err| panic!("serialise: {err}"));
        assert_eq!(value.get("totalCount"), Some(&serde_json::json!(1)));
        assert_eq!(value.get("pageSize"), Some(&serde_json::json!(DEFAULT_PAGE_SIZE)));
    }
}
