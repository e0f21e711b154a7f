//! Page slicing over an ordered record sequence.

/// Default number of records per list page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One window of an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Records of this window, at most `page_size` of them.
    pub items: Vec<T>,
    /// 1-indexed page number actually served.
    pub page_number: usize,
    pub page_size: usize,
    /// Length of the source before slicing.
    pub total_items: usize,
}

impl<T> Page<T> {
    /// Number of pages needed to cover `total_items`.
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }
}

/// Slice `source` into the page starting at `(page_number - 1) * page_size`.
///
/// A page number below 1 is served as page 1 and a page size of 0 as 1.
/// A window past the end yields no items but keeps the full total.
pub fn paginate<T>(source: Vec<T>, page_size: usize, page_number: i64) -> Page<T> {
    let page_size = page_size.max(1);
    let page_number = usize::try_from(page_number.max(1)).unwrap_or(usize::MAX);
    let total_items = source.len();

    let offset = (page_number - 1).saturating_mul(page_size);
    let items = source.into_iter().skip(offset).take(page_size).collect();

    Page {
        items,
        page_number,
        page_size,
        total_items,
    }
}
