//! Page transfer plans

use core::ops::Range;

/// One page of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Page number sent to the board
    pub page_no: u32,
    /// Byte offset of the page start
    pub offset: usize,
    /// Number of bytes in this page (the last page may be short)
    pub len: usize,
}

impl Page {
    /// Byte range covered by this page
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Split of `length` bytes into pages of `page_size` bytes
///
/// Derived per operation, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    length: usize,
    page_size: usize,
}

impl PagePlan {
    /// Create a plan; `page_size` must be non-zero
    pub fn new(length: usize, page_size: usize) -> Self {
        debug_assert!(page_size > 0, "page size must be non-zero");
        Self { length, page_size }
    }

    /// Total bytes covered
    pub fn length(&self) -> usize {
        self.length
    }

    /// Page size in bytes
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `ceil(length / page_size)`
    pub fn total_pages(&self) -> usize {
        self.length.div_ceil(self.page_size)
    }

    /// Page `page_no`, if it is part of the plan
    pub fn page(&self, page_no: usize) -> Option<Page> {
        let offset = page_no.checked_mul(self.page_size)?;
        if offset >= self.length {
            return None;
        }
        Some(Page {
            page_no: page_no as u32,
            offset,
            len: (self.length - offset).min(self.page_size),
        })
    }

    /// Pages in address order
    pub fn pages(&self) -> impl Iterator<Item = Page> + '_ {
        (0..self.total_pages()).filter_map(move |page_no| self.page(page_no))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        let plan = PagePlan::new(8192, 64);
        assert_eq!(plan.total_pages(), 128);
        let pages: Vec<_> = plan.pages().collect();
        assert_eq!(pages.len(), 128);
        assert!(pages.iter().all(|p| p.len == 64));
        assert_eq!(pages[127].offset, 127 * 64);
        assert_eq!(pages[127].page_no, 127);
    }

    #[test]
    fn test_short_last_page() {
        let plan = PagePlan::new(130, 64);
        assert_eq!(plan.total_pages(), 3);
        let last = plan.page(2).unwrap();
        assert_eq!(last.range(), 128..130);
        assert_eq!(last.len, 130 - (plan.total_pages() - 1) * 64);
        assert_eq!(plan.page(3), None);
    }

    #[test]
    fn test_pages_are_contiguous() {
        let plan = PagePlan::new(1000, 48);
        let mut next = 0;
        for page in plan.pages() {
            assert_eq!(page.offset, next);
            next = page.range().end;
        }
        assert_eq!(next, 1000);
    }

    #[test]
    fn test_smaller_than_one_page() {
        let plan = PagePlan::new(10, 64);
        assert_eq!(plan.total_pages(), 1);
        assert_eq!(plan.page(0).unwrap().len, 10);
        assert_eq!(PagePlan::new(0, 64).total_pages(), 0);
    }
}
