//! Pagination slicer.
//!
//! Derives the page window from the displayed set and a viewport-dependent
//! page size, and keeps the current page inside the valid range.

use crate::models::Listing;

/// Viewport-width step function for the page size.
pub fn items_per_page_for_width(viewport_width: u32) -> usize {
    if viewport_width < 640 {
        6
    } else if viewport_width < 1024 {
        8
    } else {
        12
    }
}

/// Current page and page size over a displayed set whose length is supplied
/// by the caller on every operation.
#[derive(Debug, Clone)]
pub struct Pager {
    current_page: usize,
    items_per_page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            current_page: 1,
            items_per_page: 6,
        }
    }
}

impl Pager {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.items_per_page)
    }

    /// A new filter always starts the user at the top of results.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Navigate to a page, clamped to the valid range.
    pub fn set_page(&mut self, page: usize, total_items: usize) {
        let total = self.total_pages(total_items);
        if total == 0 {
            self.current_page = 1;
        } else {
            self.current_page = page.clamp(1, total);
        }
    }

    /// Recompute the page size from the viewport width and repair the
    /// current page against the new page count.
    pub fn set_viewport_width(&mut self, viewport_width: u32, total_items: usize) {
        self.items_per_page = items_per_page_for_width(viewport_width);
        self.repair(total_items);
    }

    /// Silently pull an out-of-range current page back to the last valid
    /// page, or page 1 when there are no results.
    pub fn repair(&mut self, total_items: usize) {
        let total = self.total_pages(total_items);
        if total == 0 {
            self.current_page = 1;
        } else if self.current_page > total {
            self.current_page = total;
        }
    }

    /// The current page's window into the displayed set, clamped.
    pub fn page_items<'a>(&self, displayed: &'a [Listing]) -> &'a [Listing] {
        let start = (self.current_page - 1) * self.items_per_page;
        if start >= displayed.len() {
            return &[];
        }
        let end = (start + self.items_per_page).min(displayed.len());
        &displayed[start..end]
    }
}
