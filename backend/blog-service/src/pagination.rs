//! Page-number pagination over an ordered result set.
//!
//! The requested page is parsed leniently: anything that is not an integer
//! yields the first page, and numbers outside `1..=num_pages` yield the last
//! page. An empty result still has one (empty) page.

use serde::Serialize;

/// Position of one page inside a result of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
}

impl PageWindow {
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    /// Number of items that land on this page.
    pub fn len(&self) -> usize {
        self.total.saturating_sub(self.offset()).min(self.per_page)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// 1-based index of the first item on the page (0 when empty).
    pub fn start_index(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.offset() + 1
        }
    }

    pub fn end_index(&self) -> usize {
        self.offset() + self.len()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: usize,
    per_page: usize,
}

impl Paginator {
    pub fn new(total: usize, per_page: usize) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw `?page=` value into a page window.
    pub fn get_page(&self, raw: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages();
        let number = match raw.map(str::trim).map(str::parse::<i64>) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n < 1 || n as u64 > num_pages as u64 => num_pages,
            Some(Ok(n)) => n as usize,
        };

        PageWindow {
            number,
            num_pages,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// A window together with the items fetched for it; this is what templates
/// iterate over.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<usize>,
    pub previous_page_number: Option<usize>,
    pub start_index: usize,
    pub end_index: usize,
    pub page_range: Vec<usize>,
}

impl<T> Page<T> {
    pub fn new(window: PageWindow, items: Vec<T>) -> Self {
        Self {
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            next_page_number: window.has_next().then_some(window.number + 1),
            previous_page_number: window.has_previous().then_some(window.number - 1),
            start_index: window.start_index(),
            end_index: window.end_index(),
            page_range: (1..=window.num_pages).collect(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
