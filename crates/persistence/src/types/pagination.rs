//! Page-number pagination over an in-memory result.

use serde::{Deserialize, Serialize};

/// Default number of items per page.
pub const DEFAULT_PER_PAGE: usize = 15;

/// A requested page.
///
/// Pages are 1-based. Out-of-range values are normalized rather than
/// rejected: `page` < 1 becomes 1 and `per_page` is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: usize,
    /// Items per page.
    pub per_page: usize,
}

impl PageRequest {
    /// Creates a normalized page request.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Clamps `per_page` to `max_per_page`.
    pub fn clamped(self, max_per_page: usize) -> Self {
        Self::new(self.page, self.per_page.min(max_per_page.max(1)))
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// Position of a page within the full result.
///
/// `from` and `to` are 1-based item positions and are `None` when the page
/// is empty. An empty result still has one (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: usize,
    pub per_page: usize,
    pub total: usize,
    pub last_page: usize,
    pub from: Option<usize>,
    pub to: Option<usize>,
}

impl PageInfo {
    /// Computes the page info for `total` items.
    pub fn new(request: PageRequest, total: usize) -> Self {
        let request = PageRequest::new(request.page, request.per_page);
        let last_page = total.div_ceil(request.per_page).max(1);
        let start = request.offset();
        let end = start.saturating_add(request.per_page).min(total);

        let (from, to) = if start < end {
            (Some(start + 1), Some(end))
        } else {
            (None, None)
        };

        Self {
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page,
            from,
            to,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Pagination information.
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    /// Cuts the requested page out of the full, already ordered result.
    pub fn paginate(all: Vec<T>, request: PageRequest) -> Self {
        let pagination = PageInfo::new(request, all.len());
        let items = match (pagination.from, pagination.to) {
            (Some(from), Some(to)) => all.into_iter().skip(from - 1).take(to + 1 - from).collect(),
            _ => Vec::new(),
        };
        Self { items, pagination }
    }

    /// Creates an empty first page.
    pub fn empty(request: PageRequest) -> Self {
        Self::paginate(Vec::new(), request)
    }

    /// Returns true if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
