//! Shared types for the persistence layer.
//!
//! - [`PageRequest`], [`Page`], [`PageInfo`] - Page-number pagination
//!
//! ```
//! use caregrid_persistence::types::{Page, PageRequest};
//!
//! let page = Page::paginate(vec!["a", "b", "c"], PageRequest::new(2, 2));
//! assert_eq!(page.items, vec!["c"]);
//! assert_eq!(page.pagination.last_page, 2);
//! ```

mod pagination;

pub use pagination::{DEFAULT_PER_PAGE, Page, PageInfo, PageRequest};
