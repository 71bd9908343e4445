//! Page and page-size state persisted in the URL query string.
//!
//! # Design
//! - Values are read from the store on every access; nothing is cached here.
//! - Both keys are always written together so a reload restores the same page.
//! - Invalid stored values read as defaults instead of failing.

use crate::core::config::DEFAULT_PAGE_SIZE;
use crate::core::store::{SharedStore, StorePatch};

/// Query key holding the one-based page number.
pub const PAGE_PARAM: &str = "page";
/// Query key holding the page size.
pub const PAGE_SIZE_PARAM: &str = "pageSize";
/// Page used when none is stored.
pub const DEFAULT_PAGE: u32 = 1;

/// Current page coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageRequest {
    /// One-based page number (always `>= 1`).
    pub page: u32,
    /// Rows per page (always `> 0`).
    pub page_size: u32,
}

/// Pagination view over a persisted store.
#[derive(Clone)]
pub struct Pagination {
    store: SharedStore,
    default_page_size: u32,
}

impl Pagination {
    /// Pagination with the standard default page size.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self::with_default_page_size(store, DEFAULT_PAGE_SIZE)
    }

    /// Pagination with a custom default page size (zero falls back to the standard default).
    #[must_use]
    pub fn with_default_page_size(store: SharedStore, default_page_size: u32) -> Self {
        Self {
            store,
            default_page_size: positive_or(default_page_size, DEFAULT_PAGE_SIZE),
        }
    }

    /// Current page, defaulting to 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.read(PAGE_PARAM).unwrap_or(DEFAULT_PAGE)
    }

    /// Current page size, defaulting to the configured default.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.read(PAGE_SIZE_PARAM).unwrap_or(self.default_page_size)
    }

    /// Both coordinates at once.
    #[must_use]
    pub fn current(&self) -> PageRequest {
        PageRequest {
            page: self.page(),
            page_size: self.page_size(),
        }
    }

    /// Move to `page` (0 is clamped to 1), keeping the page size.
    pub fn set_page(&self, page: u32) {
        self.store.commit(self.page_patch(page.max(DEFAULT_PAGE), self.page_size()));
    }

    /// Change the page size and return to page 1; zero falls back to the default.
    pub fn set_page_size(&self, page_size: u32) {
        let safe = positive_or(page_size, self.default_page_size);
        self.store.commit(self.page_patch(DEFAULT_PAGE, safe));
    }

    /// Change the page size from raw selector input; unparsable input uses the default.
    pub fn set_page_size_text(&self, raw: &str) {
        self.set_page_size(parse_positive(raw).unwrap_or(self.default_page_size));
    }

    /// Patch that resets to page 1 with the current page size, for filter commits.
    #[must_use]
    pub fn reset_patch(&self) -> StorePatch {
        self.page_patch(DEFAULT_PAGE, self.page_size())
    }

    fn page_patch(&self, page: u32, page_size: u32) -> StorePatch {
        StorePatch::new()
            .set(PAGE_PARAM, page.to_string())
            .set(PAGE_SIZE_PARAM, page_size.to_string())
    }

    fn read(&self, key: &str) -> Option<u32> {
        self.store.get(key).as_deref().and_then(parse_positive)
    }
}

/// Parse a strictly positive integer, tolerating surrounding whitespace.
#[must_use]
pub fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|value| *value > 0)
}

const fn positive_or(value: u32, fallback: u32) -> u32 {
    if value == 0 { fallback } else { value }
}
