//! Page arithmetic for the mood feed.
//!
//! Invalid input never fails a feed request: missing, non-numeric or
//! non-positive values fall back to the defaults, oversized pages are clamped.

/// Largest offset a store can be asked to skip.
const MAX_OFFSET: usize = if (i64::MAX as u64) < (usize::MAX as u64) {
    i64::MAX as usize
} else {
    usize::MAX
};

/// Bounds applied when normalizing caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 5,
            max_page_size: 50,
        }
    }
}

/// A validated, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    page_size: usize,
}

impl PageRequest {
    /// Pages past the last addressable offset are pinned to it, so `skip()`
    /// always fits a signed 64-bit SQL offset.
    pub fn new(page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let last_page = MAX_OFFSET / page_size + 1;
        Self {
            page: page.clamp(1, last_page),
            page_size,
        }
    }

    /// Builds a request from raw query-string values.
    pub fn from_raw(page: Option<&str>, page_size: Option<&str>, limits: PageLimits) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let page_size = parse_positive(page_size)
            .unwrap_or(limits.default_page_size)
            .min(limits.max_page_size.max(1));

        Self::new(page, page_size)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn skip(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }

    /// Number of pages needed for `total` items; never below one.
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .and_then(|v| usize::try_from(v).ok())
}
