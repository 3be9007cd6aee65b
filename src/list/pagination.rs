//! Pagination arithmetic. Pure; never touches the database.

use serde::Serialize;

/// Pagination summary of the `{data, pagination}` envelope.
///
/// `current_page` is echoed as requested even when it lies past `total_page`;
/// such a page simply has no rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PaginationResult {
    pub total_record: u64,
    pub current_page: u32,
    pub total_page: u64,
    pub next_page: Option<u64>,
    pub prev_page: Option<u32>,
}

impl PaginationResult {
    pub fn compute(total_record: u64, current_page: u32, limit: u32) -> Self {
        let limit = u64::from(limit.max(1));
        let total_page = total_record.div_ceil(limit);
        let page = u64::from(current_page);
        PaginationResult {
            total_record,
            current_page,
            total_page,
            next_page: (page < total_page).then_some(page + 1),
            // An empty result has no neighbours at all, whatever page was asked for.
            prev_page: (current_page > 1 && total_page > 0).then(|| current_page - 1),
        }
    }
}

/// LIMIT/OFFSET for one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    pub fn new(page: u32, limit: u32) -> Self {
        PageWindow {
            limit,
            offset: u64::from(page.saturating_sub(1)) * u64::from(limit),
        }
    }

    /// Rows this window yields out of `total` matching rows.
    pub fn rows_of(&self, total: u64) -> u64 {
        total.saturating_sub(self.offset).min(u64::from(self.limit))
    }
}
