// In-memory repositories over the dataset
//
// Every repository filters, sorts and paginates with pure functions over the
// collection it owns; nothing here touches the network or the disk.

pub mod comparison;
pub mod crossings;
pub mod export;
pub mod files;
pub mod queries;

pub use comparison::PersonalRegistry;
pub use crossings::{
    CrossingFilter, CrossingRepository, CrossingRun, CrossingSummary, FilteredSummary,
};
pub use export::{export_csv, export_file_name};
pub use files::{FileFilter, FileRepository, NewUpload};
pub use queries::{ActiveFilter, QueryFilter, QueryRepository, QueryStatistics};

use crate::models::{Page, Pagination};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// Page position carried by every filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub page: usize,
    pub limit: usize,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Slices `items` into one page. A page below 1 is read as 1 and a zero limit
/// as the default limit; pages past the end come back empty.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
    let total = items.len();

    let items = items
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        items,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        },
    }
}

/// Rounds half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Behaviour shared by the file, crossing and result filters
pub trait Filter: Default {
    fn paging(&self) -> &Paging;

    fn paging_mut(&mut self) -> &mut Paging;

    /// Number of criteria set, pagination excluded
    fn active_filters_count(&self) -> usize;

    fn has_active_filters(&self) -> bool {
        self.active_filters_count() > 0
    }

    /// Back to no criteria, first page, default limit
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Changes criteria and returns to the first page
    fn apply<F>(&mut self, change: F)
    where
        Self: Sized,
        F: FnOnce(&mut Self),
    {
        change(self);
        self.paging_mut().page = DEFAULT_PAGE;
    }

    fn set_page(&mut self, page: usize) {
        self.paging_mut().page = page.max(1);
    }

    /// Changes the page size and returns to the first page
    fn set_limit(&mut self, limit: usize) {
        let paging = self.paging_mut();
        paging.limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        paging.page = DEFAULT_PAGE;
    }
}

/// Treats empty strings like absent criteria
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
