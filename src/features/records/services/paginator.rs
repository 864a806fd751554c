use crate::features::records::models::{Record, RecordFilter};
use crate::features::records::store::{RecordStore, StoreResult};
use crate::shared::constants::PAGE_SIZE;

/// One window of the record list.
///
/// Neighbour page numbers are clamped into range rather than left empty, so
/// templates can always link them; `has_prev`/`has_next` tell whether the
/// link actually leads somewhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Record>,
    pub current_page: u64,
    pub previous_page: u64,
    pub next_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

impl Page {
    /// The sentinel for a page number past the end of the list
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            previous_page: 0,
            next_page: 0,
            total_pages: 0,
            total_items: 0,
            has_prev: false,
            has_next: false,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.current_page == 0
    }
}

/// Page arithmetic, independent of any store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub skip: u64,
    pub limit: u64,
    pub previous_page: u64,
    pub next_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl PageWindow {
    /// `None` when `requested_page` is 0 or past the last page. An empty
    /// list still has a page 1, so the canonical list always renders.
    pub fn compute(total_items: u64, requested_page: u64, page_size: u64) -> Option<Self> {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size);
        let last_page = total_pages.max(1);

        if requested_page == 0 || requested_page > last_page {
            return None;
        }

        Some(Self {
            page: requested_page,
            skip: (requested_page - 1) * page_size,
            limit: page_size,
            previous_page: requested_page.saturating_sub(1).max(1),
            next_page: (requested_page + 1).min(last_page),
            total_pages,
            total_items,
        })
    }
}

pub struct Paginator {
    page_size: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    /// Count matching records, then fetch the requested window. Out of range
    /// requests return [`Page::empty`] without a second store call.
    pub async fn paginate(
        &self,
        store: &dyn RecordStore,
        filter: &RecordFilter,
        requested_page: u64,
    ) -> StoreResult<Page> {
        let total_items = store.count(filter).await?;

        let Some(window) = PageWindow::compute(total_items, requested_page, self.page_size) else {
            return Ok(Page::empty());
        };

        let items = store.find_page(filter, window.skip, window.limit).await?;

        Ok(Page {
            items,
            current_page: window.page,
            previous_page: window.previous_page,
            next_page: window.next_page,
            total_pages: window.total_pages,
            total_items: window.total_items,
            has_prev: window.page > 1,
            has_next: window.page < window.total_pages,
        })
    }
}
