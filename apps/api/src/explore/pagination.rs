//! Pagination engine.
//!
//! The first page of either mode is 24 items at index 0; every load-more asks
//! for 5. The backend's page unit is fixed at 5, so the load-more index is
//! derived from how many items are already held (`fetched_count / 5`) rather
//! than from a counter. Page sizes are therefore not uniform across a
//! pagination session.

use serde::Serialize;

use crate::explore::mode::Mode;
use crate::models::search::ResultPage;

pub const INITIAL_PAGE_SIZE: usize = 24;
pub const LOAD_MORE_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Initial,
    More,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub kind: FetchKind,
    pub limit: usize,
    pub page: usize,
}

/// The parts of a page the pagination engine cares about, taken before the
/// hits are moved into the merged list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub received: usize,
    pub total: u64,
    pub pages: u64,
}

impl PageSummary {
    pub fn of(page: &ResultPage) -> Self {
        Self {
            received: page.hits.len(),
            total: page.total,
            pages: page.pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub mode: Mode,
    pub fetched_count: usize,
    pub page_index: usize,
    pub has_more: bool,
}

impl PaginationState {
    pub fn reset(mode: Mode) -> Self {
        Self {
            mode,
            fetched_count: 0,
            page_index: 0,
            has_more: false,
        }
    }

    pub fn initial_request(&self) -> PageRequest {
        debug_assert_eq!(self.fetched_count, 0, "initial fetch on a non-empty list");
        PageRequest {
            kind: FetchKind::Initial,
            limit: INITIAL_PAGE_SIZE,
            page: 0,
        }
    }

    pub fn load_more_request(&self) -> PageRequest {
        PageRequest {
            kind: FetchKind::More,
            limit: LOAD_MORE_PAGE_SIZE,
            page: self.fetched_count / LOAD_MORE_PAGE_SIZE,
        }
    }

    /// Records the outcome of a successful fetch. `fetched_count` is the length
    /// of the merged list.
    pub fn record(&mut self, request: &PageRequest, page: PageSummary, fetched_count: usize) {
        let full_page = page.received >= request.limit;
        let pages = page.pages as usize;

        self.page_index = request.page;
        self.fetched_count = fetched_count;
        self.has_more = full_page
            && match request.kind {
                FetchKind::Initial => page.total as usize > request.limit && pages > 1,
                FetchKind::More => request.page + 1 < pages,
            };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explore::testing::{hits, page};
    use crate::models::profile::ResultItem;

    fn summary(hits: Vec<ResultItem>, total: u64, pages: u64) -> PageSummary {
        PageSummary::of(&page(hits, total, pages))
    }

    #[test]
    fn test_initial_request_is_24_at_zero() {
        for mode in [Mode::Browse, Mode::Search] {
            let request = PaginationState::reset(mode).initial_request();
            assert_eq!(request.limit, 24);
            assert_eq!(request.page, 0);
            assert_eq!(request.kind, FetchKind::Initial);
        }
    }

    #[test]
    fn test_first_load_more_after_24_uses_page_4() {
        let mut state = PaginationState::reset(Mode::Browse);
        let request = state.initial_request();
        state.record(&request, summary(hits(24, 100.0), 100, 20), 24);
        assert!(state.has_more);

        let next = state.load_more_request();
        assert_eq!(next.limit, 5);
        assert_eq!(next.page, 4);
    }

    #[test]
    fn test_load_more_page_tracks_fetched_count() {
        let mut state = PaginationState::reset(Mode::Search);
        state.fetched_count = 29;
        assert_eq!(state.load_more_request().page, 5);
        state.fetched_count = 30;
        assert_eq!(state.load_more_request().page, 6);
    }

    #[test]
    fn test_short_initial_page_ends_pagination() {
        let mut state = PaginationState::reset(Mode::Search);
        let request = state.initial_request();
        state.record(&request, summary(hits(10, 50.0), 100, 20), 10);
        assert!(!state.has_more);
    }

    #[test]
    fn test_initial_single_page_ends_pagination() {
        let mut state = PaginationState::reset(Mode::Browse);
        let request = state.initial_request();
        state.record(&request, summary(hits(24, 50.0), 30, 1), 24);
        assert!(!state.has_more);
    }

    #[test]
    fn test_initial_total_equal_to_limit_ends_pagination() {
        let mut state = PaginationState::reset(Mode::Browse);
        let request = state.initial_request();
        state.record(&request, summary(hits(24, 50.0), 24, 5), 24);
        assert!(!state.has_more);
    }

    #[test]
    fn test_load_more_on_last_page_ends_pagination() {
        let mut state = PaginationState::reset(Mode::Browse);
        state.fetched_count = 95;
        state.has_more = true;
        let request = state.load_more_request();
        assert_eq!(request.page, 19);
        state.record(&request, summary(hits(5, 10.0), 100, 20), 100);
        assert!(!state.has_more);
        assert_eq!(state.page_index, 19);
    }

    #[test]
    fn test_short_load_more_page_ends_pagination() {
        let mut state = PaginationState::reset(Mode::Browse);
        state.fetched_count = 24;
        state.has_more = true;
        let request = state.load_more_request();
        state.record(&request, summary(hits(3, 10.0), 100, 20), 27);
        assert!(!state.has_more);
        assert_eq!(state.fetched_count, 27);
    }
}
