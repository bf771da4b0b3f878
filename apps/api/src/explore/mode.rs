use serde::{Deserialize, Serialize};

use crate::explore::filters::{normalize_query, FilterState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Browse,
    Search,
}

/// Search iff the normalized query is non-empty or any filter is active.
pub fn resolve_mode(query: &str, filters: &FilterState) -> Mode {
    if !normalize_query(query).is_empty() || filters.is_active() {
        Mode::Search
    } else {
        Mode::Browse
    }
}

/// Identity of the result list: a completion is only applied while the
/// signature it was requested under is still the active one.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSignature {
    pub mode: Mode,
    pub query: String,
    pub filters: FilterState,
}

impl FetchSignature {
    pub fn new(query: &str, filters: &FilterState) -> Self {
        let query = normalize_query(query);
        let mode = resolve_mode(&query, filters);
        Self {
            mode,
            query,
            filters: filters.clone(),
        }
    }
}
