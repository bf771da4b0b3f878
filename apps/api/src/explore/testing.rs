//! Test doubles shared by the explore tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use crate::explore::controller::Clock;
use crate::models::profile::{ResultItem, Skill};
use crate::models::search::{FacetSet, ResultPage, SearchRequest};
use crate::search_client::{RateLimitNotice, SearchBackend, SearchError};

pub fn item(id: &str, score: f64, skills: &[&str]) -> ResultItem {
    ResultItem {
        id: id.to_string(),
        name: format!("Profile {id}"),
        designation: Some("Engineer".to_string()),
        location: Some("Remote".to_string()),
        skills: skills.iter().map(|s| Skill::Name(s.to_string())).collect(),
        profile_score: score,
        is_looking_for_job: false,
        match_percentage: None,
    }
}

/// `n` hits with distinct ids and strictly decreasing scores starting at `top`.
pub fn hits(n: usize, top: f64) -> Vec<ResultItem> {
    (0..n)
        .map(|i| item(&format!("p{top}-{i}"), top - i as f64 * 0.5, &[]))
        .collect()
}

pub fn page(hits: Vec<ResultItem>, total: u64, pages: u64) -> ResultPage {
    ResultPage { hits, total, pages }
}

pub fn rate_limited(secs: u64) -> SearchError {
    SearchError::RateLimited(RateLimitNotice {
        message: "Too many searches, slow down".to_string(),
        reset_in_seconds: secs,
        is_authenticated: false,
    })
}

pub fn server_error() -> SearchError {
    SearchError::Api {
        status: 503,
        message: "search unavailable".to_string(),
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
}

/// Backend that replays scripted responses in order and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    searches: Mutex<VecDeque<Result<ResultPage, SearchError>>>,
    facets: Mutex<VecDeque<Result<FacetSet, SearchError>>>,
    requests: Mutex<Vec<SearchRequest>>,
    facet_calls: Mutex<usize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_search(&self, response: Result<ResultPage, SearchError>) -> &Self {
        self.searches.lock().push_back(response);
        self
    }

    pub fn push_facets(&self, response: Result<FacetSet, SearchError>) -> &Self {
        self.facets.lock().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }

    pub fn facet_calls(&self) -> usize {
        *self.facet_calls.lock()
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn get_facets(&self) -> Result<FacetSet, SearchError> {
        *self.facet_calls.lock() += 1;
        self.facets.lock().pop_front().unwrap_or_else(|| Err(server_error()))
    }

    async fn search_users(&self, request: &SearchRequest) -> Result<ResultPage, SearchError> {
        self.requests.lock().push(request.clone());
        self.searches
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(server_error()))
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
