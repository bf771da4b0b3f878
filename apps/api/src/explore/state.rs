//! Explore state machine.
//!
//! All mutation goes through `ExploreState::reduce`. The reducer never
//! performs I/O: when a fetch is needed it returns `Transition::Fetch` with a
//! ticket, and the caller feeds the backend result back in as
//! `Event::FetchCompleted`. A completion is applied only if the session is
//! still alive and its ticket matches the current generation and signature.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::explore::filters::{normalize_query, FilterState};
use crate::explore::merger::{is_sorted_by_score, merge_more, merge_reset};
use crate::explore::mode::{FetchSignature, Mode};
use crate::explore::pagination::{FetchKind, PageRequest, PageSummary, PaginationState};
use crate::explore::rate_limit::{Cooldown, RateLimitState};
use crate::models::profile::ResultItem;
use crate::models::search::{ResultPage, SearchRequest};
use crate::search_client::{RateLimitNotice, SearchError};

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    FetchingInitial,
    FetchingMore,
    /// A fetch issued before the block keeps its slot in `in_flight`.
    Blocked {
        cooldown: Cooldown,
        in_flight: Option<FetchKind>,
    },
}

impl Phase {
    fn from_in_flight(in_flight: Option<FetchKind>) -> Self {
        match in_flight {
            None => Phase::Idle,
            Some(FetchKind::Initial) => Phase::FetchingInitial,
            Some(FetchKind::More) => Phase::FetchingMore,
        }
    }

    fn in_flight(&self) -> Option<FetchKind> {
        match self {
            Phase::Idle => None,
            Phase::FetchingInitial => Some(FetchKind::Initial),
            Phase::FetchingMore => Some(FetchKind::More),
            Phase::Blocked { in_flight, .. } => *in_flight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    Idle,
    FetchingInitial,
    FetchingMore,
    Blocked,
}

/// Everything needed to issue one backend call and to recognise its
/// completion later.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub signature: FetchSignature,
    pub request: PageRequest,
}

impl FetchTicket {
    pub fn search_request(&self) -> SearchRequest {
        let filters = &self.signature.filters;
        SearchRequest {
            q: self.signature.query.clone(),
            limit: self.request.limit,
            page: self.request.page,
            advanced_filters: filters.is_active().then(|| filters.to_advanced_filters()),
        }
    }
}

#[derive(Debug)]
pub enum Event {
    QuerySubmitted(String),
    FiltersChanged(FilterState),
    QueryCleared,
    FiltersCleared,
    Refresh,
    LoadMoreRequested,
    FetchCompleted {
        ticket: FetchTicket,
        result: Result<ResultPage, SearchError>,
    },
    FacetsRateLimited(RateLimitNotice),
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMoreRejection {
    AlreadyLoading,
    InitialInFlight,
    Exhausted,
}

/// Result of one operation, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Same query and filters as the list already shows.
    Unchanged,
    Rejected { reason: LoadMoreRejection },
    /// Blocked by the rate-limit guard; no network call was made.
    Suppressed { reset_in_seconds: u64 },
    RateLimited { reset_in_seconds: u64 },
    Failed { message: String },
    /// Completion for a list that has since been replaced.
    Discarded,
    /// Session torn down.
    Dropped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Fetch(FetchTicket),
    Done(Outcome),
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationView {
    pub mode: Mode,
    pub fetched_count: usize,
    pub page_index: usize,
    pub has_more: bool,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExploreSnapshot {
    pub query: String,
    pub filters: FilterState,
    pub mode: Mode,
    pub results: Vec<ResultItem>,
    pub pagination: PaginationView,
    pub rate_limit: RateLimitState,
    pub phase: PhaseName,
    /// The list does not reflect the current query/filters yet.
    pub stale: bool,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct ExploreState {
    query: String,
    filters: FilterState,
    mode: Mode,
    results: Vec<ResultItem>,
    pagination: PaginationState,
    phase: Phase,
    generation: u64,
    active_signature: Option<FetchSignature>,
    /// The last issued reset failed or was rate limited.
    reset_failed: bool,
    last_error: Option<String>,
    alive: bool,
}

impl ExploreState {
    pub fn new(seed_query: Option<&str>) -> Self {
        let query = seed_query.map(normalize_query).unwrap_or_default();
        let filters = FilterState::default();
        let signature = FetchSignature::new(&query, &filters);
        Self {
            query,
            filters,
            mode: signature.mode,
            results: Vec::new(),
            pagination: PaginationState::reset(signature.mode),
            phase: Phase::Idle,
            generation: 0,
            active_signature: None,
            reset_failed: false,
            last_error: None,
            alive: true,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Active cooldown, if the guard is still blocking at `now`.
    pub fn cooldown(&self, now: DateTime<Utc>) -> Option<&Cooldown> {
        match &self.phase {
            Phase::Blocked { cooldown, .. } if !cooldown.has_elapsed(now) => Some(cooldown),
            _ => None,
        }
    }

    pub fn reduce(&mut self, event: Event, now: DateTime<Utc>) -> Transition {
        if !self.alive {
            return Transition::Done(Outcome::Dropped);
        }
        self.settle(now);

        let transition = match event {
            Event::QuerySubmitted(raw) => {
                let query = normalize_query(&raw);
                let signature = FetchSignature::new(&query, &self.filters);
                if !self.is_stale() && self.active_signature.as_ref() == Some(&signature) {
                    debug!(query = %query, "query unchanged, skipping fetch");
                    return Transition::Done(Outcome::Unchanged);
                }
                self.query = query;
                self.begin_reset(now)
            }
            Event::FiltersChanged(filters) => {
                self.filters = filters.normalized();
                self.begin_reset(now)
            }
            Event::QueryCleared => {
                self.query.clear();
                self.begin_reset(now)
            }
            Event::FiltersCleared => {
                self.filters = FilterState::default();
                self.begin_reset(now)
            }
            Event::Refresh => self.begin_reset(now),
            Event::LoadMoreRequested => self.begin_load_more(now),
            Event::FetchCompleted { ticket, result } => {
                Transition::Done(self.complete(ticket, result, now))
            }
            Event::FacetsRateLimited(notice) => {
                let cooldown = Cooldown::from_notice(&notice, now);
                let remaining = cooldown.remaining_secs(now);
                warn!(reset_in_seconds = remaining, "facet load rate limited");
                self.phase = Phase::Blocked {
                    cooldown,
                    in_flight: self.phase.in_flight(),
                };
                Transition::Done(Outcome::RateLimited {
                    reset_in_seconds: remaining,
                })
            }
            Event::TornDown => {
                self.alive = false;
                Transition::Done(Outcome::Dropped)
            }
        };

        self.check_invariants();
        transition
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> ExploreSnapshot {
        let cooldown = self.cooldown(now);
        let in_flight = self.phase.in_flight();
        let phase = match in_flight {
            _ if cooldown.is_some() => PhaseName::Blocked,
            None => PhaseName::Idle,
            Some(FetchKind::Initial) => PhaseName::FetchingInitial,
            Some(FetchKind::More) => PhaseName::FetchingMore,
        };
        let stale = self.is_stale();

        ExploreSnapshot {
            query: self.query.clone(),
            filters: self.filters.clone(),
            mode: self.mode,
            results: self.results.clone(),
            pagination: PaginationView {
                mode: self.pagination.mode,
                fetched_count: self.pagination.fetched_count,
                page_index: self.pagination.page_index,
                has_more: self.pagination.has_more && !stale,
                is_loading_initial: in_flight == Some(FetchKind::Initial),
                is_loading_more: in_flight == Some(FetchKind::More),
            },
            rate_limit: RateLimitState::from_cooldown(cooldown, now),
            phase,
            stale,
            last_error: self.last_error.clone(),
        }
    }

    /// The list does not reflect the current query and filters.
    fn is_stale(&self) -> bool {
        self.reset_failed
            || self.active_signature.as_ref()
                != Some(&FetchSignature::new(&self.query, &self.filters))
    }

    /// Lifts an elapsed block without waiting for a fetch to unstick it.
    fn settle(&mut self, now: DateTime<Utc>) {
        let lifted = match &self.phase {
            Phase::Blocked { cooldown, in_flight } if cooldown.has_elapsed(now) => Some(*in_flight),
            _ => None,
        };
        if let Some(in_flight) = lifted {
            info!(resumes = ?in_flight, "rate-limit cooldown elapsed");
            self.phase = Phase::from_in_flight(in_flight);
        }
    }

    fn begin_reset(&mut self, now: DateTime<Utc>) -> Transition {
        let signature = FetchSignature::new(&self.query, &self.filters);
        self.mode = signature.mode;

        if let Some(reset_in_seconds) = self.cooldown(now).map(|c| c.remaining_secs(now)) {
            debug!(reset_in_seconds, "reset suppressed while rate limited");
            return Transition::Done(Outcome::Suppressed { reset_in_seconds });
        }

        self.generation += 1;
        self.results.clear();
        self.pagination = PaginationState::reset(signature.mode);
        self.phase = Phase::FetchingInitial;
        self.reset_failed = false;
        self.last_error = None;
        self.active_signature = Some(signature.clone());

        debug!(
            generation = self.generation,
            mode = ?signature.mode,
            query = %signature.query,
            "issuing reset fetch"
        );

        Transition::Fetch(FetchTicket {
            generation: self.generation,
            request: self.pagination.initial_request(),
            signature,
        })
    }

    fn begin_load_more(&mut self, now: DateTime<Utc>) -> Transition {
        let rejected = |reason| Transition::Done(Outcome::Rejected { reason });

        match self.phase.in_flight() {
            Some(FetchKind::More) => return rejected(LoadMoreRejection::AlreadyLoading),
            Some(FetchKind::Initial) => return rejected(LoadMoreRejection::InitialInFlight),
            None => {}
        }
        if let Some(cooldown) = self.cooldown(now) {
            return Transition::Done(Outcome::Suppressed {
                reset_in_seconds: cooldown.remaining_secs(now),
            });
        }

        let signature = match &self.active_signature {
            Some(signature) if !self.is_stale() && self.pagination.has_more => signature.clone(),
            _ => return rejected(LoadMoreRejection::Exhausted),
        };

        let request = self.pagination.load_more_request();
        self.phase = Phase::FetchingMore;

        debug!(
            generation = self.generation,
            page = request.page,
            fetched = self.pagination.fetched_count,
            "issuing load-more fetch"
        );

        Transition::Fetch(FetchTicket {
            generation: self.generation,
            signature,
            request,
        })
    }

    fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<ResultPage, SearchError>,
        now: DateTime<Utc>,
    ) -> Outcome {
        if ticket.generation != self.generation
            || self.active_signature.as_ref() != Some(&ticket.signature)
        {
            debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                kind = ?ticket.request.kind,
                "discarding stale completion"
            );
            return Outcome::Discarded;
        }

        let kind = ticket.request.kind;
        let outcome = match result {
            Ok(page) => {
                let signature = &ticket.signature;
                let summary = PageSummary::of(&page);
                self.results = match kind {
                    FetchKind::Initial => merge_reset(page.hits, signature.mode, &signature.query),
                    FetchKind::More => merge_more(
                        &self.results,
                        page.hits,
                        signature.mode,
                        &signature.query,
                    ),
                };
                self.pagination
                    .record(&ticket.request, summary, self.results.len());
                info!(
                    kind = ?kind,
                    received = summary.received,
                    displayed = self.results.len(),
                    has_more = self.pagination.has_more,
                    "page applied"
                );
                Outcome::Applied
            }
            Err(SearchError::RateLimited(notice)) => {
                let cooldown = Cooldown::from_notice(&notice, now);
                let reset_in_seconds = cooldown.remaining_secs(now);
                warn!(kind = ?kind, reset_in_seconds, "search rate limited");
                if kind == FetchKind::Initial {
                    self.reset_failed = true;
                }
                self.phase = Phase::Blocked {
                    cooldown,
                    in_flight: None,
                };
                return Outcome::RateLimited { reset_in_seconds };
            }
            Err(e) => {
                warn!(kind = ?kind, "search fetch failed: {e}");
                if kind == FetchKind::Initial {
                    self.results.clear();
                    self.pagination = PaginationState::reset(ticket.signature.mode);
                    self.reset_failed = true;
                }
                self.last_error = Some(e.to_string());
                Outcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        self.phase = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Blocked { cooldown, .. } => Phase::Blocked {
                cooldown,
                in_flight: None,
            },
            _ => Phase::Idle,
        };
        outcome
    }

    #[cfg(test)]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[cfg(test)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    pub fn results(&self) -> &[ResultItem] {
        &self.results
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.pagination.fetched_count,
            self.results.len(),
            "fetched_count diverged from the displayed list"
        );
        debug_assert!(
            is_sorted_by_score(&self.results),
            "displayed list is not sorted by profile score"
        );
    }
}
