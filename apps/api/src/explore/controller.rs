use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::explore::facets::FacetCatalog;
use crate::explore::filters::FilterState;
use crate::explore::state::{Event, ExploreSnapshot, ExploreState, Outcome, Transition};
use crate::models::search::FacetSet;
use crate::search_client::{SearchBackend, SearchError};

/// Source of "now" for cooldown arithmetic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// One Explore session: owns the state machine and drives backend calls.
///
/// The state lock is never held across an `.await`; every backend result
/// re-enters through `ExploreState::reduce`, which drops completions for
/// torn-down sessions or replaced lists.
pub struct ExploreController {
    id: Uuid,
    backend: Arc<dyn SearchBackend>,
    clock: Arc<dyn Clock>,
    state: Mutex<ExploreState>,
    facets: FacetCatalog,
}

impl ExploreController {
    pub fn new(
        id: Uuid,
        backend: Arc<dyn SearchBackend>,
        clock: Arc<dyn Clock>,
        seed_query: Option<&str>,
    ) -> Self {
        Self {
            id,
            backend,
            clock,
            state: Mutex::new(ExploreState::new(seed_query)),
            facets: FacetCatalog::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Applies one event at the current time. Exposed so callers can drive
    /// interleavings step by step; the async operations below are built on it.
    pub fn dispatch(&self, event: Event) -> Transition {
        let now = self.clock.now();
        self.state.lock().reduce(event, now)
    }

    /// Issues the first fetch for the seeded query.
    pub async fn start(&self) -> Outcome {
        self.run(Event::Refresh).await
    }

    pub async fn submit_query(&self, raw: &str) -> Outcome {
        self.run(Event::QuerySubmitted(raw.to_string())).await
    }

    pub async fn set_filters(&self, filters: FilterState) -> Outcome {
        self.run(Event::FiltersChanged(filters)).await
    }

    /// Clears the query text only; filters stay as they are.
    pub async fn clear_query(&self) -> Outcome {
        self.run(Event::QueryCleared).await
    }

    pub async fn clear_filters(&self) -> Outcome {
        self.run(Event::FiltersCleared).await
    }

    pub async fn refresh(&self) -> Outcome {
        self.run(Event::Refresh).await
    }

    pub async fn load_more(&self) -> Outcome {
        self.run(Event::LoadMoreRequested).await
    }

    /// Facet catalog for this session. While the guard is blocking, a cached
    /// catalog is still served but no load is attempted.
    pub async fn facets(&self) -> Result<FacetSet, SearchError> {
        let now = self.clock.now();
        let blocked = self.state.lock().cooldown(now).map(|c| c.notice(now));

        if let Some(notice) = blocked {
            if let Some(facets) = self.facets.cached().await {
                return Ok(facets);
            }
            return Err(SearchError::RateLimited(notice));
        }

        match self.facets.get_or_load(self.backend.as_ref()).await {
            Err(SearchError::RateLimited(notice)) => {
                self.dispatch(Event::FacetsRateLimited(notice.clone()));
                Err(SearchError::RateLimited(notice))
            }
            Err(e) => {
                warn!(session = %self.id, "facet load failed: {e}");
                Err(e)
            }
            ok => ok,
        }
    }

    pub fn snapshot(&self) -> ExploreSnapshot {
        let now = self.clock.now();
        self.state.lock().snapshot(now)
    }

    /// Marks the session dead. Responses still in flight are dropped on arrival.
    pub fn teardown(&self) {
        self.dispatch(Event::TornDown);
    }

    pub fn is_alive(&self) -> bool {
        self.state.lock().is_alive()
    }

    async fn run(&self, event: Event) -> Outcome {
        let mut transition = self.dispatch(event);
        loop {
            match transition {
                Transition::Done(outcome) => return outcome,
                Transition::Fetch(ticket) => {
                    let request = ticket.search_request();
                    debug!(
                        session = %self.id,
                        generation = ticket.generation,
                        page = request.page,
                        limit = request.limit,
                        "calling search backend"
                    );
                    let result = self.backend.search_users(&request).await;
                    transition = self.dispatch(Event::FetchCompleted { ticket, result });
                }
            }
        }
    }
}
