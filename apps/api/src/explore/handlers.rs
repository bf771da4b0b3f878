//! Axum route handlers for the Explore API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::explore::controller::ExploreController;
use crate::explore::filters::{normalize_query, FilterState};
use crate::explore::state::{ExploreSnapshot, Outcome};
use crate::models::search::FacetSet;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Address-bar parameters that seed a new session.
#[derive(Debug, Default, Deserialize)]
pub struct SeedParams {
    pub q: Option<String>,
    /// Quoted suggestion shortcut; behaves like a typed query.
    pub filter: Option<String>,
}

impl SeedParams {
    /// `q` wins over `filter`; blank values are ignored. Only the `filter`
    /// suggestion has its quotes stripped.
    pub fn seed_query(&self) -> Option<String> {
        let typed = self.q.as_deref().map(normalize_query);
        let suggested = self
            .filter
            .as_deref()
            .map(|raw| normalize_query(&raw.replace('"', " ")));
        typed.into_iter().chain(suggested).find(|q| !q.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ExploreResponse {
    pub session_id: Uuid,
    pub outcome: Option<Outcome>,
    #[serde(flatten)]
    pub snapshot: ExploreSnapshot,
}

impl ExploreResponse {
    fn new(controller: &ExploreController, outcome: Option<Outcome>) -> Self {
        Self {
            session_id: controller.id(),
            outcome,
            snapshot: controller.snapshot(),
        }
    }
}

fn session(state: &AppState, id: Uuid) -> Result<Arc<ExploreController>, AppError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Explore session {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/explore/sessions?q=&filter=
///
/// Creates a session, seeds its query and runs the first fetch.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Query(params): Query<SeedParams>,
) -> Result<(StatusCode, Json<ExploreResponse>), AppError> {
    let seed = params.seed_query();
    let controller = state.sessions.create(seed.as_deref());
    let outcome = controller.start().await;
    Ok((
        StatusCode::CREATED,
        Json(ExploreResponse::new(&controller, Some(outcome))),
    ))
}

/// GET /api/v1/explore/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExploreResponse>, AppError> {
    let controller = session(&state, id)?;
    Ok(Json(ExploreResponse::new(&controller, None)))
}

/// DELETE /api/v1/explore/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Explore session {id} not found")))
    }
}

/// POST /api/v1/explore/sessions/:id/query
pub async fn handle_submit_query(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<ExploreResponse>, AppError> {
    let controller = session(&state, id)?;
    let outcome = controller.submit_query(&request.q).await;
    Ok(Json(ExploreResponse::new(&controller, Some(outcome))))
}

/// PUT /api/v1/explore/sessions/:id/filters
pub async fn handle_set_filters(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(filters): Json<FilterState>,
) -> Result<Json<ExploreResponse>, AppError> {
    filters.validate().map_err(AppError::Validation)?;
    let controller = session(&state, id)?;
    let outcome = controller.set_filters(filters).await;
    Ok(Json(ExploreResponse::new(&controller, Some(outcome))))
}

/// POST /api/v1/explore/sessions/:id/clear
///
/// Clears the query text; active filters are kept.
pub async fn handle_clear_query(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExploreResponse>, AppError> {
    let controller = session(&state, id)?;
    let outcome = controller.clear_query().await;
    Ok(Json(ExploreResponse::new(&controller, Some(outcome))))
}

/// POST /api/v1/explore/sessions/:id/clear-filters
pub async fn handle_clear_filters(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExploreResponse>, AppError> {
    let controller = session(&state, id)?;
    let outcome = controller.clear_filters().await;
    Ok(Json(ExploreResponse::new(&controller, Some(outcome))))
}

/// POST /api/v1/explore/sessions/:id/load-more
pub async fn handle_load_more(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExploreResponse>, AppError> {
    let controller = session(&state, id)?;
    let outcome = controller.load_more().await;
    Ok(Json(ExploreResponse::new(&controller, Some(outcome))))
}

/// POST /api/v1/explore/sessions/:id/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExploreResponse>, AppError> {
    let controller = session(&state, id)?;
    let outcome = controller.refresh().await;
    Ok(Json(ExploreResponse::new(&controller, Some(outcome))))
}

/// GET /api/v1/explore/sessions/:id/facets
pub async fn handle_get_facets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FacetSet>, AppError> {
    let controller = session(&state, id)?;
    Ok(Json(controller.facets().await?))
}
