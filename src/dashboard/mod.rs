use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::catalog::EventCatalog;
use crate::fantasy::SelectionValidator;
use crate::snapshot::Snapshot;
use crate::store::models::League;

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<Snapshot>,
    pub catalog: Arc<EventCatalog>,
    pub league: Arc<League>,
    pub validator: SelectionValidator,
}

/// Build the read-only JSON API over one snapshot.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/snapshot", get(snapshot_handler))
        .route("/api/results", get(results_handler))
        .route("/api/results/new", get(new_results_handler))
        .route("/api/scores", get(standings_handler))
        .route("/api/scores/:participant", get(score_handler))
        .route("/api/verify/:participant", get(verify_handler))
        .route("/api/eligibility/:participant/:event", get(eligibility_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /api/snapshot
async fn snapshot_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot.as_ref().clone())
}

/// GET /api/results
async fn results_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot.results.clone())
}

/// GET /api/results/new
async fn new_results_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot.new_results.clone())
}

/// GET /api/scores
async fn standings_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.snapshot.standings.clone())
}

/// GET /api/scores/:participant
async fn score_handler(
    State(state): State<Arc<AppState>>,
    Path(participant): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .snapshot
        .verifications
        .get(&participant)
        .map(|v| Json(v.score.clone()))
        .ok_or_else(|| not_found(&participant))
}

/// GET /api/verify/:participant
async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Path(participant): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .snapshot
        .verifications
        .get(&participant)
        .map(|v| Json(v.clone()))
        .ok_or_else(|| not_found(&participant))
}

/// GET /api/eligibility/:participant/:event
async fn eligibility_handler(
    State(state): State<Arc<AppState>>,
    Path((participant, event)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let member = state
        .league
        .participants
        .iter()
        .find(|p| p.id == participant)
        .ok_or_else(|| not_found(&participant))?;
    state
        .validator
        .evaluate(member, &state.catalog, &event, Utc::now())
        .map(Json)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))
}

fn not_found(participant: &str) -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        format!("unknown participant {}", participant),
    )
}
