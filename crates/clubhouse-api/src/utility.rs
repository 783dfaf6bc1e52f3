use axum::{Json, extract::State, response::IntoResponse};

use clubhouse_types::api::{HealthResponse, StatsResponse};

use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /stats: row counts across the engine's tables.
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = run_blocking(&state, |db| db.stats()).await?;

    Ok(Json(StatsResponse {
        total_students: stats.students,
        total_clubs: stats.clubs,
        total_memberships: stats.memberships,
        total_bookmarks: stats.bookmarks,
        total_messages: stats.messages,
    }))
}
