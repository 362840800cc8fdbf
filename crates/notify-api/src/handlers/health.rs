//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let database = match &state.db_pool {
        None => "not_configured",
        Some(pool) => match pool.health_check().await {
            Ok(true) => "up",
            _ => "down",
        },
    };

    Json(ApiResponse::ok(HealthResponse {
        status: if database == "down" { "degraded" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: database.to_string(),
        channels: state.orchestrator.channels().methods(),
    }))
}
