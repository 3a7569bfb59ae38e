//! Health check handlers
//!
//! Endpoints for liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use vibe_core::MatchMode;
use vibe_service::dto::{HealthResponse, ReadinessResponse};

use crate::state::AppState;

/// Basic health check (liveness probe)
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Readiness check with dependency health
///
/// GET /health/ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let backends = state.backends();

    let store_healthy = match &backends.database {
        Some(pool) => pool.acquire().await.is_ok(),
        // In-process store: a read through the port reports availability
        None => state
            .match_context()
            .pool_store()
            .list(MatchMode::Voice, 1)
            .await
            .is_ok(),
    };

    let events_healthy = match &backends.redis {
        Some(redis) => redis.health_check().await.is_ok(),
        None => true,
    };

    let response = ReadinessResponse::ready(store_healthy, events_healthy);
    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
