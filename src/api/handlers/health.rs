//! Handlers for health check and service info endpoints.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{SecondsFormat, Utc};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, InfoResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` through the link repository
/// 2. **Cache**: backend ping (always ok for the in-process cache)
/// 3. **Background tasks**: failure logger still running, tasks in flight
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let cache = check_cache(&state).await;
    let background_tasks = check_background_tasks(&state);

    let all_healthy = database.is_ok() && cache.is_ok() && background_tasks.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            cache,
            background_tasks,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    if state.link_repository.health_check().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Database unreachable")
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    let backend = state.cache.backend();
    if state.cache.health_check().await {
        CheckStatus::ok(format!("{} ok", backend))
    } else {
        CheckStatus::error(format!("{} unreachable", backend))
    }
}

fn check_background_tasks(state: &AppState) -> CheckStatus {
    if state.tasks.is_closed() {
        CheckStatus::error("Failure logger is not running")
    } else {
        CheckStatus::ok(format!("In flight: {}", state.tasks.in_flight()))
    }
}

/// Returns basic service information.
///
/// # Endpoint
///
/// `GET /`
pub async fn index_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        message: "zipway URL shortener".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
