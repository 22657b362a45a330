//! Liveness endpoint.

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, HandlerResult, error_codes, fail, ok};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "ok")]
    pub status: &'static str,
    pub database: bool,
}

/// Health check
///
/// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = ApiResponse<HealthStatus>),
        (status = 503, description = "Database unreachable")
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> HandlerResult<HealthStatus> {
    match state.db.health_check().await {
        Ok(()) => Ok(ok(HealthStatus {
            status: "ok",
            database: true,
        })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            Err(fail(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
                "Database unreachable",
            ))
        }
    }
}
