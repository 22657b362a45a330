//! HTTP handlers, grouped by concern.

pub mod account;
pub mod admin;
pub mod health;
pub mod investment;
pub mod referral;
pub mod transaction;

use crate::gateway::types::{ApiError, error_codes, fail};
use crate::user_auth::service::Claims;
use axum::http::StatusCode;

/// Extract the user id from JWT claims injected by the auth middleware.
pub(crate) fn current_user_id(claims: &Claims) -> Result<i64, ApiError> {
    claims.sub.parse::<i64>().map_err(|_| {
        fail(
            StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Invalid or expired token",
        )
    })
}

pub(crate) fn internal_error(e: impl std::fmt::Debug) -> ApiError {
    tracing::error!("Handler failure: {:?}", e);
    fail(
        StatusCode::INTERNAL_SERVER_ERROR,
        error_codes::INTERNAL_ERROR,
        "Internal server error",
    )
}
