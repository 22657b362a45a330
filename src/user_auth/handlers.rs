use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::service::{AuthError, AuthResponse, Claims, LoginRequest, RegisterRequest};
use crate::gateway::types::{ApiResponse, HandlerResult, created, error_codes, fail, ok};
use crate::gateway::state::AppState;

fn auth_error_response(e: AuthError) -> (StatusCode, Json<ApiResponse<()>>) {
    match e {
        AuthError::Validation(_)
        | AuthError::InvalidInviteCode
        | AuthError::UsernameTaken
        | AuthError::EmailTaken
        | AuthError::PhoneTaken
        | AuthError::TelegramTaken => fail(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION,
            e.to_string(),
        ),
        AuthError::InvalidCredentials => fail(
            StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Invalid credentials",
        ),
        AuthError::Database(_) | AuthError::Hash(_) | AuthError::Token(_) => {
            tracing::error!("Auth failure: {:?}", e);
            fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                "Internal server error",
            )
        }
    }
}

/// Register a new user
///
/// POST /api/register
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input, invite code or duplicate identifier"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> HandlerResult<AuthResponse> {
    match state.auth.register(&state.rules, req).await {
        Ok(resp) => Ok(created(resp)),
        Err(e) => Err(auth_error_response(e)),
    }
}

/// Login user
///
/// POST /api/login
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HandlerResult<AuthResponse> {
    match state.auth.login(req).await {
        Ok(resp) => Ok(ok(resp)),
        Err(e @ AuthError::Validation(_)) => Err(auth_error_response(e)),
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed: invalid credentials");
            Err(auth_error_response(AuthError::InvalidCredentials))
        }
        Err(e) => Err(auth_error_response(e)),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifySecurityPasswordRequest {
    #[schema(example = "secpass456")]
    #[serde(alias = "securityPassword")]
    pub security_password: String,
}

/// Verify the secondary (security) password before a sensitive operation
///
/// POST /api/verify-security-password
#[utoipa::path(
    post,
    path = "/api/verify-security-password",
    request_body = VerifySecurityPasswordRequest,
    responses(
        (status = 200, description = "Security password is correct", body = ApiResponse<bool>),
        (status = 401, description = "Security password is incorrect or missing token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn verify_security_password(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
    Json(req): Json<VerifySecurityPasswordRequest>,
) -> HandlerResult<bool> {
    let user_id = claims.sub.parse::<i64>().unwrap_or_default();

    match state
        .auth
        .verify_security_password(user_id, &req.security_password)
        .await
    {
        Ok(true) => Ok(ok(true)),
        Ok(false) => Err(fail(
            StatusCode::UNAUTHORIZED,
            error_codes::AUTH_FAILED,
            "Security password is incorrect",
        )),
        Err(e) => Err(auth_error_response(e)),
    }
}
