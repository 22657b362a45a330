//! Referral endpoints: invite codes, referral list, and the public
//! welcome code.

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use super::{current_user_id, internal_error};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, HandlerResult, created, error_codes, fail, ok};
use crate::models::InviteCode;
use crate::referral::{ReferralDetail, ReferralService};
use crate::user_auth::service::Claims;

/// Create a fresh invite code owned by the current user
///
/// POST /api/invite-code
#[utoipa::path(
    post,
    path = "/api/invite-code",
    responses(
        (status = 201, description = "Invite code created", body = ApiResponse<InviteCode>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Referrals"
)]
pub async fn create_invite_code(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<InviteCode> {
    let user_id = current_user_id(&claims)?;
    let pool = state.db.pool();

    // Regenerate on the rare collision with an existing code.
    let mut last_err = None;
    for _ in 0..5 {
        let code = ReferralService::generate_code();
        match ReferralService::create_invite_code(pool, &code, Some(user_id)).await {
            Ok(invite) => return Ok(created(invite)),
            Err(e) => last_err = Some(e),
        }
    }
    Err(internal_error(last_err))
}

/// List invite codes created by the current user
///
/// GET /api/invite-codes
#[utoipa::path(
    get,
    path = "/api/invite-codes",
    responses(
        (status = 200, description = "Invite codes", body = ApiResponse<Vec<InviteCode>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Referrals"
)]
pub async fn list_invite_codes(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<Vec<InviteCode>> {
    let user_id = current_user_id(&claims)?;

    let codes = ReferralService::invite_codes_by_creator(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?;
    Ok(ok(codes))
}

/// List users referred by the current user
///
/// GET /api/referrals
#[utoipa::path(
    get,
    path = "/api/referrals",
    responses(
        (status = 200, description = "Referred users", body = ApiResponse<Vec<ReferralDetail>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Referrals"
)]
pub async fn list_referrals(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<Vec<ReferralDetail>> {
    let user_id = current_user_id(&claims)?;

    let referrals = ReferralService::referral_details(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?;
    Ok(ok(referrals))
}

/// Public welcome invite code, usable by anyone to register
///
/// GET /api/welcome-code
#[utoipa::path(
    get,
    path = "/api/welcome-code",
    responses(
        (status = 200, description = "The welcome invite code", body = ApiResponse<InviteCode>),
        (status = 404, description = "No welcome code seeded")
    ),
    tag = "Referrals"
)]
pub async fn welcome_code(State(state): State<Arc<AppState>>) -> HandlerResult<InviteCode> {
    let codes = ReferralService::invite_codes_by_creator(state.db.pool(), state.admin_user_id)
        .await
        .map_err(internal_error)?;

    // The oldest admin-owned code is the seeded welcome code.
    codes
        .into_iter()
        .min_by_key(|c| c.created_at)
        .map(ok)
        .ok_or_else(|| {
            fail(
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                "Welcome code not configured",
            )
        })
}
