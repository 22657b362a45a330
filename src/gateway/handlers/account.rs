//! Account endpoints: balances snapshot, profile, contact updates,
//! dashboard stats, verification submission.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{current_user_id, internal_error};
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, HandlerResult, error_codes, fail, ok};
use crate::models::UserProfile;
use crate::referral::{ReferralDetail, ReferralService};
use crate::user_auth::service::Claims;
use crate::users::UserRepository;

/// Get current account snapshot (all balance fields)
///
/// GET /api/account
#[utoipa::path(
    get,
    path = "/api/account",
    responses(
        (status = 200, description = "Account snapshot", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<UserProfile> {
    let user_id = current_user_id(&claims)?;

    let user = UserRepository::get_by_id(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            fail(
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                "User not found",
            )
        })?;

    Ok(ok(user.into()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    #[schema(example = "user1@example.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub telegram: Option<String>,
}

/// Update contact details. Omitted fields are left unchanged.
///
/// PATCH /api/account
#[utoipa::path(
    patch,
    path = "/api/account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = ApiResponse<UserProfile>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
    Json(req): Json<UpdateAccountRequest>,
) -> HandlerResult<UserProfile> {
    let user_id = current_user_id(&claims)?;

    let user = UserRepository::update_contact(
        state.db.pool(),
        user_id,
        req.email.as_deref(),
        req.phone.as_deref(),
        req.telegram.as_deref(),
    )
    .await
    .map_err(internal_error)?
    .ok_or_else(|| {
        fail(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "User not found",
        )
    })?;

    Ok(ok(user.into()))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserProfile,
    pub referrals: Vec<ReferralDetail>,
}

/// Profile view: sanitized user plus the people they referred
///
/// GET /api/profile
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile with referral list", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<ProfileResponse> {
    let user_id = current_user_id(&claims)?;

    let user = UserRepository::get_by_id(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            fail(
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                "User not found",
            )
        })?;

    let referrals = ReferralService::referral_details(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?;

    Ok(ok(ProfileResponse {
        user: user.into(),
        referrals,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_assets: Decimal,
    pub quantitative_assets: Decimal,
    pub profit_assets: Decimal,
    pub recharge_amount: Decimal,
    pub today_earnings: Decimal,
    pub yesterday_earnings: Decimal,
    pub commission_today: Decimal,
    pub commission_assets: Decimal,
    pub active_investments: i64,
    pub team_size: i64,
}

/// Dashboard statistics: balances plus counters
///
/// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStats>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<DashboardStats> {
    let user_id = current_user_id(&claims)?;
    let pool = state.db.pool();

    let user = UserRepository::get_by_id(pool, user_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            fail(
                StatusCode::NOT_FOUND,
                error_codes::NOT_FOUND,
                "User not found",
            )
        })?;

    let (active_investments,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM investments WHERE user_id = $1 AND status = 'Active'",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(internal_error)?;

    let (team_size,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM referrals WHERE referrer_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .map_err(internal_error)?;

    Ok(ok(DashboardStats {
        total_assets: user.total_assets,
        quantitative_assets: user.quantitative_assets,
        profit_assets: user.profit_assets,
        recharge_amount: user.recharge_amount,
        today_earnings: user.today_earnings,
        yesterday_earnings: user.yesterday_earnings,
        commission_today: user.commission_today,
        commission_assets: user.commission_assets,
        active_investments,
        team_size,
    }))
}

/// Submit identity verification: unverified -> pending
///
/// POST /api/verify/submit
#[utoipa::path(
    post,
    path = "/api/verify/submit",
    responses(
        (status = 200, description = "Verification submitted", body = ApiResponse<bool>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn submit_verification(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<bool> {
    let user_id = current_user_id(&claims)?;

    let updated = UserRepository::submit_verification(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?;
    if !updated {
        return Err(fail(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "User not found",
        ));
    }

    Ok(ok(true))
}
