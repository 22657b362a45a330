//! Investment endpoints: plan catalogue, creation, listing, earnings accrual.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{current_user_id, internal_error};
use crate::gateway::state::AppState;
use crate::gateway::types::{Amount, ApiResponse, HandlerResult, created, error_codes, fail, ok};
use crate::investment::{InvestmentEngine, InvestmentError, InvestmentOutcome, InvestmentPlan};
use crate::models::Investment;
use crate::user_auth::service::Claims;

fn investment_error_response(e: InvestmentError) -> crate::gateway::types::ApiError {
    match &e {
        InvestmentError::AmountBelowMinimum(_)
        | InvestmentError::PlanRequired
        | InvestmentError::InvalidDailyRate => fail(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION,
            e.to_string(),
        ),
        InvestmentError::InsufficientFunds => fail(
            StatusCode::BAD_REQUEST,
            error_codes::INSUFFICIENT_FUNDS,
            e.to_string(),
        ),
        InvestmentError::CooldownActive { .. } => fail(
            StatusCode::BAD_REQUEST,
            error_codes::COOLDOWN_ACTIVE,
            e.to_string(),
        ),
        InvestmentError::UserNotFound => fail(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "User not found",
        ),
        InvestmentError::Database(_) => internal_error(e),
    }
}

/// List available investment plans
///
/// GET /api/investment/plans
#[utoipa::path(
    get,
    path = "/api/investment/plans",
    responses(
        (status = 200, description = "Plan catalogue", body = ApiResponse<Vec<InvestmentPlan>>)
    ),
    tag = "Investment"
)]
pub async fn list_plans() -> HandlerResult<Vec<InvestmentPlan>> {
    Ok(ok(InvestmentEngine::plans()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvestmentRequest {
    #[schema(example = "100.00")]
    pub amount: Amount,
    #[schema(example = "vip1")]
    pub plan: Option<String>,
    /// Percent per day. Defaults to the plan's published rate.
    #[schema(example = "3.0")]
    #[serde(alias = "dailyRate")]
    pub daily_rate: Option<Amount>,
}

/// Create an investment
///
/// POST /api/investment
#[utoipa::path(
    post,
    path = "/api/investment",
    request_body = CreateInvestmentRequest,
    responses(
        (status = 201, description = "Investment created", body = ApiResponse<InvestmentOutcome>),
        (status = 400, description = "Validation failure, insufficient funds or active cooldown"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Investment"
)]
pub async fn create_investment(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
    Json(req): Json<CreateInvestmentRequest>,
) -> HandlerResult<InvestmentOutcome> {
    let user_id = current_user_id(&claims)?;

    let plan = req.plan.unwrap_or_default();
    let daily_rate = req
        .daily_rate
        .map(|r| r.inner())
        .or_else(|| {
            InvestmentEngine::plans()
                .into_iter()
                .find(|p| p.id == plan)
                .map(|p| p.daily_rate)
        })
        .unwrap_or(Decimal::ZERO);

    match InvestmentEngine::create(
        state.db.pool(),
        &state.rules,
        user_id,
        req.amount.inner(),
        &plan,
        daily_rate,
        Utc::now(),
    )
    .await
    {
        Ok(outcome) => Ok(created(outcome)),
        Err(e) => Err(investment_error_response(e)),
    }
}

/// List the current user's investments, newest first
///
/// GET /api/investment
#[utoipa::path(
    get,
    path = "/api/investment",
    responses(
        (status = 200, description = "Investment list", body = ApiResponse<Vec<Investment>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Investment"
)]
pub async fn list_investments(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<Vec<Investment>> {
    let user_id = current_user_id(&claims)?;

    let investments = InvestmentEngine::list_by_user(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?;
    Ok(ok(investments))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SimulateEarningsResponse {
    #[schema(value_type = String, example = "3.00")]
    pub earnings: Decimal,
}

/// Accrue one day of earnings across the user's active investments
///
/// POST /api/simulate-earnings
#[utoipa::path(
    post,
    path = "/api/simulate-earnings",
    responses(
        (status = 200, description = "Earnings credited", body = ApiResponse<SimulateEarningsResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Investment"
)]
pub async fn simulate_earnings(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<SimulateEarningsResponse> {
    let user_id = current_user_id(&claims)?;

    match InvestmentEngine::simulate_earnings(state.db.pool(), user_id).await {
        Ok(earnings) => Ok(ok(SimulateEarningsResponse { earnings })),
        Err(e) => Err(investment_error_response(e)),
    }
}
