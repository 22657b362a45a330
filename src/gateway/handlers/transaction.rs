//! Transaction endpoints: deposit and withdrawal requests, history.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use super::{current_user_id, internal_error};
use crate::gateway::state::AppState;
use crate::gateway::types::{Amount, ApiResponse, HandlerResult, created, error_codes, fail, ok};
use crate::ledger::LedgerError;
use crate::models::Transaction;
use crate::recorder::{RecorderError, TransactionRecorder, TxRef};
use crate::user_auth::service::Claims;

pub(crate) fn recorder_error_response(e: RecorderError) -> crate::gateway::types::ApiError {
    match &e {
        RecorderError::MinimumDeposit(_) | RecorderError::MinimumWithdrawal(_) => fail(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION,
            e.to_string(),
        ),
        RecorderError::WithdrawalsClosed => fail(
            StatusCode::BAD_REQUEST,
            error_codes::WITHDRAWALS_CLOSED,
            e.to_string(),
        ),
        RecorderError::InsufficientFunds => fail(
            StatusCode::BAD_REQUEST,
            error_codes::INSUFFICIENT_FUNDS,
            e.to_string(),
        ),
        RecorderError::NotFound => fail(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "Transaction not found",
        ),
        RecorderError::NotPending => fail(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION,
            e.to_string(),
        ),
        RecorderError::Ledger(LedgerError::UserNotFound) => fail(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            "User not found",
        ),
        RecorderError::Database(_) | RecorderError::Ledger(_) => internal_error(e),
    }
}

/// Accepts both "Deposit" and "deposit" spellings from clients.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TxRequestKind {
    #[serde(alias = "Deposit")]
    Deposit,
    #[serde(alias = "Withdrawal")]
    Withdrawal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TxRequestKind,
    #[schema(example = "100.00")]
    pub amount: Amount,
    pub tx_hash: Option<String>,
    #[schema(example = "TRC20")]
    pub network: Option<String>,
    pub address: Option<String>,
    pub fee: Option<Amount>,
}

/// Submit a deposit or withdrawal request for admin review
///
/// POST /api/transactions
#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Request recorded as Pending", body = ApiResponse<Transaction>),
        (status = 400, description = "Below minimum, withdrawals closed, or insufficient funds"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
    Json(req): Json<CreateTransactionRequest>,
) -> HandlerResult<Transaction> {
    let user_id = current_user_id(&claims)?;

    let reference = TxRef {
        tx_hash: req.tx_hash,
        network: req.network,
        address: req.address,
        fee: req.fee.map(|f| f.inner()),
    };

    let result = match req.kind {
        TxRequestKind::Deposit => {
            TransactionRecorder::create_deposit_request(
                state.db.pool(),
                &state.rules,
                user_id,
                req.amount.inner(),
                &reference,
            )
            .await
        }
        TxRequestKind::Withdrawal => {
            TransactionRecorder::create_withdrawal_request(
                state.db.pool(),
                &state.rules,
                user_id,
                req.amount.inner(),
                &reference,
                Utc::now(),
            )
            .await
        }
    };

    match result {
        Ok(txn) => Ok(created(txn)),
        Err(e) => Err(recorder_error_response(e)),
    }
}

/// Transaction history for the current user, newest first
///
/// GET /api/transactions
#[utoipa::path(
    get,
    path = "/api/transactions",
    responses(
        (status = 200, description = "Transaction list", body = ApiResponse<Vec<Transaction>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    axum::Extension(claims): axum::Extension<Claims>,
) -> HandlerResult<Vec<Transaction>> {
    let user_id = current_user_id(&claims)?;

    let txns = TransactionRecorder::list_by_user(state.db.pool(), user_id)
        .await
        .map_err(internal_error)?;
    Ok(ok(txns))
}
