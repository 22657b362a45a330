//! Admin review queue: list pending transactions, approve, reject.

use axum::extract::{Path, State};
use std::sync::Arc;

use super::internal_error;
use super::transaction::recorder_error_response;
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, HandlerResult, ok};
use crate::models::{PendingTransaction, Transaction};
use crate::recorder::TransactionRecorder;

/// List all Pending transactions with usernames
///
/// GET /api/admin/transactions/pending
#[utoipa::path(
    get,
    path = "/api/admin/transactions/pending",
    responses(
        (status = 200, description = "Pending transactions", body = ApiResponse<Vec<PendingTransaction>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn pending_transactions(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Vec<PendingTransaction>> {
    let pending = TransactionRecorder::pending_with_usernames(state.db.pool())
        .await
        .map_err(internal_error)?;
    Ok(ok(pending))
}

/// Approve a pending transaction
///
/// POST /api/admin/transactions/{id}/approve
#[utoipa::path(
    post,
    path = "/api/admin/transactions/{id}/approve",
    params(("id" = i64, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction approved", body = ApiResponse<Transaction>),
        (status = 400, description = "Transaction is not pending"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Transaction not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> HandlerResult<Transaction> {
    match TransactionRecorder::approve(state.db.pool(), &state.rules, id).await {
        Ok(txn) => {
            tracing::info!(tx_id = id, tx_type = %txn.tx_type, "transaction approved");
            Ok(ok(txn))
        }
        Err(e) => Err(recorder_error_response(e)),
    }
}

/// Reject a pending transaction
///
/// POST /api/admin/transactions/{id}/reject
#[utoipa::path(
    post,
    path = "/api/admin/transactions/{id}/reject",
    params(("id" = i64, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction rejected", body = ApiResponse<Transaction>),
        (status = 400, description = "Transaction is not pending"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Transaction not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> HandlerResult<Transaction> {
    match TransactionRecorder::reject(state.db.pool(), id).await {
        Ok(txn) => {
            tracing::info!(tx_id = id, tx_type = %txn.tx_type, "transaction rejected");
            Ok(ok(txn))
        }
        Err(e) => Err(recorder_error_response(e)),
    }
}
