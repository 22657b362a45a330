//! HTTP gateway: router assembly and server startup.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::user_auth::middleware::{jwt_auth_middleware, require_admin};
use state::AppState;

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Public routes (no auth required)
    // ==========================================================================
    let public_routes = Router::new()
        .route("/api/register", post(crate::user_auth::handlers::register))
        .route("/api/login", post(crate::user_auth::handlers::login))
        .route("/api/welcome-code", get(handlers::referral::welcome_code))
        .route("/api/investment/plans", get(handlers::investment::list_plans))
        .route("/api/health", get(handlers::health::health_check));

    // ==========================================================================
    // User routes - protected by JWT
    // ==========================================================================
    let user_routes = Router::new()
        .route(
            "/api/account",
            get(handlers::account::get_account).patch(handlers::account::update_account),
        )
        .route("/api/profile", get(handlers::account::get_profile))
        .route("/api/dashboard/stats", get(handlers::account::dashboard_stats))
        .route("/api/verify/submit", post(handlers::account::submit_verification))
        .route(
            "/api/verify-security-password",
            post(crate::user_auth::handlers::verify_security_password),
        )
        .route(
            "/api/investment",
            post(handlers::investment::create_investment)
                .get(handlers::investment::list_investments),
        )
        .route(
            "/api/simulate-earnings",
            post(handlers::investment::simulate_earnings),
        )
        .route(
            "/api/transactions",
            post(handlers::transaction::create_transaction)
                .get(handlers::transaction::list_transactions),
        )
        .route("/api/invite-code", post(handlers::referral::create_invite_code))
        .route("/api/invite-codes", get(handlers::referral::list_invite_codes))
        .route("/api/referrals", get(handlers::referral::list_referrals))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    // ==========================================================================
    // Admin routes - JWT plus role check against the users table
    // ==========================================================================
    let admin_routes = Router::new()
        .route(
            "/api/admin/transactions/pending",
            get(handlers::admin::pending_transactions),
        )
        .route(
            "/api/admin/transactions/{id}/approve",
            post(handlers::admin::approve_transaction),
        )
        .route(
            "/api/admin/transactions/{id}/reject",
            post(handlers::admin::reject_transaction),
        )
        // Layer order matters: jwt_auth_middleware is outermost so Claims
        // exist by the time require_admin runs.
        .layer(from_fn_with_state(state.clone(), require_admin))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until shutdown.
pub async fn run_server(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
