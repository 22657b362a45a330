//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::account::{DashboardStats, ProfileResponse, UpdateAccountRequest};
use crate::gateway::handlers::health::HealthStatus;
use crate::gateway::handlers::investment::{CreateInvestmentRequest, SimulateEarningsResponse};
use crate::gateway::handlers::transaction::CreateTransactionRequest;
use crate::investment::{InvestmentOutcome, InvestmentPlan};
use crate::models::{InviteCode, Investment, PendingTransaction, Transaction, UserProfile};
use crate::referral::ReferralDetail;
use crate::user_auth::handlers::VerifySecurityPasswordRequest;
use crate::user_auth::service::{AuthResponse, LoginRequest, RegisterRequest};

/// JWT bearer authentication security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "QuantVest API",
        version = "1.0.0",
        description = "Investment platform API: account ledger, tiered investment plans, referral commissions, and admin-reviewed deposits and withdrawals.",
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        // Auth
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::user_auth::handlers::verify_security_password,
        // Account
        crate::gateway::handlers::account::get_account,
        crate::gateway::handlers::account::update_account,
        crate::gateway::handlers::account::get_profile,
        crate::gateway::handlers::account::dashboard_stats,
        crate::gateway::handlers::account::submit_verification,
        // Investments
        crate::gateway::handlers::investment::list_plans,
        crate::gateway::handlers::investment::create_investment,
        crate::gateway::handlers::investment::list_investments,
        crate::gateway::handlers::investment::simulate_earnings,
        // Transactions
        crate::gateway::handlers::transaction::create_transaction,
        crate::gateway::handlers::transaction::list_transactions,
        // Referrals
        crate::gateway::handlers::referral::create_invite_code,
        crate::gateway::handlers::referral::list_invite_codes,
        crate::gateway::handlers::referral::list_referrals,
        crate::gateway::handlers::referral::welcome_code,
        // Admin
        crate::gateway::handlers::admin::pending_transactions,
        crate::gateway::handlers::admin::approve_transaction,
        crate::gateway::handlers::admin::reject_transaction,
        // System
        crate::gateway::handlers::health::health_check,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            VerifySecurityPasswordRequest,
            UserProfile,
            UpdateAccountRequest,
            ProfileResponse,
            DashboardStats,
            InvestmentPlan,
            CreateInvestmentRequest,
            InvestmentOutcome,
            Investment,
            SimulateEarningsResponse,
            CreateTransactionRequest,
            Transaction,
            PendingTransaction,
            InviteCode,
            ReferralDetail,
            HealthStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and security password checks"),
        (name = "Account", description = "Account snapshot, profile and dashboard (auth required)"),
        (name = "Investment", description = "Plan catalogue and investment operations"),
        (name = "Transactions", description = "Deposit and withdrawal requests (auth required)"),
        (name = "Referrals", description = "Invite codes and referral lists"),
        (name = "Admin", description = "Pending transaction review (admin role required)"),
        (name = "Health", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "QuantVest API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_json_serializable() {
        let spec = ApiDoc::openapi();
        let json = spec.to_json();
        assert!(json.is_ok());
        assert!(json.unwrap().contains("QuantVest API"));
    }

    #[test]
    fn test_core_endpoints_registered() {
        let spec = ApiDoc::openapi();
        let paths = spec.paths;
        assert!(paths.paths.contains_key("/api/register"));
        assert!(paths.paths.contains_key("/api/login"));
        assert!(paths.paths.contains_key("/api/investment"));
        assert!(paths.paths.contains_key("/api/transactions"));
        assert!(
            paths
                .paths
                .contains_key("/api/admin/transactions/{id}/approve")
        );
        assert!(paths.paths.contains_key("/api/health"));
    }
}
