//! QuantVest server entry point.
//!
//! Usage:
//!   cargo run -- --env dev
//!   cargo run -- --env prod --port 9090

use std::sync::Arc;

use anyhow::{Context, Result};
use quantvest::config::AppConfig;
use quantvest::db::Database;
use quantvest::gateway::{run_server, state::AppState};
use quantvest::models::ROLE_ADMIN;
use quantvest::referral::ReferralService;
use quantvest::user_auth::AuthService;
use quantvest::users::UserRepository;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

/// Ensure the configured admin account and its welcome invite code exist.
/// Returns the admin's user id.
async fn seed_admin(db: &Database, auth: &AuthService, config: &AppConfig) -> Result<i64> {
    let pool = db.pool();

    let admin_id = match UserRepository::get_by_username(pool, &config.admin.username).await? {
        Some(user) => user.id,
        None => {
            let id = quantvest::user_auth::service::seed_admin_user(
                pool,
                &config.admin.username,
                &config.admin.password,
                &config.admin.security_password,
                ROLE_ADMIN,
            )
            .await?;
            tracing::info!(admin_id = id, username = %config.admin.username, "Admin account seeded");
            id
        }
    };

    // Welcome code: the oldest invite code owned by the admin. Create one if
    // none exists yet so registration is possible on a fresh database.
    let codes = ReferralService::invite_codes_by_creator(pool, admin_id).await?;
    if codes.is_empty() {
        let code = ReferralService::generate_code();
        let invite = ReferralService::create_invite_code(pool, &code, Some(admin_id)).await?;
        tracing::info!(code = %invite.code, "Welcome invite code created");
    }

    // Token issuance is exercised here so a bad jwt_secret fails at startup.
    auth.issue_token(admin_id)
        .context("JWT secret rejected by token encoder")?;

    Ok(admin_id)
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = quantvest::logging::init_logging(&config);

    tracing::info!("Starting QuantVest in {} mode", env);

    let db = Arc::new(
        Database::connect(&config.postgres_url)
            .await
            .context("Failed to connect to PostgreSQL")?,
    );
    db.ensure_schema()
        .await
        .context("Failed to apply database schema")?;
    tracing::info!("Database schema ready");

    let auth = Arc::new(AuthService::new(
        db.pool().clone(),
        config.jwt_secret.clone(),
    ));

    let admin_user_id = seed_admin(&db, &auth, &config).await?;

    let port = get_port_override().unwrap_or(config.gateway.port);
    let state = Arc::new(AppState::new(
        db,
        auth,
        config.rules.clone(),
        admin_user_id,
    ));

    run_server(state, &config.gateway.host, port).await
}
