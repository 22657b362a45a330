//! QuantVest - investment platform backend
//!
//! An account ledger with admin-reviewed deposits and withdrawals, a tiered
//! investment engine with instant profit, and level-1 referral commissions.
//!
//! # Modules
//!
//! - [`config`] - YAML configuration and business rules
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`money`] - Decimal rounding policy
//! - [`models`] - Row types and DTOs
//! - [`ledger`] - Row-locked balance mutations
//! - [`investment`] - Investment engine (plans, cooldown, instant profit)
//! - [`recorder`] - Transaction recorder and admin review queue
//! - [`referral`] - Invite codes, referral edges, commission payout
//! - [`user_auth`] - Registration, login, JWT middleware
//! - [`gateway`] - HTTP API (axum)

pub mod config;
pub mod db;
pub mod gateway;
pub mod investment;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod money;
pub mod recorder;
pub mod referral;
pub mod user_auth;
pub mod users;

// Convenient re-exports at crate root
pub use config::{AppConfig, LedgerRules};
pub use db::Database;
pub use investment::InvestmentEngine;
pub use ledger::{BalanceDelta, Ledger};
pub use recorder::TransactionRecorder;
pub use referral::ReferralService;
pub use user_auth::AuthService;
