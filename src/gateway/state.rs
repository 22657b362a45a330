//! Shared application state for the HTTP gateway.

use std::sync::Arc;

use crate::config::LedgerRules;
use crate::db::Database;
use crate::user_auth::service::AuthService;

pub struct AppState {
    pub db: Arc<Database>,
    pub auth: Arc<AuthService>,
    pub rules: LedgerRules,
    /// Seeded administrator account, creator of the welcome invite code.
    pub admin_user_id: i64,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        auth: Arc<AuthService>,
        rules: LedgerRules,
        admin_user_id: i64,
    ) -> Self {
        Self {
            db,
            auth,
            rules,
            admin_user_id,
        }
    }
}
