//! Row types for the account store and the sanitized DTOs exposed by the API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Enumerations (stored as TEXT)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TxType {
    Deposit,
    Withdrawal,
    Profit,
    Commission,
    Bonus,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Deposit => "Deposit",
            TxType::Withdrawal => "Withdrawal",
            TxType::Profit => "Profit",
            TxType::Commission => "Commission",
            TxType::Bonus => "Bonus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "Pending",
            TxStatus::Completed => "Completed",
            TxStatus::Failed => "Failed",
        }
    }
}

/// User roles. Admin is seeded from config at startup.
pub const ROLE_USER: i16 = 0;
pub const ROLE_ADMIN: i16 = 1;

// ============================================================================
// Rows
// ============================================================================

/// One account, including the eight ledger balance fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub password_hash: String,
    pub security_password_hash: String,
    pub invite_code: Option<String>,
    pub referral_code: String,
    pub role: i16,
    pub total_assets: Decimal,
    pub quantitative_assets: Decimal,
    pub profit_assets: Decimal,
    pub recharge_amount: Decimal,
    pub today_earnings: Decimal,
    pub yesterday_earnings: Decimal,
    pub commission_today: Decimal,
    pub commission_assets: Decimal,
    pub last_investment_date: Option<DateTime<Utc>>,
    pub verification_status: String,
    pub verification_submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct InviteCode {
    pub id: i64,
    pub code: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Referral {
    pub id: i64,
    pub referrer_id: i64,
    pub referred_id: i64,
    pub level: String,
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Investment {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub plan: String,
    pub daily_rate: Decimal,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Immutable ledger entry. Only `status` ever changes, via admin review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: Decimal,
    pub status: String,
    pub tx_hash: Option<String>,
    pub network: Option<String>,
    pub address: Option<String>,
    pub fee: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Pending transaction joined with the owner's username, for the admin queue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct PendingTransaction {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// DTOs
// ============================================================================

/// User view with password hashes stripped. Everything user-facing goes
/// through this type.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub telegram: Option<String>,
    pub referral_code: String,
    pub total_assets: Decimal,
    pub quantitative_assets: Decimal,
    pub profit_assets: Decimal,
    pub recharge_amount: Decimal,
    pub today_earnings: Decimal,
    pub yesterday_earnings: Decimal,
    pub commission_today: Decimal,
    pub commission_assets: Decimal,
    pub last_investment_date: Option<DateTime<Utc>>,
    pub verification_status: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            phone: u.phone,
            telegram: u.telegram,
            referral_code: u.referral_code,
            total_assets: u.total_assets,
            quantitative_assets: u.quantitative_assets,
            profit_assets: u.profit_assets,
            recharge_amount: u.recharge_amount,
            today_earnings: u.today_earnings,
            yesterday_earnings: u.yesterday_earnings,
            commission_today: u.commission_today,
            commission_assets: u.commission_assets,
            last_investment_date: u.last_investment_date,
            verification_status: u.verification_status,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_type_strings() {
        assert_eq!(TxType::Deposit.as_str(), "Deposit");
        assert_eq!(TxType::Withdrawal.as_str(), "Withdrawal");
        assert_eq!(TxType::Profit.as_str(), "Profit");
        assert_eq!(TxType::Commission.as_str(), "Commission");
        assert_eq!(TxType::Bonus.as_str(), "Bonus");
    }

    #[test]
    fn test_tx_status_strings() {
        assert_eq!(TxStatus::Pending.as_str(), "Pending");
        assert_eq!(TxStatus::Completed.as_str(), "Completed");
        assert_eq!(TxStatus::Failed.as_str(), "Failed");
    }

    #[test]
    fn test_tx_type_serde_round_trip() {
        let json = serde_json::to_string(&TxType::Deposit).unwrap();
        assert_eq!(json, "\"Deposit\"");
        let parsed: TxType = serde_json::from_str("\"Withdrawal\"").unwrap();
        assert_eq!(parsed, TxType::Withdrawal);
    }
}
