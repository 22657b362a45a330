//! Account Ledger: balance reads and atomic delta application.
//!
//! Every mutation runs inside the caller's database transaction. The row is
//! taken with `SELECT ... FOR UPDATE` first, so the read-compute-write
//! sequence is isolated against concurrent requests for the same user.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User not found")]
    UserNotFound,
}

/// Snapshot of the balance fields, read under a row lock.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserBalances {
    pub id: i64,
    pub total_assets: Decimal,
    pub quantitative_assets: Decimal,
    pub profit_assets: Decimal,
    pub recharge_amount: Decimal,
    pub today_earnings: Decimal,
    pub yesterday_earnings: Decimal,
    pub commission_today: Decimal,
    pub commission_assets: Decimal,
    pub last_investment_date: Option<DateTime<Utc>>,
}

/// Signed per-field deltas. Zero fields are still written (as `+ 0`), which
/// keeps the update a single statement over a fixed column list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceDelta {
    pub total_assets: Decimal,
    pub quantitative_assets: Decimal,
    pub profit_assets: Decimal,
    pub recharge_amount: Decimal,
    pub today_earnings: Decimal,
    pub yesterday_earnings: Decimal,
    pub commission_today: Decimal,
    pub commission_assets: Decimal,
}

impl BalanceDelta {
    pub fn is_zero(&self) -> bool {
        *self == BalanceDelta::default()
    }
}

pub struct Ledger;

impl Ledger {
    /// Lock the user's row and return the current balances.
    pub async fn lock_balances(
        conn: &mut PgConnection,
        user_id: i64,
    ) -> Result<UserBalances, LedgerError> {
        let row: Option<UserBalances> = sqlx::query_as(
            r#"SELECT id, total_assets, quantitative_assets, profit_assets, recharge_amount,
                      today_earnings, yesterday_earnings, commission_today, commission_assets,
                      last_investment_date
               FROM users WHERE id = $1
               FOR UPDATE"#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.ok_or(LedgerError::UserNotFound)
    }

    /// Apply all field deltas in one UPDATE. The caller must hold the row
    /// lock from [`Ledger::lock_balances`].
    pub async fn apply(
        conn: &mut PgConnection,
        user_id: i64,
        delta: &BalanceDelta,
    ) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"UPDATE users SET
                   total_assets = total_assets + $2,
                   quantitative_assets = quantitative_assets + $3,
                   profit_assets = profit_assets + $4,
                   recharge_amount = recharge_amount + $5,
                   today_earnings = today_earnings + $6,
                   yesterday_earnings = yesterday_earnings + $7,
                   commission_today = commission_today + $8,
                   commission_assets = commission_assets + $9,
                   updated_at = now()
               WHERE id = $1"#,
        )
        .bind(user_id)
        .bind(delta.total_assets)
        .bind(delta.quantitative_assets)
        .bind(delta.profit_assets)
        .bind(delta.recharge_amount)
        .bind(delta.today_earnings)
        .bind(delta.yesterday_earnings)
        .bind(delta.commission_today)
        .bind(delta.commission_assets)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::UserNotFound);
        }
        Ok(())
    }

    /// Stamp the 24h investment cooldown gate.
    pub async fn set_last_investment_date(
        conn: &mut PgConnection,
        user_id: i64,
        when: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let result =
            sqlx::query("UPDATE users SET last_investment_date = $2, updated_at = now() WHERE id = $1")
                .bind(user_id)
                .bind(when)
                .execute(&mut *conn)
                .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::UserNotFound);
        }
        Ok(())
    }

    /// Rotate today's earnings into yesterday's and set a fresh figure for
    /// today. Used by the daily earnings accrual.
    pub async fn rotate_earnings(
        conn: &mut PgConnection,
        user_id: i64,
        today_was: Decimal,
        today_now: Decimal,
    ) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"UPDATE users SET
                   yesterday_earnings = $2,
                   today_earnings = $3,
                   updated_at = now()
               WHERE id = $1"#,
        )
        .bind(user_id)
        .bind(today_was)
        .bind(today_now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::UserNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_default_is_zero() {
        assert!(BalanceDelta::default().is_zero());
    }

    #[test]
    fn test_delta_with_field_is_not_zero() {
        let delta = BalanceDelta {
            total_assets: Decimal::new(1800, 2),
            ..Default::default()
        };
        assert!(!delta.is_zero());
    }

    #[test]
    fn test_delta_supports_negative_fields() {
        // Withdrawal reserve debits totalAssets at request time.
        let delta = BalanceDelta {
            total_assets: -Decimal::new(500, 2),
            ..Default::default()
        };
        assert!(delta.total_assets.is_sign_negative());
    }
}
