//! Transaction Recorder: immutable ledger entries, the deposit/withdrawal
//! request entry point, and the admin review queue.
//!
//! Credit policy (one consistent path): deposits are recorded Pending and the
//! balance is credited only when an admin approves. Withdrawals reserve the
//! funds (amount + fee) when the Pending row is created; approval flips the
//! status only, rejection refunds the reservation.

use crate::config::LedgerRules;
use crate::ledger::{BalanceDelta, Ledger, LedgerError};
use crate::models::{PendingTransaction, Transaction, TxStatus, TxType};
use crate::money;
use crate::referral::ReferralService;
use chrono::{DateTime, Datelike, FixedOffset, Utc, Weekday};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Transaction not found")]
    NotFound,

    #[error("Transaction is not pending")]
    NotPending,

    #[error("Minimum deposit amount is ${0}")]
    MinimumDeposit(Decimal),

    #[error("Minimum withdrawal amount is ${0}")]
    MinimumWithdrawal(Decimal),

    #[error("Withdrawals are only allowed on Fridays (Taiwan Time Zone UTC+8)")]
    WithdrawalsClosed,

    #[error("Insufficient funds for withdrawal")]
    InsufficientFunds,
}

/// Optional external reference on a deposit/withdrawal request.
#[derive(Debug, Clone, Default)]
pub struct TxRef {
    pub tx_hash: Option<String>,
    pub network: Option<String>,
    pub address: Option<String>,
    pub fee: Option<Decimal>,
}

/// Withdrawal window: Fridays in UTC+8 (Asia/Taipei).
pub fn withdrawals_open(now_utc: DateTime<Utc>) -> bool {
    let taipei = FixedOffset::east_opt(8 * 3600).expect("fixed UTC+8 offset");
    now_utc.with_timezone(&taipei).weekday() == Weekday::Fri
}

pub struct TransactionRecorder;

impl TransactionRecorder {
    /// Insert an immutable ledger entry with no external reference.
    pub async fn record(
        conn: &mut PgConnection,
        user_id: i64,
        tx_type: TxType,
        amount: Decimal,
        status: TxStatus,
    ) -> Result<Transaction, sqlx::Error> {
        Self::record_with_ref(conn, user_id, tx_type, amount, status, &TxRef::default()).await
    }

    pub async fn record_with_ref(
        conn: &mut PgConnection,
        user_id: i64,
        tx_type: TxType,
        amount: Decimal,
        status: TxStatus,
        reference: &TxRef,
    ) -> Result<Transaction, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO transactions (user_id, type, amount, status, tx_hash, network, address, fee)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id, user_id, type, amount, status, tx_hash, network, address, fee, created_at"#,
        )
        .bind(user_id)
        .bind(tx_type.as_str())
        .bind(amount)
        .bind(status.as_str())
        .bind(&reference.tx_hash)
        .bind(&reference.network)
        .bind(&reference.address)
        .bind(reference.fee)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, user_id, type, amount, status, tx_hash, network, address, fee, created_at
               FROM transactions WHERE user_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Admin queue: Pending rows joined with the owner's username.
    pub async fn pending_with_usernames(
        pool: &PgPool,
    ) -> Result<Vec<PendingTransaction>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT t.id, t.user_id, u.username, t.type, t.amount, t.status, t.created_at
               FROM transactions t
               JOIN users u ON u.id = t.user_id
               WHERE t.status = 'Pending'
               ORDER BY t.created_at ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    /// Record a Pending deposit request. No balance change until approval.
    pub async fn create_deposit_request(
        pool: &PgPool,
        rules: &LedgerRules,
        user_id: i64,
        amount: Decimal,
        reference: &TxRef,
    ) -> Result<Transaction, RecorderError> {
        if amount < rules.min_deposit {
            return Err(RecorderError::MinimumDeposit(rules.min_deposit));
        }

        let mut tx = pool.begin().await?;
        // Existence check doubles as the NotFound guard for the user.
        Ledger::lock_balances(&mut *tx, user_id).await?;
        let row =
            Self::record_with_ref(&mut *tx, user_id, TxType::Deposit, amount, TxStatus::Pending, reference)
                .await?;
        tx.commit().await?;

        tracing::info!(user_id, %amount, tx_id = row.id, "deposit request recorded");
        Ok(row)
    }

    /// Record a Pending withdrawal and reserve amount + fee from totalAssets.
    pub async fn create_withdrawal_request(
        pool: &PgPool,
        rules: &LedgerRules,
        user_id: i64,
        amount: Decimal,
        reference: &TxRef,
        now: DateTime<Utc>,
    ) -> Result<Transaction, RecorderError> {
        if !withdrawals_open(now) {
            return Err(RecorderError::WithdrawalsClosed);
        }
        if amount < rules.min_withdrawal {
            return Err(RecorderError::MinimumWithdrawal(rules.min_withdrawal));
        }

        let fee = reference.fee.unwrap_or(Decimal::ZERO);
        let reserved = amount + fee;

        let mut tx = pool.begin().await?;
        let balances = Ledger::lock_balances(&mut *tx, user_id).await?;
        if balances.total_assets < reserved {
            return Err(RecorderError::InsufficientFunds);
        }

        Ledger::apply(
            &mut *tx,
            user_id,
            &BalanceDelta {
                total_assets: -reserved,
                ..Default::default()
            },
        )
        .await?;

        let row = Self::record_with_ref(
            &mut *tx,
            user_id,
            TxType::Withdrawal,
            amount,
            TxStatus::Pending,
            reference,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(user_id, %amount, %fee, tx_id = row.id, "withdrawal reserved");
        Ok(row)
    }

    /// Admin approval: Pending -> Completed.
    ///
    /// Deposits credit totalAssets and rechargeAmount, pay the 10%
    /// first-deposit bonus when this is the user's first Completed deposit,
    /// and pay the level-1 referral commission on the principal. Withdrawals
    /// were reserved at request time, so only the status changes.
    pub async fn approve(
        pool: &PgPool,
        rules: &LedgerRules,
        tx_id: i64,
    ) -> Result<Transaction, RecorderError> {
        let mut tx = pool.begin().await?;

        let row: Option<Transaction> = sqlx::query_as(
            r#"SELECT id, user_id, type, amount, status, tx_hash, network, address, fee, created_at
               FROM transactions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(tx_id)
        .fetch_optional(&mut *tx)
        .await?;
        let txn = row.ok_or(RecorderError::NotFound)?;

        if txn.status != TxStatus::Pending.as_str() {
            return Err(RecorderError::NotPending);
        }

        let updated: Transaction = sqlx::query_as(
            r#"UPDATE transactions SET status = 'Completed' WHERE id = $1
               RETURNING id, user_id, type, amount, status, tx_hash, network, address, fee, created_at"#,
        )
        .bind(tx_id)
        .fetch_one(&mut *tx)
        .await?;

        if txn.tx_type == TxType::Deposit.as_str() {
            Ledger::lock_balances(&mut *tx, txn.user_id).await?;
            Ledger::apply(
                &mut *tx,
                txn.user_id,
                &BalanceDelta {
                    total_assets: txn.amount,
                    recharge_amount: txn.amount,
                    ..Default::default()
                },
            )
            .await?;

            // First-ever Completed deposit, excluding the row being approved.
            let (prior,): (i64,) = sqlx::query_as(
                r#"SELECT COUNT(*) FROM transactions
                   WHERE user_id = $1 AND type = 'Deposit' AND status = 'Completed' AND id <> $2"#,
            )
            .bind(txn.user_id)
            .bind(tx_id)
            .fetch_one(&mut *tx)
            .await?;

            if prior == 0 {
                let bonus = money::apply_rate(txn.amount, rules.first_deposit_bonus_rate);
                if bonus > Decimal::ZERO {
                    Ledger::apply(
                        &mut *tx,
                        txn.user_id,
                        &BalanceDelta {
                            total_assets: bonus,
                            ..Default::default()
                        },
                    )
                    .await?;
                    Self::record(&mut *tx, txn.user_id, TxType::Bonus, bonus, TxStatus::Completed)
                        .await?;
                    tracing::info!(user_id = txn.user_id, %bonus, "first-deposit bonus credited");
                }
            }

            // Commission on the deposit principal; the bonus is excluded.
            if let Some(referrer_id) =
                ReferralService::resolve_level1_referrer(&mut *tx, txn.user_id).await?
            {
                ReferralService::pay_commission(
                    &mut *tx,
                    referrer_id,
                    txn.amount,
                    rules.referral_commission_rate,
                )
                .await?;
            }
        }

        tx.commit().await?;
        tracing::info!(tx_id, tx_type = %txn.tx_type, "transaction approved");
        Ok(updated)
    }

    /// Admin rejection: Pending -> Failed. Withdrawal reservations are
    /// refunded in full (amount + fee).
    pub async fn reject(pool: &PgPool, tx_id: i64) -> Result<Transaction, RecorderError> {
        let mut tx = pool.begin().await?;

        let row: Option<Transaction> = sqlx::query_as(
            r#"SELECT id, user_id, type, amount, status, tx_hash, network, address, fee, created_at
               FROM transactions WHERE id = $1 FOR UPDATE"#,
        )
        .bind(tx_id)
        .fetch_optional(&mut *tx)
        .await?;
        let txn = row.ok_or(RecorderError::NotFound)?;

        if txn.status != TxStatus::Pending.as_str() {
            return Err(RecorderError::NotPending);
        }

        let updated: Transaction = sqlx::query_as(
            r#"UPDATE transactions SET status = 'Failed' WHERE id = $1
               RETURNING id, user_id, type, amount, status, tx_hash, network, address, fee, created_at"#,
        )
        .bind(tx_id)
        .fetch_one(&mut *tx)
        .await?;

        if txn.tx_type == TxType::Withdrawal.as_str() {
            let refund = txn.amount + txn.fee.unwrap_or(Decimal::ZERO);
            Ledger::lock_balances(&mut *tx, txn.user_id).await?;
            Ledger::apply(
                &mut *tx,
                txn.user_id,
                &BalanceDelta {
                    total_assets: refund,
                    ..Default::default()
                },
            )
            .await?;
            tracing::info!(user_id = txn.user_id, %refund, "withdrawal reservation refunded");
        }

        tx.commit().await?;
        tracing::info!(tx_id, tx_type = %txn.tx_type, "transaction rejected");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_withdrawals_open_on_taipei_friday() {
        // 2025-01-03 was a Friday. 02:00 UTC = 10:00 in Taipei.
        let friday = Utc.with_ymd_and_hms(2025, 1, 3, 2, 0, 0).unwrap();
        assert!(withdrawals_open(friday));
    }

    #[test]
    fn test_withdrawals_closed_midweek() {
        let wednesday = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert!(!withdrawals_open(wednesday));
    }

    #[test]
    fn test_withdrawals_timezone_boundary() {
        // Thursday 17:00 UTC is already Friday 01:00 in Taipei.
        let thursday_late_utc = Utc.with_ymd_and_hms(2025, 1, 2, 17, 0, 0).unwrap();
        assert!(withdrawals_open(thursday_late_utc));

        // Friday 16:30 UTC is already Saturday 00:30 in Taipei.
        let friday_late_utc = Utc.with_ymd_and_hms(2025, 1, 3, 16, 30, 0).unwrap();
        assert!(!withdrawals_open(friday_late_utc));
    }

    #[test]
    fn test_error_messages_match_api_contract() {
        let min_dep = RecorderError::MinimumDeposit(Decimal::new(50, 0));
        assert_eq!(min_dep.to_string(), "Minimum deposit amount is $50");

        let min_wd = RecorderError::MinimumWithdrawal(Decimal::new(3, 0));
        assert_eq!(min_wd.to_string(), "Minimum withdrawal amount is $3");

        assert_eq!(
            RecorderError::WithdrawalsClosed.to_string(),
            "Withdrawals are only allowed on Fridays (Taiwan Time Zone UTC+8)"
        );
        assert_eq!(
            RecorderError::InsufficientFunds.to_string(),
            "Insufficient funds for withdrawal"
        );
    }
}
