//! Referral Accounting: invite codes, referral edges, and commission payout.
//!
//! The `referrals` table is the single source of truth for commission
//! attribution. The invite-code creator is consulted exactly once, at
//! registration, to create the level-1 edge; payouts never re-derive the
//! referrer from the code.

use crate::ledger::{BalanceDelta, Ledger, LedgerError};
use crate::models::{InviteCode, Referral, TxStatus, TxType};
use crate::money;
use crate::recorder::TransactionRecorder;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use utoipa::ToSchema;

/// One referred user, joined with their username for display.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReferralDetail {
    pub referred_id: i64,
    pub username: String,
    pub level: String,
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Codes avoid 0/O/1/I to survive being read aloud.
const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;

pub struct ReferralService;

impl ReferralService {
    /// Random 6-character code, used for both invite codes and referral codes.
    pub fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LEN)
            .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
            .collect()
    }

    pub async fn create_invite_code(
        pool: &PgPool,
        code: &str,
        created_by: Option<i64>,
    ) -> Result<InviteCode, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO invite_codes (code, created_by) VALUES ($1, $2)
               RETURNING id, code, created_by, created_at"#,
        )
        .bind(code)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn get_invite_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<InviteCode>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, code, created_by, created_at FROM invite_codes WHERE code = $1"#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    pub async fn invite_codes_by_creator(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<InviteCode>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, code, created_by, created_at FROM invite_codes
               WHERE created_by = $1 ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Record the level-1 edge at registration. `commission` stores the
    /// payout rate in percent.
    pub async fn create_edge(
        conn: &mut PgConnection,
        referrer_id: i64,
        referred_id: i64,
        rate_percent: Decimal,
    ) -> Result<Referral, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO referrals (referrer_id, referred_id, level, commission)
               VALUES ($1, $2, '1', $3)
               RETURNING id, referrer_id, referred_id, level, commission, created_at"#,
        )
        .bind(referrer_id)
        .bind(referred_id)
        .bind(rate_percent)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn referrals_by_referrer(
        pool: &PgPool,
        referrer_id: i64,
    ) -> Result<Vec<Referral>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, referrer_id, referred_id, level, commission, created_at
               FROM referrals WHERE referrer_id = $1 ORDER BY created_at DESC"#,
        )
        .bind(referrer_id)
        .fetch_all(pool)
        .await
    }

    /// Referral list with usernames for display, newest first.
    pub async fn referral_details(
        pool: &PgPool,
        referrer_id: i64,
    ) -> Result<Vec<ReferralDetail>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT r.referred_id, u.username, r.level, r.commission, r.created_at
               FROM referrals r
               JOIN users u ON u.id = r.referred_id
               WHERE r.referrer_id = $1
               ORDER BY r.created_at DESC"#,
        )
        .bind(referrer_id)
        .fetch_all(pool)
        .await
    }

    /// The direct (level-1) referrer, if any. Level-2+ ancestors are never
    /// returned.
    pub async fn resolve_level1_referrer(
        conn: &mut PgConnection,
        user_id: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"SELECT referrer_id FROM referrals
               WHERE referred_id = $1 AND level = '1'
               ORDER BY created_at ASC LIMIT 1"#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|(id,)| id))
    }

    /// Credit `base * rate` to the referrer and record a Commission
    /// transaction. Runs inside the caller's transaction. Returns the paid
    /// amount, or None when it rounds to zero.
    pub async fn pay_commission(
        conn: &mut PgConnection,
        referrer_id: i64,
        base: Decimal,
        rate: Decimal,
    ) -> Result<Option<Decimal>, LedgerError> {
        let amount = money::apply_rate(base, rate);
        if amount <= Decimal::ZERO {
            return Ok(None);
        }

        Ledger::lock_balances(&mut *conn, referrer_id).await?;
        Ledger::apply(
            &mut *conn,
            referrer_id,
            &BalanceDelta {
                total_assets: amount,
                commission_assets: amount,
                commission_today: amount,
                ..Default::default()
            },
        )
        .await?;

        TransactionRecorder::record(
            &mut *conn,
            referrer_id,
            TxType::Commission,
            amount,
            TxStatus::Completed,
        )
        .await?;

        tracing::info!(
            referrer_id,
            %amount,
            "referral commission credited"
        );
        Ok(Some(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        for _ in 0..50 {
            let code = ReferralService::generate_code();
            assert_eq!(code.len(), CODE_LEN);
            assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_generate_code_varies() {
        let a = ReferralService::generate_code();
        let codes: Vec<String> = (0..20).map(|_| ReferralService::generate_code()).collect();
        // 21 identical draws from a 32^6 space would mean a broken RNG.
        assert!(codes.iter().any(|c| c != &a) || codes.is_empty());
    }
}
