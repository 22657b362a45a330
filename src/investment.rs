//! Investment Engine: plan tiers, the 24-hour cooldown, instant profit, and
//! the referral payout on the invested principal.

use crate::config::LedgerRules;
use crate::ledger::{BalanceDelta, Ledger, LedgerError};
use crate::models::{Investment, TxStatus, TxType};
use crate::money;
use crate::recorder::TransactionRecorder;
use crate::referral::ReferralService;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum InvestmentError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("User not found")]
    UserNotFound,

    #[error("Investment amount must be at least ${0}")]
    AmountBelowMinimum(Decimal),

    #[error("Investment plan is required")]
    PlanRequired,

    #[error("Daily rate must be a positive number")]
    InvalidDailyRate,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error(
        "You can only create one investment every 24 hours. Please try again in {} hour{}.",
        .hours,
        if *.hours == 1 { "" } else { "s" }
    )]
    CooldownActive { hours: i64 },
}

impl From<LedgerError> for InvestmentError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Database(err) => InvestmentError::Database(err),
            LedgerError::UserNotFound => InvestmentError::UserNotFound,
        }
    }
}

/// Successful investment: the created row plus the credited instant profit.
#[derive(Debug, Serialize, ToSchema)]
pub struct InvestmentOutcome {
    #[serde(flatten)]
    pub investment: Investment,
    pub instant_profit: Decimal,
}

/// A published plan tier.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvestmentPlan {
    pub id: &'static str,
    pub name: &'static str,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub daily_rate: Decimal,
    pub vip_level: u32,
    pub description: &'static str,
}

/// VIP level from the plan id: "vip3" -> 3. Unknown shapes fall back to 1.
pub fn vip_level(plan: &str) -> u32 {
    plan.strip_prefix("vip")
        .and_then(|rest| rest.parse().ok())
        .unwrap_or(1)
}

/// Instant profit percentage per VIP level. Fixed step table.
pub fn instant_profit_rate(level: u32) -> Decimal {
    match level {
        0 | 1 => Decimal::new(3, 2),  // 3%
        2 | 3 => Decimal::new(4, 2),  // 4%
        4 | 5 => Decimal::new(5, 2),  // 5%
        6 | 7 => Decimal::new(6, 2),  // 6%
        _ => Decimal::new(7, 2),      // 7% for VIP 8+
    }
}

/// Whole hours left on the cooldown, rounded up. None when it has elapsed.
pub fn cooldown_hours_remaining(
    last: DateTime<Utc>,
    now: DateTime<Utc>,
    cooldown_hours: i64,
) -> Option<i64> {
    let elapsed = now - last;
    let remaining = Duration::hours(cooldown_hours) - elapsed;
    let secs = remaining.num_seconds();
    if secs <= 0 {
        return None;
    }
    Some((secs + 3599) / 3600)
}

pub struct InvestmentEngine;

impl InvestmentEngine {
    /// The published plan catalogue.
    pub fn plans() -> Vec<InvestmentPlan> {
        vec![InvestmentPlan {
            id: "vip1",
            name: "VIP 1",
            min_amount: Decimal::new(50, 0),
            max_amount: Decimal::new(500_000, 0),
            daily_rate: Decimal::new(30, 1),
            vip_level: 1,
            description: "Earn 3% daily on your investment with $50 minimum",
        }]
    }

    /// Validate and create one investment. Single transaction: the
    /// investment row, the ledger credit, the Profit record, and the
    /// referral commission all commit together or not at all.
    pub async fn create(
        pool: &PgPool,
        rules: &LedgerRules,
        user_id: i64,
        amount: Decimal,
        plan: &str,
        daily_rate: Decimal,
        now: DateTime<Utc>,
    ) -> Result<InvestmentOutcome, InvestmentError> {
        // Normalize to cents up front so the stored row, the instant profit,
        // and the commission are all derived from the same figure.
        let amount = money::round2(amount);
        if amount < rules.min_investment {
            return Err(InvestmentError::AmountBelowMinimum(rules.min_investment));
        }
        if plan.is_empty() {
            return Err(InvestmentError::PlanRequired);
        }
        if daily_rate <= Decimal::ZERO {
            return Err(InvestmentError::InvalidDailyRate);
        }

        let mut tx = pool.begin().await?;

        let balances = Ledger::lock_balances(&mut *tx, user_id).await?;
        if balances.total_assets < amount {
            return Err(InvestmentError::InsufficientFunds);
        }
        if let Some(last) = balances.last_investment_date {
            if let Some(hours) =
                cooldown_hours_remaining(last, now, rules.investment_cooldown_hours)
            {
                return Err(InvestmentError::CooldownActive { hours });
            }
        }

        let investment: Investment = sqlx::query_as(
            r#"INSERT INTO investments (user_id, amount, plan, daily_rate, status, start_date)
               VALUES ($1, $2, $3, $4, 'Active', $5)
               RETURNING id, user_id, amount, plan, daily_rate, status, start_date, end_date"#,
        )
        .bind(user_id)
        .bind(amount)
        .bind(plan)
        .bind(daily_rate)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let level = vip_level(plan);
        let instant_profit = money::apply_rate(amount, instant_profit_rate(level));

        Ledger::apply(
            &mut *tx,
            user_id,
            &BalanceDelta {
                quantitative_assets: amount,
                total_assets: instant_profit,
                profit_assets: instant_profit,
                today_earnings: instant_profit,
                ..Default::default()
            },
        )
        .await?;
        Ledger::set_last_investment_date(&mut *tx, user_id, now).await?;

        TransactionRecorder::record(
            &mut *tx,
            user_id,
            TxType::Profit,
            instant_profit,
            TxStatus::Completed,
        )
        .await?;

        // Commission is paid on the invested principal, not the profit.
        if let Some(referrer_id) =
            ReferralService::resolve_level1_referrer(&mut *tx, user_id).await?
        {
            ReferralService::pay_commission(
                &mut *tx,
                referrer_id,
                amount,
                rules.referral_commission_rate,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            user_id,
            %amount,
            plan,
            level,
            %instant_profit,
            "investment created"
        );
        Ok(InvestmentOutcome {
            investment,
            instant_profit,
        })
    }

    pub async fn list_by_user(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Vec<Investment>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT id, user_id, amount, plan, daily_rate, status, start_date, end_date
               FROM investments WHERE user_id = $1 ORDER BY start_date DESC"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Daily earnings accrual: rotate today's earnings into yesterday's,
    /// credit each Active investment's daily rate, and narrate the total as
    /// a single Profit transaction.
    pub async fn simulate_earnings(
        pool: &PgPool,
        user_id: i64,
    ) -> Result<Decimal, InvestmentError> {
        let mut tx = pool.begin().await?;

        let balances = Ledger::lock_balances(&mut *tx, user_id).await?;

        let active: Vec<Investment> = sqlx::query_as(
            r#"SELECT id, user_id, amount, plan, daily_rate, status, start_date, end_date
               FROM investments WHERE user_id = $1 AND status = 'Active'"#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut total_earnings = Decimal::ZERO;
        for inv in &active {
            // daily_rate is stored in percent.
            total_earnings += money::apply_rate(inv.amount, inv.daily_rate / Decimal::new(100, 0));
        }

        Ledger::rotate_earnings(&mut *tx, user_id, balances.today_earnings, total_earnings).await?;
        Ledger::apply(
            &mut *tx,
            user_id,
            &BalanceDelta {
                total_assets: total_earnings,
                profit_assets: total_earnings,
                ..Default::default()
            },
        )
        .await?;

        if total_earnings > Decimal::ZERO {
            TransactionRecorder::record(
                &mut *tx,
                user_id,
                TxType::Profit,
                total_earnings,
                TxStatus::Completed,
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!(user_id, %total_earnings, "daily earnings accrued");
        Ok(total_earnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_vip_level_parsing() {
        assert_eq!(vip_level("vip1"), 1);
        assert_eq!(vip_level("vip3"), 3);
        assert_eq!(vip_level("vip12"), 12);
        // Unknown shapes default to level 1.
        assert_eq!(vip_level("premium"), 1);
        assert_eq!(vip_level("vip"), 1);
        assert_eq!(vip_level(""), 1);
    }

    #[test]
    fn test_instant_profit_tier_table() {
        assert_eq!(instant_profit_rate(1), dec("0.03"));
        assert_eq!(instant_profit_rate(2), dec("0.04"));
        assert_eq!(instant_profit_rate(3), dec("0.04"));
        assert_eq!(instant_profit_rate(4), dec("0.05"));
        assert_eq!(instant_profit_rate(5), dec("0.05"));
        assert_eq!(instant_profit_rate(6), dec("0.06"));
        assert_eq!(instant_profit_rate(7), dec("0.06"));
        assert_eq!(instant_profit_rate(8), dec("0.07"));
        assert_eq!(instant_profit_rate(20), dec("0.07"));
    }

    #[test]
    fn test_instant_profit_examples() {
        // $50 in vip1 -> $1.50
        let profit = money::apply_rate(dec("50"), instant_profit_rate(vip_level("vip1")));
        assert_eq!(profit, dec("1.50"));

        // $1000 in vip8 -> $70
        let profit = money::apply_rate(dec("1000"), instant_profit_rate(vip_level("vip8")));
        assert_eq!(profit, dec("70.00"));
    }

    #[test]
    fn test_cooldown_remaining_hours() {
        let last = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        // 10 hours later: 14 hours remain.
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(cooldown_hours_remaining(last, now, 24), Some(14));

        // 23.5 hours later: half an hour rounds up to 1.
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 23, 30, 0).unwrap();
        assert_eq!(cooldown_hours_remaining(last, now, 24), Some(1));

        // Exactly 24 hours: cooldown has elapsed.
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(cooldown_hours_remaining(last, now, 24), None);

        // Well past.
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        assert_eq!(cooldown_hours_remaining(last, now, 24), None);
    }

    #[test]
    fn test_cooldown_message_pluralization() {
        let err = InvestmentError::CooldownActive { hours: 14 };
        assert_eq!(
            err.to_string(),
            "You can only create one investment every 24 hours. Please try again in 14 hours."
        );

        let err = InvestmentError::CooldownActive { hours: 1 };
        assert_eq!(
            err.to_string(),
            "You can only create one investment every 24 hours. Please try again in 1 hour."
        );
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            InvestmentError::AmountBelowMinimum(dec("50")).to_string(),
            "Investment amount must be at least $50"
        );
        assert_eq!(
            InvestmentError::PlanRequired.to_string(),
            "Investment plan is required"
        );
        assert_eq!(
            InvestmentError::InvalidDailyRate.to_string(),
            "Daily rate must be a positive number"
        );
        assert_eq!(
            InvestmentError::InsufficientFunds.to_string(),
            "Insufficient funds"
        );
    }
}
