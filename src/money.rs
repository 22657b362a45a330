//! Monetary arithmetic rules.
//!
//! Every balance field is a `rust_decimal::Decimal` backed by NUMERIC(10,2).
//! Derived amounts (profit, bonus, commission) are rounded to 2 decimal
//! places, half away from zero, at the point of computation so that the
//! stored ledger never accumulates sub-cent residue.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `base * rate`, rounded to cents.
pub fn apply_rate(base: Decimal, rate: Decimal) -> Decimal {
    round2(base * rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("1.004")), dec("1.00"));
        assert_eq!(round2(dec("0.125")), dec("0.13"));
        assert_eq!(round2(dec("10")), dec("10"));
    }

    #[test]
    fn test_apply_rate_commission() {
        // 12% of a $100 deposit
        assert_eq!(apply_rate(dec("100"), dec("0.12")), dec("12.00"));
        // 3% of the $50 minimum investment
        assert_eq!(apply_rate(dec("50"), dec("0.03")), dec("1.50"));
        // 10% first-deposit bonus
        assert_eq!(apply_rate(dec("100"), dec("0.10")), dec("10.00"));
    }

    #[test]
    fn test_apply_rate_rounds_to_cents() {
        // 3% of 50.55 = 1.5165 -> 1.52
        assert_eq!(apply_rate(dec("50.55"), dec("0.03")), dec("1.52"));
        // 12% of 33.33 = 3.9996 -> 4.00
        assert_eq!(apply_rate(dec("33.33"), dec("0.12")), dec("4.00"));
    }

    #[test]
    fn test_accumulation_stays_on_cents() {
        let mut total = Decimal::ZERO;
        for _ in 0..100 {
            total += apply_rate(dec("0.10"), dec("0.03"));
        }
        // 100 * round2(0.003) = 100 * 0.00
        assert_eq!(total, Decimal::ZERO);

        let mut total = Decimal::ZERO;
        for _ in 0..100 {
            total += apply_rate(dec("1.50"), dec("0.03"));
        }
        // 100 * 0.05 (0.045 rounds up)
        assert_eq!(total, dec("5.00"));
    }
}
