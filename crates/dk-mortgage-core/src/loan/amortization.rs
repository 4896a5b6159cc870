//! Month-by-month amortization with an optional interest-only prefix.
//!
//! During the first `io_months` only bond interest is paid and the balance is
//! unchanged. From the transition onwards a level annuity, computed once on
//! the balance at that point over the remaining months, repays the loan. The
//! contribution fee (bidragssats) is charged every month on the opening
//! balance and is carried next to, not inside, the annuity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::time_value::annuity_payment;
use crate::types::{round_money, Money, Rate};
use crate::MortgageResult;

/// Inputs of the schedule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleTerms {
    pub principal: Money,
    /// Annual nominal bond rate; the monthly rate is `annual_rate / 12`.
    pub annual_rate: Rate,
    pub term_months: u32,
    pub io_months: u32,
    /// Annual contribution-fee rate while amortizing.
    pub fee_rate: Rate,
    /// Annual contribution-fee rate during interest-only months.
    pub io_fee_rate: Rate,
}

/// One payment period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Month number (1-indexed).
    pub month: u32,
    /// Outstanding principal at the start of the month.
    pub opening_balance: Money,
    /// Bond coupon interest (tax-deductible).
    pub bond_interest: Money,
    /// Contribution fee (not tax-deductible).
    pub contribution_fee: Money,
    /// Principal repaid (0 during interest-only months).
    pub principal: Money,
    /// bond_interest + contribution_fee + principal.
    pub total_payment: Money,
    /// Outstanding principal after the payment.
    pub remaining_balance: Money,
    pub interest_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// Level bond payment (interest + principal) after the interest-only period.
    pub annuity_payment: Money,
    pub rows: Vec<AmortizationRow>,
}

fn validate_terms(terms: &ScheduleTerms) -> MortgageResult<()> {
    if terms.principal <= Decimal::ZERO {
        return Err(MortgageError::invalid("principal", "Principal must be positive"));
    }
    if terms.annual_rate < Decimal::ZERO {
        return Err(MortgageError::invalid("annual_rate", "Rate cannot be negative"));
    }
    if terms.term_months == 0 {
        return Err(MortgageError::invalid("term_months", "Term must be positive"));
    }
    if terms.io_months >= terms.term_months {
        return Err(MortgageError::invalid(
            "io_months",
            "interest-only period must be less than term",
        ));
    }
    if terms.fee_rate < Decimal::ZERO || terms.io_fee_rate < Decimal::ZERO {
        return Err(MortgageError::invalid("fee_rate", "Contribution fee rate cannot be negative"));
    }
    Ok(())
}

/// Builds the full schedule. Money in every row is rounded to øre; the last
/// month repays whatever balance remains, so the schedule always ends at
/// exactly zero and the principal column sums to the original principal.
pub fn build_schedule(terms: &ScheduleTerms) -> MortgageResult<Schedule> {
    validate_terms(terms)?;

    let twelve = Decimal::from(12);
    let monthly_rate = terms.annual_rate / twelve;
    let amortizing_months = terms.term_months - terms.io_months;

    let mut balance = round_money(terms.principal);
    // Balance is untouched during IO, so the transition balance is the principal.
    let annuity = round_money(annuity_payment(balance, monthly_rate, amortizing_months)?);

    let mut rows = Vec::with_capacity(terms.term_months as usize);
    for month in 1..=terms.term_months {
        let interest_only = month <= terms.io_months;
        let fee_rate = if interest_only { terms.io_fee_rate } else { terms.fee_rate };

        let bond_interest = round_money(balance * monthly_rate);
        let contribution_fee = round_money(balance * fee_rate / twelve);

        let principal = if interest_only {
            Decimal::ZERO
        } else if month == terms.term_months {
            balance
        } else {
            (annuity - bond_interest).max(Decimal::ZERO).min(balance)
        };

        let remaining_balance = balance - principal;
        rows.push(AmortizationRow {
            month,
            opening_balance: balance,
            bond_interest,
            contribution_fee,
            principal,
            total_payment: bond_interest + contribution_fee + principal,
            remaining_balance,
            interest_only,
        });
        balance = remaining_balance;
    }

    Ok(Schedule {
        annuity_payment: annuity,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn terms(principal: Money, annual_rate: Rate, years: u32, io_years: u32) -> ScheduleTerms {
        ScheduleTerms {
            principal,
            annual_rate,
            term_months: years * 12,
            io_months: io_years * 12,
            fee_rate: Decimal::ZERO,
            io_fee_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_standard_annuity_2m_4pct_30y() {
        let schedule = build_schedule(&terms(dec!(2_000_000), dec!(0.04), 30, 0)).unwrap();
        // 2,000,000 * r / (1 - (1 + r)^-360), r = 0.04 / 12 = 9,548.3059...
        assert_eq!(schedule.annuity_payment, dec!(9548.31));
        assert_eq!(schedule.rows[0].bond_interest, dec!(6666.67));
        assert_eq!(schedule.rows[0].principal, dec!(2881.64));
    }

    #[test]
    fn test_final_balance_is_zero() {
        for (rate, years, io) in [(dec!(0.04), 30, 0), (dec!(0.0233), 20, 5), (dec!(0.07), 10, 9)] {
            let schedule = build_schedule(&terms(dec!(1_234_567.89), rate, years, io)).unwrap();
            let last = schedule.rows.last().unwrap();
            assert_eq!(last.remaining_balance, Decimal::ZERO);
            assert_eq!(schedule.rows.len() as u32, years * 12);
        }
    }

    #[test]
    fn test_principal_sums_to_original() {
        let schedule = build_schedule(&terms(dec!(3_000_000), dec!(0.04), 30, 5)).unwrap();
        let total: Decimal = schedule.rows.iter().map(|r| r.principal).sum();
        assert_eq!(total, dec!(3_000_000));
    }

    #[test]
    fn test_last_payment_close_to_annuity() {
        let schedule = build_schedule(&terms(dec!(3_000_000), dec!(0.04), 30, 0)).unwrap();
        let last = schedule.rows.last().unwrap();
        let bond_payment = last.bond_interest + last.principal;
        assert!((bond_payment - schedule.annuity_payment).abs() < dec!(5));
    }

    #[test]
    fn test_io_period_keeps_balance_flat() {
        let schedule = build_schedule(&terms(dec!(3_000_000), dec!(0.04), 30, 5)).unwrap();
        for row in &schedule.rows[..60] {
            assert!(row.interest_only);
            assert_eq!(row.principal, Decimal::ZERO);
            assert_eq!(row.bond_interest, dec!(10_000));
            assert_eq!(row.remaining_balance, dec!(3_000_000));
        }
        assert_eq!(schedule.rows[60].opening_balance, dec!(3_000_000));
        assert!(!schedule.rows[60].interest_only);
        assert!(schedule.rows[60].principal > Decimal::ZERO);
    }

    #[test]
    fn test_annuity_recomputed_over_remaining_months() {
        let schedule = build_schedule(&terms(dec!(1_000_000), dec!(0.04), 30, 10)).unwrap();
        let expected = annuity_payment(dec!(1_000_000), dec!(0.04) / dec!(12), 240).unwrap();
        assert_eq!(schedule.annuity_payment, round_money(expected));
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let schedule = build_schedule(&terms(dec!(120_000), Decimal::ZERO, 10, 0)).unwrap();
        assert_eq!(schedule.annuity_payment, dec!(1000));
        assert!(schedule.rows.iter().all(|r| r.bond_interest.is_zero()));
        assert_eq!(schedule.rows.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_contribution_fee_on_opening_balance_with_io_premium() {
        let mut t = terms(dec!(1_200_000), dec!(0.04), 30, 1);
        t.fee_rate = dec!(0.009);
        t.io_fee_rate = dec!(0.010);
        let schedule = build_schedule(&t).unwrap();

        assert_eq!(schedule.rows[0].contribution_fee, dec!(1000));
        assert_eq!(schedule.rows[12].contribution_fee, dec!(900));
        // The fee is outside the annuity.
        let row = &schedule.rows[12];
        assert_eq!(row.bond_interest + row.principal, schedule.annuity_payment);
        assert_eq!(row.total_payment, schedule.annuity_payment + row.contribution_fee);
    }

    #[test]
    fn test_io_not_less_than_term_rejected() {
        assert!(build_schedule(&terms(dec!(100_000), dec!(0.04), 10, 10)).is_err());
        assert!(build_schedule(&terms(dec!(100_000), dec!(0.04), 10, 11)).is_err());
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(build_schedule(&terms(dec!(-100_000), dec!(0.04), 10, 0)).is_err());
        assert!(build_schedule(&terms(dec!(100_000), dec!(-0.04), 10, 0)).is_err());
    }
}
