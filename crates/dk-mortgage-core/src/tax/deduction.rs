//! Danish rentefradrag: a tax credit on bond interest paid.
//!
//! Only bond interest qualifies; the contribution fee does not. The credit is
//! two-tier: the low rate up to the annual threshold, the high rate above it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::MortgageError;
use crate::loan::AmortizationRow;
use crate::rates::InterestDeductionRules;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionInput {
    /// Bond interest paid over one tax year, DKK.
    pub annual_interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionOutput {
    pub annual_interest: Money,
    /// Interest credited at the low rate.
    pub low_portion: Money,
    /// Interest credited at the high rate.
    pub high_portion: Money,
    pub tax_saving: Money,
    /// tax_saving / annual_interest.
    pub effective_rate: Rate,
    /// Interest after the credit.
    pub net_interest_cost: Money,
}

/// Loan-year aggregate of the schedule with the deduction applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    /// Loan year (1-indexed).
    pub year: u32,
    /// Months of the schedule falling in this year.
    pub months: u32,
    pub bond_interest: Money,
    pub contribution_fees: Money,
    pub principal: Money,
    pub total_payment: Money,
    /// Rentefradrag on this year's bond interest.
    pub rentefradrag: Money,
    /// total_payment - rentefradrag.
    pub net_cost: Money,
    pub closing_balance: Money,
}

/// Tax saving for one year of bond interest. Negative interest yields no saving.
pub fn compute_rentefradrag(annual_interest: Money, rules: &InterestDeductionRules) -> Money {
    let interest = annual_interest.max(Decimal::ZERO);
    let low_portion = interest.min(rules.threshold);
    let high_portion = (interest - rules.threshold).max(Decimal::ZERO);
    round_money(low_portion * rules.low_rate + high_portion * rules.high_rate)
}

/// Month-by-month approximation: each month's interest is annualised, run
/// through the annual rule, then divided back by 12. Actual filing is annual.
pub fn monthly_rentefradrag(rows: &[AmortizationRow], rules: &InterestDeductionRules) -> Vec<Money> {
    let twelve = Decimal::from(12);
    rows.iter()
        .map(|row| round_money(compute_rentefradrag(row.bond_interest * twelve, rules) / twelve))
        .collect()
}

pub fn yearly_summary(rows: &[AmortizationRow], rules: &InterestDeductionRules) -> Vec<YearSummary> {
    rows.chunks(12)
        .enumerate()
        .map(|(i, chunk)| {
            let bond_interest: Money = chunk.iter().map(|r| r.bond_interest).sum();
            let contribution_fees: Money = chunk.iter().map(|r| r.contribution_fee).sum();
            let principal: Money = chunk.iter().map(|r| r.principal).sum();
            let total_payment: Money = chunk.iter().map(|r| r.total_payment).sum();
            let rentefradrag = compute_rentefradrag(bond_interest, rules);
            YearSummary {
                year: i as u32 + 1,
                months: chunk.len() as u32,
                bond_interest,
                contribution_fees,
                principal,
                total_payment,
                rentefradrag,
                net_cost: total_payment - rentefradrag,
                closing_balance: chunk.last().map(|r| r.remaining_balance).unwrap_or_default(),
            }
        })
        .collect()
}

/// Rentefradrag breakdown for a single year of interest.
pub fn calculate_rentefradrag(
    input: &DeductionInput,
    rules: &InterestDeductionRules,
) -> MortgageResult<ComputationOutput<DeductionOutput>> {
    let start = Instant::now();

    if input.annual_interest < Decimal::ZERO {
        return Err(MortgageError::invalid(
            "annual_interest",
            "Annual interest cannot be negative",
        ));
    }

    let low_portion = input.annual_interest.min(rules.threshold);
    let high_portion = (input.annual_interest - rules.threshold).max(Decimal::ZERO);
    let tax_saving = compute_rentefradrag(input.annual_interest, rules);
    let effective_rate = if input.annual_interest.is_zero() {
        Decimal::ZERO
    } else {
        tax_saving / input.annual_interest
    };

    let result = DeductionOutput {
        annual_interest: input.annual_interest,
        low_portion,
        high_portion,
        tax_saving,
        effective_rate,
        net_interest_cost: input.annual_interest - tax_saving,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Danish rentefradrag, two-tier credit on annual bond interest",
        rules,
        Vec::new(),
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateSheet;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn rules() -> InterestDeductionRules {
        RateSheet::default().interest_deduction
    }

    fn row(month: u32, bond_interest: Money, principal: Money, remaining: Money) -> AmortizationRow {
        AmortizationRow {
            month,
            opening_balance: remaining + principal,
            bond_interest,
            contribution_fee: dec!(100),
            principal,
            total_payment: bond_interest + principal + dec!(100),
            remaining_balance: remaining,
            interest_only: principal.is_zero(),
        }
    }

    #[test]
    fn test_below_threshold_all_low_rate() {
        assert_eq!(compute_rentefradrag(dec!(30_000), &rules()), dec!(9_900));
    }

    #[test]
    fn test_at_threshold() {
        assert_eq!(compute_rentefradrag(dec!(50_000), &rules()), dec!(16_500));
    }

    #[test]
    fn test_above_threshold_split() {
        // 50,000 * 33% + 30,000 * 25%
        assert_eq!(compute_rentefradrag(dec!(80_000), &rules()), dec!(24_000));
    }

    #[test]
    fn test_negative_interest_gives_nothing() {
        assert_eq!(compute_rentefradrag(dec!(-500), &rules()), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_approximation() {
        let rows = vec![row(1, dec!(10_000), Decimal::ZERO, dec!(3_000_000))];
        // 120,000 annualised: 16,500 + 70,000 * 25% = 34,000 / 12
        assert_eq!(monthly_rentefradrag(&rows, &rules()), vec![dec!(2833.33)]);
    }

    #[test]
    fn test_yearly_summary_chunks_by_twelve() {
        let rows: Vec<AmortizationRow> = (1..=18)
            .map(|m| row(m, dec!(1_000), dec!(500), dec!(100_000) - Decimal::from(m) * dec!(500)))
            .collect();
        let years = yearly_summary(&rows, &rules());

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].months, 12);
        assert_eq!(years[0].bond_interest, dec!(12_000));
        assert_eq!(years[0].rentefradrag, dec!(3_960));
        assert_eq!(years[0].net_cost, years[0].total_payment - dec!(3_960));
        assert_eq!(years[0].closing_balance, dec!(94_000));
        assert_eq!(years[1].months, 6);
        assert_eq!(years[1].closing_balance, dec!(91_000));
    }

    #[test]
    fn test_calculate_rentefradrag_breakdown() {
        let input = DeductionInput {
            annual_interest: dec!(80_000),
        };
        let out = calculate_rentefradrag(&input, &rules()).unwrap();
        let r = &out.result;
        assert_eq!(r.low_portion, dec!(50_000));
        assert_eq!(r.high_portion, dec!(30_000));
        assert_eq!(r.tax_saving, dec!(24_000));
        assert_eq!(r.effective_rate, dec!(0.3));
        assert_eq!(r.net_interest_cost, dec!(56_000));
    }

    #[test]
    fn test_calculate_rentefradrag_negative_rejected() {
        let input = DeductionInput {
            annual_interest: dec!(-1),
        };
        assert!(calculate_rentefradrag(&input, &rules()).is_err());
    }
}
