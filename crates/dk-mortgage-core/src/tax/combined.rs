//! One month of the Danish mortgage after rentefradrag, offset by the net
//! income of an optional foreign rental property.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::loan::{compute_loan, LoanParams, LoanResult};
use crate::rates::{InterestDeductionRules, RateSheet};
use crate::tax::deduction::compute_rentefradrag;
use crate::tax::foreign_property::{compute_foreign_property, ForeignPropertyParams, ForeignPropertyResult};
use crate::types::{round_money, with_metadata, ComputationOutput, Money};
use crate::MortgageResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxAdjustedResult {
    /// Schedule month the figures are taken from, after clamping.
    pub month: u32,
    /// Bond interest + contribution fee + principal for that month.
    pub dk_gross_cost: Money,
    pub rentefradrag_saving: Money,
    pub dk_net_cost: Money,
    /// Foreign net rental income in DKK, already after the Danish top-up.
    pub foreign_income_dkk: Money,
    pub dk_topup_tax: Money,
    /// Debt-ceiling room left after this loan; `None` without a foreign
    /// property or without an income figure.
    pub debt_headroom: Option<Money>,
    /// dk_net_cost - foreign_income_dkk. Negative means the rent covers the mortgage.
    pub combined_net: Money,
}

/// Combined picture for `month` (1-indexed). Months outside the schedule are
/// clamped to the first or last month.
pub fn combined_monthly_picture(
    loan: &LoanResult,
    foreign: Option<&ForeignPropertyResult>,
    month: u32,
    rules: &InterestDeductionRules,
) -> TaxAdjustedResult {
    let last = loan.schedule.len() as u32;
    let month = month.clamp(1, last.max(1));
    let (gross, interest) = loan
        .schedule
        .get(month as usize - 1)
        .map(|row| (row.total_payment, row.bond_interest))
        .unwrap_or_default();

    let twelve = Decimal::from(12);
    let saving = round_money(compute_rentefradrag(interest * twelve, rules) / twelve);
    let dk_net_cost = gross - saving;

    let (foreign_income_dkk, dk_topup_tax, debt_headroom) = match foreign {
        Some(fp) => {
            let headroom = (fp.max_total_debt_dkk > Decimal::ZERO)
                .then(|| fp.available_dk_debt_dkk - loan.params.loan_amount);
            (fp.net_monthly_dkk, fp.dk_topup_tax_monthly_dkk, headroom)
        }
        None => (Decimal::ZERO, Decimal::ZERO, None),
    };

    TaxAdjustedResult {
        month,
        dk_gross_cost: gross,
        rentefradrag_saving: saving,
        dk_net_cost,
        foreign_income_dkk,
        dk_topup_tax,
        debt_headroom,
        combined_net: dk_net_cost - foreign_income_dkk,
    }
}

fn default_month() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedInput {
    pub loan: LoanParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_property: Option<ForeignPropertyParams>,
    #[serde(default = "default_month")]
    pub month: u32,
}

/// Analyse the loan and the optional foreign property, then combine one month.
pub fn analyze_combined(
    input: &CombinedInput,
    rates: &RateSheet,
) -> MortgageResult<ComputationOutput<TaxAdjustedResult>> {
    let start = Instant::now();

    let (loan, mut warnings) = compute_loan(&input.loan, rates)?;
    let foreign = match &input.foreign_property {
        Some(params) => {
            let (fp, fp_warnings) = compute_foreign_property(params)?;
            warnings.extend(fp_warnings);
            Some(fp)
        }
        None => None,
    };

    let result = combined_monthly_picture(&loan, foreign.as_ref(), input.month, &rates.interest_deduction);
    if result.month != input.month {
        warnings.push(format!(
            "Month {} is outside the schedule; showing month {}",
            input.month, result.month
        ));
    }
    if let Some(headroom) = result.debt_headroom {
        if headroom < Decimal::ZERO {
            warnings.push(format!(
                "Danish loan exceeds the debt-ceiling room by DKK {}",
                headroom.abs()
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly DK mortgage cost net of annualised rentefradrag, offset by foreign rental income after credit-method tax",
        input,
        warnings,
        elapsed,
        result,
    ))
}
