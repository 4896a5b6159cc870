//! Full analysis of a single mortgage offer: schedule, totals, one-time costs
//! and ÅOP.

pub mod amortization;
pub mod costs;
pub mod params;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::rates::{LtvBracket, RateSheet};
use crate::tax::deduction::{yearly_summary, YearSummary};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

pub use amortization::{build_schedule, AmortizationRow, Schedule, ScheduleTerms};
pub use costs::{compute_aop, one_time_costs, OneTimeCosts};
pub use params::{LoanParams, MAX_LTV};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanResult {
    pub params: LoanParams,
    /// Bond rate actually used (override or sheet coupon).
    pub annual_bond_rate: Rate,
    /// Bond kurs actually used (override or sheet kurs).
    pub bond_kurs: Decimal,
    pub ltv: Rate,
    pub ltv_bracket: LtvBracket,
    /// Level interest + principal payment once amortization starts.
    pub annuity_payment: Money,
    /// Total payment in month 1, fee included.
    pub first_month_payment: Money,
    pub schedule: Vec<AmortizationRow>,
    pub yearly: Vec<YearSummary>,
    pub total_bond_interest: Money,
    pub total_contribution_fees: Money,
    /// Equals the loan amount.
    pub total_principal: Money,
    pub one_time_costs: OneTimeCosts,
    /// Interest + fees + principal + one-time costs.
    pub total_cost: Money,
    /// Sum of yearly rentefradrag.
    pub lifetime_tax_saving: Money,
    /// Effective annual cost rate including one-time costs. `None` when the
    /// one-time costs swallow the whole loan.
    pub aop: Option<Rate>,
}

impl LoanResult {
    /// Parts of the total cost, in display order. They sum to `total_cost`.
    pub fn cost_breakdown(&self) -> [(&'static str, Money); 4] {
        [
            ("bond_interest", self.total_bond_interest),
            ("contribution_fees", self.total_contribution_fees),
            ("principal", self.total_principal),
            ("one_time_costs", self.one_time_costs.total),
        ]
    }
}

/// Analyse one offer without the output envelope. Returns the result and any
/// warnings worth surfacing to the user.
pub fn compute_loan(params: &LoanParams, rates: &RateSheet) -> MortgageResult<(LoanResult, Vec<String>)> {
    params.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let quote = rates.bond_quote(params.loan_type)?;
    let annual_bond_rate = params.annual_rate.unwrap_or(quote.coupon_rate);
    let bond_kurs = params.bond_kurs.unwrap_or(quote.kurs);
    if let Some(rate) = params.annual_rate {
        if rate != quote.coupon_rate {
            warnings.push(format!(
                "Annual rate override {rate} used instead of the {} coupon {} from the rate sheet",
                params.loan_type, quote.coupon_rate
            ));
        }
    }

    let ltv = params.ltv();
    let ltv_bracket = LtvBracket::from_ltv(ltv);
    let fee_rate = rates.contribution_rate(&params.institution, ltv, false)?;
    let io_fee_rate = rates.contribution_rate(&params.institution, ltv, true)?;

    let schedule = build_schedule(&ScheduleTerms {
        principal: params.loan_amount,
        annual_rate: annual_bond_rate,
        term_months: params.term_months(),
        io_months: params.io_months(),
        fee_rate,
        io_fee_rate,
    })?;

    let costs = one_time_costs(params.loan_amount, bond_kurs, &rates.one_time_costs);
    if costs.kurs_discount > Decimal::ZERO {
        warnings.push(format!(
            "Bond kurs {bond_kurs} is below par: DKK {} shortfall counted as an upfront cost",
            costs.kurs_discount
        ));
    }
    if params.io_years > 0 {
        warnings.push(format!(
            "Interest-only for {} years: contribution fee includes the IO premium and the payment rises to the annuity in month {}",
            params.io_years,
            params.io_months() + 1
        ));
    }
    if ltv_bracket == LtvBracket::From60To80 {
        warnings.push("LTV of 60% or more falls in the highest contribution-fee bracket".into());
    }

    let total_bond_interest: Money = schedule.rows.iter().map(|r| r.bond_interest).sum();
    let total_contribution_fees: Money = schedule.rows.iter().map(|r| r.contribution_fee).sum();
    let total_principal: Money = schedule.rows.iter().map(|r| r.principal).sum();
    let total_cost = total_bond_interest + total_contribution_fees + total_principal + costs.total;

    let payments: Vec<Money> = schedule.rows.iter().map(|r| r.total_payment).collect();
    let aop = if params.loan_amount > costs.total {
        Some(compute_aop(params.loan_amount, &payments, costs.total)?)
    } else {
        warnings.push(format!(
            "One-time costs of DKK {} are not below the loan amount of DKK {}: ÅOP is undefined",
            costs.total, params.loan_amount
        ));
        None
    };

    let yearly = yearly_summary(&schedule.rows, &rates.interest_deduction);
    let lifetime_tax_saving: Money = yearly.iter().map(|y| y.rentefradrag).sum();
    let first_month_payment = schedule.rows.first().map(|r| r.total_payment).unwrap_or_default();

    debug!(
        institution = %params.institution,
        loan_type = %params.loan_type,
        months = schedule.rows.len(),
        %total_cost,
        aop = ?aop,
        "loan analysed"
    );

    Ok((
        LoanResult {
            params: params.clone(),
            annual_bond_rate,
            bond_kurs,
            ltv,
            ltv_bracket,
            annuity_payment: schedule.annuity_payment,
            first_month_payment,
            schedule: schedule.rows,
            yearly,
            total_bond_interest,
            total_contribution_fees,
            total_principal,
            one_time_costs: costs,
            total_cost,
            lifetime_tax_saving,
            aop,
        },
        warnings,
    ))
}

/// Full loan analysis: schedule, totals, one-time costs, ÅOP.
pub fn analyze_loan(
    params: &LoanParams,
    rates: &RateSheet,
) -> MortgageResult<ComputationOutput<LoanResult>> {
    let start = Instant::now();
    let (result, warnings) = compute_loan(params, rates)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Danish mortgage annuity with interest-only prefix, bidragssats on outstanding balance, ÅOP by Newton-Raphson",
        params,
        warnings,
        elapsed,
        result,
    ))
}
