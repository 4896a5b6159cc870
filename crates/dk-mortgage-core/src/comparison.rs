//! Ranked comparison of the same loan across lending institutions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::MortgageError;
use crate::loan::{compute_loan, LoanParams, LoanResult};
use crate::rates::{LoanType, RateSheet};
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    #[default]
    TotalCost,
    /// Year-1 average monthly payment after rentefradrag.
    NetMonthlyPayment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub property_value: Money,
    pub loan_amount: Money,
    pub loan_type: LoanType,
    pub term_years: u32,
    #[serde(default)]
    pub io_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_kurs: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Rate>,
    /// Subset of institutions to compare; every institution in the sheet when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institutions: Option<Vec<String>>,
    #[serde(default)]
    pub rank_by: RankBy,
}

impl ComparisonInput {
    fn params_for(&self, institution: &str) -> LoanParams {
        LoanParams {
            property_value: self.property_value,
            loan_amount: self.loan_amount,
            loan_type: self.loan_type,
            term_years: self.term_years,
            io_years: self.io_years,
            institution: institution.to_string(),
            bond_kurs: self.bond_kurs,
            annual_rate: self.annual_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// 1 = cheapest.
    pub rank: u32,
    pub institution: String,
    pub total_lifetime_cost: Money,
    pub total_bond_interest: Money,
    pub total_contribution_fees: Money,
    pub one_time_costs: Money,
    pub aop: Option<Rate>,
    pub first_month_payment: Money,
    pub net_monthly_payment_year1: Money,
    pub lifetime_tax_saving: Money,
    /// Months for the switch from this offer to the cheapest to pay for
    /// itself. `None` when the cheapest is not cheaper month to month.
    pub switching_breakeven_months: Option<Decimal>,
    /// First month the cumulative cost of this offer and the cheapest swap order.
    pub cost_crossover_month: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferFailure {
    pub institution: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub rows: Vec<ComparisonRow>,
    pub failures: Vec<OfferFailure>,
}

/// A ranked row together with the full analysis it came from.
#[derive(Debug, Clone)]
pub struct RankedOffer {
    pub row: ComparisonRow,
    pub result: LoanResult,
}

fn net_monthly_year1(result: &LoanResult) -> Money {
    result
        .yearly
        .first()
        .filter(|y| y.months > 0)
        .map(|y| round_money(y.net_cost / Decimal::from(y.months)))
        .unwrap_or_default()
}

/// Months needed for the one-time costs of `alternative` to be recovered by
/// its lower month-1 payment versus `current`. Rounded to 1 dp.
pub fn switching_breakeven_months(current: &LoanResult, alternative: &LoanResult) -> Option<Decimal> {
    let saving = current.first_month_payment - alternative.first_month_payment;
    if saving <= Decimal::ZERO {
        return None;
    }
    Some((alternative.one_time_costs.total / saving).round_dp(1))
}

/// Cumulative cost by month. Index 0 holds the one-time costs, index `m` adds
/// every payment up to and including month `m`.
pub fn cumulative_costs(result: &LoanResult) -> Vec<Money> {
    let mut total = result.one_time_costs.total;
    let mut series = Vec::with_capacity(result.schedule.len() + 1);
    series.push(total);
    for row in &result.schedule {
        total += row.total_payment;
        series.push(total);
    }
    series
}

/// First month in which the order of the two cumulative-cost lines reverses.
/// Ties keep the previous order. `None` when the lines never cross.
pub fn cost_crossover_month(a: &LoanResult, b: &LoanResult) -> Option<u32> {
    let ca = cumulative_costs(a);
    let cb = cumulative_costs(b);
    let len = ca.len().max(cb.len());
    let at = |series: &[Money], i: usize| series.get(i).or(series.last()).copied().unwrap_or_default();

    let mut order = Ordering::Equal;
    for i in 0..len {
        let current = at(&ca, i).cmp(&at(&cb, i));
        if current == Ordering::Equal {
            continue;
        }
        if order != Ordering::Equal && current != order {
            return Some(i as u32);
        }
        order = current;
    }
    None
}

fn rank_key(offer: &RankedOffer, rank_by: RankBy) -> Money {
    match rank_by {
        RankBy::TotalCost => offer.row.total_lifetime_cost,
        RankBy::NetMonthlyPayment => offer.row.net_monthly_payment_year1,
    }
}

/// Sort analysed offers ascending by the ranking key and fill in ranks,
/// breakeven and crossover against the cheapest. The sort is stable, so
/// ties keep their input order.
pub fn rank_offers(results: Vec<LoanResult>, rank_by: RankBy) -> Vec<RankedOffer> {
    let mut offers: Vec<RankedOffer> = results
        .into_iter()
        .map(|result| RankedOffer {
            row: ComparisonRow {
                rank: 0,
                institution: result.params.institution.clone(),
                total_lifetime_cost: result.total_cost,
                total_bond_interest: result.total_bond_interest,
                total_contribution_fees: result.total_contribution_fees,
                one_time_costs: result.one_time_costs.total,
                aop: result.aop,
                first_month_payment: result.first_month_payment,
                net_monthly_payment_year1: net_monthly_year1(&result),
                lifetime_tax_saving: result.lifetime_tax_saving,
                switching_breakeven_months: None,
                cost_crossover_month: None,
            },
            result,
        })
        .collect();

    offers.sort_by(|a, b| rank_key(a, rank_by).cmp(&rank_key(b, rank_by)));

    let Some(cheapest) = offers.first().map(|o| o.result.clone()) else {
        return offers;
    };
    for (i, offer) in offers.iter_mut().enumerate() {
        offer.row.rank = i as u32 + 1;
        if i == 0 {
            offer.row.switching_breakeven_months = Some(Decimal::ZERO);
        } else {
            offer.row.switching_breakeven_months = switching_breakeven_months(&offer.result, &cheapest);
            offer.row.cost_crossover_month = cost_crossover_month(&offer.result, &cheapest);
        }
    }
    offers
}

/// Analyse the loan at every requested institution and rank the offers.
pub fn compare_offers(
    input: &ComparisonInput,
    rates: &RateSheet,
) -> MortgageResult<(Vec<RankedOffer>, Vec<OfferFailure>, Vec<String>)> {
    let names = match &input.institutions {
        Some(names) => names.clone(),
        None => rates.institution_names(),
    };
    let Some(first) = names.first() else {
        return Err(MortgageError::invalid("institutions", "At least one institution is required"));
    };

    // Shared parameters are the same for every offer; reject them once.
    input.params_for(first).validate()?;

    let mut results = Vec::with_capacity(names.len());
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    for name in &names {
        match compute_loan(&input.params_for(name), rates) {
            Ok((result, offer_warnings)) => {
                for w in offer_warnings {
                    if !warnings.contains(&w) {
                        warnings.push(w);
                    }
                }
                results.push(result);
            }
            Err(e) => {
                warn!(institution = %name, error = %e, "offer skipped");
                failures.push(OfferFailure {
                    institution: name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if results.is_empty() {
        return Err(MortgageError::invalid("institutions", "No institution produced an offer"));
    }
    if !failures.is_empty() {
        warnings.push(format!("{} institution(s) could not be analysed", failures.len()));
    }

    let ranked = rank_offers(results, input.rank_by);
    debug!(offers = ranked.len(), failures = failures.len(), "offers ranked");
    Ok((ranked, failures, warnings))
}

/// Ranked institution comparison wrapped in the output envelope.
pub fn compare_institutions(
    input: &ComparisonInput,
    rates: &RateSheet,
) -> MortgageResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let (ranked, failures, warnings) = compare_offers(input, rates)?;
    let result = ComparisonOutput {
        rows: ranked.into_iter().map(|o| o.row).collect(),
        failures,
    };
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Per-institution loan analysis ranked ascending; breakeven on month-1 payment, crossover on cumulative cost",
        input,
        warnings,
        elapsed,
        result,
    ))
}
