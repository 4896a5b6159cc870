//! Foreign rental property seen from Denmark.
//!
//! Rental income is taxed first in the source country. Denmark applies the
//! credit method: foreign tax paid is credited against Danish tax on the same
//! income, so only the difference between the Danish marginal rate and the
//! foreign rate is topped up. Nothing is refunded when the foreign rate is
//! higher.
//!
//! The debt ceiling caps total mortgage debt at a multiple of gross income;
//! a foreign mortgage uses up part of that headroom.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::MortgageError;
use crate::types::{round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::MortgageResult;

pub const CROSS_BORDER_TAX_NOTE: &str = "Cross-border rental income, credit method: the \
    property's country taxes the net rental income first. Denmark taxes the same income at \
    your marginal rate but credits the foreign tax already paid, so only the difference \
    (Danish rate minus foreign rate) is payable in Denmark. If the foreign rate is higher, \
    no Danish top-up is due and the excess foreign tax is not refunded. Check the specific \
    double-taxation treaty, which may prescribe the exemption method instead.";

pub const FOREIGN_INTEREST_DISCLAIMER: &str = "Interest on a foreign mortgage is deducted \
    from the foreign taxable base only. Whether it also qualifies for Danish rentefradrag \
    is uncertain and depends on the treaty and on how the loan is secured; it is NOT \
    deducted automatically here. Consult a Danish tax adviser before claiming it.";

fn default_foreign_tax_rate() -> Rate {
    dec!(0.21)
}

fn default_dk_marginal_tax_rate() -> Rate {
    dec!(0.42)
}

fn default_currency_to_dkk() -> Decimal {
    dec!(7.46)
}

fn default_debt_ceiling_multiplier() -> Decimal {
    dec!(3.5)
}

/// Amounts are in the property's currency unless the name says DKK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignPropertyParams {
    pub property_value_foreign: Money,
    pub monthly_rental_income_foreign: Money,
    /// Operating expenses: maintenance, insurance, management.
    pub monthly_expenses_foreign: Money,
    #[serde(default)]
    pub foreign_mortgage_balance: Money,
    /// Annual rate on the foreign mortgage.
    #[serde(default)]
    pub foreign_mortgage_rate: Rate,
    /// Effective foreign tax rate on net rental income.
    #[serde(default = "default_foreign_tax_rate")]
    pub foreign_income_tax_rate: Rate,
    #[serde(default = "default_dk_marginal_tax_rate")]
    pub dk_marginal_tax_rate: Rate,
    /// DKK per unit of foreign currency.
    #[serde(default = "default_currency_to_dkk")]
    pub currency_to_dkk: Decimal,
    /// Annual gross Danish income for the debt ceiling; 0 skips it.
    #[serde(default)]
    pub annual_gross_income_dkk: Money,
    /// Maximum total debt as a multiple of gross income.
    #[serde(default = "default_debt_ceiling_multiplier")]
    pub debt_ceiling_multiplier: Decimal,
}

impl ForeignPropertyParams {
    /// Params with no foreign mortgage, no income and the default rates.
    pub fn new(property_value: Money, monthly_rent: Money, monthly_expenses: Money) -> Self {
        ForeignPropertyParams {
            property_value_foreign: property_value,
            monthly_rental_income_foreign: monthly_rent,
            monthly_expenses_foreign: monthly_expenses,
            foreign_mortgage_balance: Decimal::ZERO,
            foreign_mortgage_rate: Decimal::ZERO,
            foreign_income_tax_rate: default_foreign_tax_rate(),
            dk_marginal_tax_rate: default_dk_marginal_tax_rate(),
            currency_to_dkk: default_currency_to_dkk(),
            annual_gross_income_dkk: Decimal::ZERO,
            debt_ceiling_multiplier: default_debt_ceiling_multiplier(),
        }
    }

    pub fn validate(&self) -> MortgageResult<()> {
        for (field, value) in [
            ("property_value_foreign", self.property_value_foreign),
            ("monthly_rental_income_foreign", self.monthly_rental_income_foreign),
            ("monthly_expenses_foreign", self.monthly_expenses_foreign),
            ("foreign_mortgage_balance", self.foreign_mortgage_balance),
            ("annual_gross_income_dkk", self.annual_gross_income_dkk),
            ("debt_ceiling_multiplier", self.debt_ceiling_multiplier),
        ] {
            if value < Decimal::ZERO {
                return Err(MortgageError::invalid(field, "Value cannot be negative"));
            }
        }
        for (field, value) in [
            ("foreign_mortgage_rate", self.foreign_mortgage_rate),
            ("foreign_income_tax_rate", self.foreign_income_tax_rate),
            ("dk_marginal_tax_rate", self.dk_marginal_tax_rate),
        ] {
            if value < Decimal::ZERO || value >= Decimal::ONE {
                return Err(MortgageError::invalid(
                    field,
                    format!("Rate must be a decimal fraction in [0, 1), got {value}"),
                ));
            }
        }
        if self.currency_to_dkk <= Decimal::ZERO {
            return Err(MortgageError::invalid(
                "currency_to_dkk",
                "Exchange rate must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignPropertyResult {
    pub gross_monthly_foreign: Money,
    pub expenses_monthly_foreign: Money,
    pub foreign_mortgage_interest_foreign: Money,
    /// max(0, rent - expenses - mortgage interest).
    pub taxable_base_foreign: Money,
    pub foreign_tax_monthly_foreign: Money,
    /// Rent after expenses, mortgage interest and foreign tax.
    pub net_monthly_foreign: Money,
    /// Danish tax on the rate difference, credit method.
    pub dk_topup_tax_monthly_dkk: Money,
    /// Net income in DKK after foreign tax and the Danish top-up.
    pub net_monthly_dkk: Money,
    /// Foreign mortgage balance over property value, when the value is known.
    pub foreign_ltv: Option<Rate>,
    pub max_total_debt_dkk: Money,
    pub foreign_mortgage_dkk: Money,
    /// Danish mortgage headroom left under the debt ceiling.
    pub available_dk_debt_dkk: Money,
    pub cross_border_tax_note: String,
    pub deductibility_disclaimer: String,
}

/// DK top-up under the credit method: `max(0, (dk_rate - foreign_rate) * taxable_base)`.
pub fn dk_topup_tax(taxable_base_dkk: Money, dk_rate: Rate, foreign_rate: Rate) -> Money {
    ((dk_rate - foreign_rate) * taxable_base_dkk).max(Decimal::ZERO)
}

/// Headroom for Danish mortgage debt: `max(0, income * multiplier - existing foreign debt)`.
pub fn debt_ceiling_headroom(income: Money, multiplier: Decimal, foreign_debt_dkk: Money) -> Money {
    (income * multiplier - foreign_debt_dkk).max(Decimal::ZERO)
}

pub fn compute_foreign_property(
    params: &ForeignPropertyParams,
) -> MortgageResult<(ForeignPropertyResult, Vec<String>)> {
    params.validate()?;
    let mut warnings: Vec<String> = Vec::new();
    let fx = params.currency_to_dkk;

    let mortgage_interest = if params.foreign_mortgage_balance > Decimal::ZERO {
        round_money(params.foreign_mortgage_balance * params.foreign_mortgage_rate / dec!(12))
    } else {
        Decimal::ZERO
    };

    let operating_net = params.monthly_rental_income_foreign - params.monthly_expenses_foreign - mortgage_interest;
    let taxable_base = operating_net.max(Decimal::ZERO);
    let foreign_tax = round_money(taxable_base * params.foreign_income_tax_rate);
    let net_monthly_foreign = round_money(operating_net - foreign_tax);

    let topup = round_money(dk_topup_tax(
        taxable_base * fx,
        params.dk_marginal_tax_rate,
        params.foreign_income_tax_rate,
    ));
    let net_monthly_dkk = round_money(net_monthly_foreign * fx - topup);

    if params.foreign_income_tax_rate >= params.dk_marginal_tax_rate {
        warnings.push(
            "Foreign tax rate is at or above the Danish marginal rate: no Danish top-up is due and the excess is not refunded"
                .into(),
        );
    }
    if operating_net < Decimal::ZERO {
        warnings.push("Property runs at a monthly loss before tax".into());
    }

    let foreign_ltv = if params.property_value_foreign > Decimal::ZERO {
        Some(params.foreign_mortgage_balance / params.property_value_foreign)
    } else {
        None
    };

    let max_total_debt = round_money(params.annual_gross_income_dkk * params.debt_ceiling_multiplier);
    let foreign_mortgage_dkk = round_money(params.foreign_mortgage_balance * fx);
    let available = debt_ceiling_headroom(
        params.annual_gross_income_dkk,
        params.debt_ceiling_multiplier,
        foreign_mortgage_dkk,
    );
    if params.annual_gross_income_dkk > Decimal::ZERO && foreign_mortgage_dkk > max_total_debt {
        warnings.push(format!(
            "Foreign mortgage (DKK {foreign_mortgage_dkk}) already exceeds the debt ceiling of DKK {max_total_debt}"
        ));
    }

    debug!(%taxable_base, %topup, %net_monthly_dkk, "foreign property analysed");

    Ok((
        ForeignPropertyResult {
            gross_monthly_foreign: params.monthly_rental_income_foreign,
            expenses_monthly_foreign: params.monthly_expenses_foreign,
            foreign_mortgage_interest_foreign: mortgage_interest,
            taxable_base_foreign: taxable_base,
            foreign_tax_monthly_foreign: foreign_tax,
            net_monthly_foreign,
            dk_topup_tax_monthly_dkk: topup,
            net_monthly_dkk,
            foreign_ltv,
            max_total_debt_dkk: max_total_debt,
            foreign_mortgage_dkk,
            available_dk_debt_dkk: round_money(available),
            cross_border_tax_note: CROSS_BORDER_TAX_NOTE.to_string(),
            deductibility_disclaimer: FOREIGN_INTEREST_DISCLAIMER.to_string(),
        },
        warnings,
    ))
}

/// Monthly P&L of a foreign rental property, cross-border tax and debt ceiling.
pub fn analyze_foreign_property(
    params: &ForeignPropertyParams,
) -> MortgageResult<ComputationOutput<ForeignPropertyResult>> {
    let start = Instant::now();
    let (result, warnings) = compute_foreign_property(params)?;
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Foreign rental P&L with credit-method Danish top-up and income-multiple debt ceiling",
        params,
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ForeignPropertyParams {
        ForeignPropertyParams {
            annual_gross_income_dkk: dec!(600_000),
            ..ForeignPropertyParams::new(dec!(250_000), dec!(1_200), dec!(200))
        }
    }

    fn run(params: &ForeignPropertyParams) -> ForeignPropertyResult {
        compute_foreign_property(params).unwrap().0
    }

    #[test]
    fn test_defaults_from_json() {
        let json = r#"{
            "property_value_foreign": "200000",
            "monthly_rental_income_foreign": "1000",
            "monthly_expenses_foreign": "150"
        }"#;
        let params: ForeignPropertyParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.foreign_mortgage_balance, Decimal::ZERO);
        assert_eq!(params.foreign_income_tax_rate, dec!(0.21));
        assert_eq!(params.dk_marginal_tax_rate, dec!(0.42));
        assert_eq!(params.currency_to_dkk, dec!(7.46));
        assert_eq!(params.annual_gross_income_dkk, Decimal::ZERO);
        assert_eq!(params.debt_ceiling_multiplier, dec!(3.5));
    }

    #[test]
    fn test_basic_pl_no_mortgage() {
        let r = run(&sample());
        assert_eq!(r.taxable_base_foreign, dec!(1_000));
        assert_eq!(r.foreign_mortgage_interest_foreign, Decimal::ZERO);
        assert_eq!(r.foreign_tax_monthly_foreign, dec!(210));
        assert_eq!(r.net_monthly_foreign, dec!(790));
    }

    #[test]
    fn test_topup_credit_method() {
        let r = run(&sample());
        // 1,000 * 7.46 * (0.42 - 0.21)
        assert_eq!(r.dk_topup_tax_monthly_dkk, dec!(1566.60));
    }

    #[test]
    fn test_net_dkk_taxed_at_danish_rate_overall() {
        let mut p = sample();
        p.monthly_rental_income_foreign = dec!(1_000);
        p.monthly_expenses_foreign = Decimal::ZERO;
        let r = run(&p);
        // 1,000 * (1 - 0.42) * 7.46
        assert_eq!(r.net_monthly_dkk, dec!(4326.80));
    }

    #[test]
    fn test_foreign_mortgage_interest_reduces_base() {
        let mut p = sample();
        p.foreign_mortgage_balance = dec!(100_000);
        p.foreign_mortgage_rate = dec!(0.03);
        let r = run(&p);
        assert_eq!(r.foreign_mortgage_interest_foreign, dec!(250));
        assert_eq!(r.taxable_base_foreign, dec!(750));
        assert_eq!(r.foreign_ltv, Some(dec!(0.4)));
    }

    #[test]
    fn test_taxable_base_floored_at_zero() {
        let mut p = sample();
        p.monthly_rental_income_foreign = dec!(500);
        p.monthly_expenses_foreign = dec!(400);
        p.foreign_mortgage_balance = dec!(200_000);
        p.foreign_mortgage_rate = dec!(0.06);
        let (r, warnings) = compute_foreign_property(&p).unwrap();
        assert_eq!(r.taxable_base_foreign, Decimal::ZERO);
        assert_eq!(r.foreign_tax_monthly_foreign, Decimal::ZERO);
        assert_eq!(r.dk_topup_tax_monthly_dkk, Decimal::ZERO);
        assert!(r.net_monthly_foreign < Decimal::ZERO);
        assert!(warnings.iter().any(|w| w.contains("loss")));
    }

    #[test]
    fn test_no_topup_when_foreign_rate_higher() {
        let mut p = sample();
        p.foreign_income_tax_rate = dec!(0.45);
        let r = run(&p);
        assert_eq!(r.dk_topup_tax_monthly_dkk, Decimal::ZERO);
    }

    #[test]
    fn test_dk_topup_tax_sign() {
        assert_eq!(dk_topup_tax(dec!(1000), dec!(0.30), dec!(0.30)), Decimal::ZERO);
        assert_eq!(dk_topup_tax(dec!(1000), dec!(0.30), dec!(0.40)), Decimal::ZERO);
        assert!(dk_topup_tax(dec!(1000), dec!(0.40), dec!(0.30)) > Decimal::ZERO);
    }

    #[test]
    fn test_debt_ceiling() {
        let mut p = sample();
        p.foreign_mortgage_balance = dec!(100_000);
        let r = run(&p);
        assert_eq!(r.max_total_debt_dkk, dec!(2_100_000));
        assert_eq!(r.foreign_mortgage_dkk, dec!(746_000));
        assert_eq!(r.available_dk_debt_dkk, dec!(1_354_000));
    }

    #[test]
    fn test_debt_ceiling_floored_at_zero() {
        let mut p = sample();
        p.foreign_mortgage_balance = dec!(500_000);
        p.annual_gross_income_dkk = dec!(100_000);
        let (r, warnings) = compute_foreign_property(&p).unwrap();
        assert_eq!(r.available_dk_debt_dkk, Decimal::ZERO);
        assert!(warnings.iter().any(|w| w.contains("exceeds the debt ceiling")));
    }

    #[test]
    fn test_zero_income_zero_ceiling() {
        let mut p = sample();
        p.annual_gross_income_dkk = Decimal::ZERO;
        let r = run(&p);
        assert_eq!(r.max_total_debt_dkk, Decimal::ZERO);
        assert_eq!(r.available_dk_debt_dkk, Decimal::ZERO);
    }

    #[test]
    fn test_invalid_exchange_rate_rejected() {
        let mut p = sample();
        p.currency_to_dkk = Decimal::ZERO;
        assert!(analyze_foreign_property(&p).is_err());
    }

    #[test]
    fn test_result_carries_notes() {
        let out = analyze_foreign_property(&sample()).unwrap();
        assert_eq!(out.result.cross_border_tax_note, CROSS_BORDER_TAX_NOTE);
        assert!(out.result.deductibility_disclaimer.contains("NOT"));
    }
}
