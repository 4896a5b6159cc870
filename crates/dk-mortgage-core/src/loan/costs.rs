use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::rates::OneTimeCostRates;
use crate::time_value::{effective_annual_rate, solve_periodic_rate};
use crate::types::{round_money, Money, Rate};
use crate::MortgageResult;

/// Starting monthly rate for the ÅOP solve (about 5% a year).
const AOP_GUESS: Rate = dec!(0.004);

/// Costs paid at origination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneTimeCosts {
    /// Land-registry fee: flat part plus a share of the loan.
    pub tinglysning: Money,
    pub establishment_fee: Money,
    /// Spread between bond sell and buy price.
    pub kursskaering: Money,
    /// Shortfall when the bond sells below par: `(100 - kurs)% of the loan`.
    pub kurs_discount: Money,
    pub total: Money,
}

/// One-time costs for a loan. A kurs above par gives no discount (clamped at zero).
pub fn one_time_costs(loan_amount: Money, bond_kurs: Decimal, rates: &OneTimeCostRates) -> OneTimeCosts {
    let tinglysning = round_money(rates.tinglysning_flat + rates.tinglysning_rate * loan_amount);
    let establishment_fee = round_money(rates.establishment_fee);
    let kursskaering = round_money(rates.kursskaering_rate * loan_amount);
    let kurs_discount = round_money(((dec!(100) - bond_kurs) / dec!(100) * loan_amount).max(Decimal::ZERO));

    OneTimeCosts {
        tinglysning,
        establishment_fee,
        kursskaering,
        kurs_discount,
        total: tinglysning + establishment_fee + kursskaering + kurs_discount,
    }
}

/// ÅOP (årlige omkostninger i procent): the effective annual rate at which the
/// borrower's net proceeds equal the present value of every monthly payment.
///
/// One-time costs are deducted from the amount received; the full schedule is
/// repaid. Rounded to 6 dp.
pub fn compute_aop(loan_amount: Money, payments: &[Money], one_time_total: Money) -> MortgageResult<Rate> {
    let net_received = loan_amount - one_time_total;
    if net_received <= Decimal::ZERO {
        return Err(MortgageError::invalid(
            "one_time_costs",
            "One-time costs consume the whole loan; ÅOP is undefined",
        ));
    }

    let monthly = solve_periodic_rate(net_received, payments, AOP_GUESS)?;
    Ok(effective_annual_rate(monthly)?.round_dp(6))
}
