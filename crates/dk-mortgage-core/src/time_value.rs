use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000000001);
const MAX_RATE_ITERATIONS: u32 = 200;

/// `(1 + rate)^n`, failing instead of overflowing for absurd inputs.
pub fn compound_factor(rate: Rate, n: u32) -> MortgageResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(n))
        .ok_or_else(|| MortgageError::invalid("rate", format!("(1 + {rate})^{n} overflows")))
}

/// Level annuity payment that repays `balance` over `periods` at `periodic_rate`.
///
/// `A = B * r / (1 - (1 + r)^-n)`, or `B / n` when the rate is zero.
pub fn annuity_payment(balance: Money, periodic_rate: Rate, periods: u32) -> MortgageResult<Money> {
    if periods == 0 {
        return Err(MortgageError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    if periodic_rate < Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "periodic_rate".into(),
            reason: "Rate cannot be negative".into(),
        });
    }

    if periodic_rate.is_zero() {
        return Ok(balance / Decimal::from(periods));
    }

    let factor = compound_factor(periodic_rate, periods)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(MortgageError::DivisionByZero {
            context: "annuity factor".into(),
        });
    }

    balance
        .checked_mul(periodic_rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| overflow("annuity payment"))
}

fn overflow(context: &str) -> MortgageError {
    MortgageError::invalid("rate", format!("{context} overflows decimal range"))
}

/// Solves for the periodic rate `m` such that
/// `present_value = sum(payment_t / (1 + m)^t)` for t = 1..n, by Newton-Raphson.
pub fn solve_periodic_rate(
    present_value: Money,
    payments: &[Money],
    guess: Rate,
) -> MortgageResult<Rate> {
    if payments.is_empty() {
        return Err(MortgageError::InvalidInput {
            field: "payments".into(),
            reason: "At least one payment is required".into(),
        });
    }
    if present_value <= Decimal::ZERO {
        return Err(MortgageError::InvalidInput {
            field: "present_value".into(),
            reason: "Amount received must be positive".into(),
        });
    }

    let mut rate = guess;
    let mut last_step = Decimal::MAX;

    for i in 0..MAX_RATE_ITERATIONS {
        let discount = Decimal::ONE / (Decimal::ONE + rate);
        let mut factor = Decimal::ONE;
        let mut value = -present_value;
        let mut derivative = Decimal::ZERO;

        for (t, payment) in payments.iter().enumerate() {
            factor = factor.checked_mul(discount).ok_or_else(|| overflow("discount factor"))?;
            let pv = payment.checked_mul(factor).ok_or_else(|| overflow("present value"))?;
            value = value.checked_add(pv).ok_or_else(|| overflow("present value"))?;
            let slope = Decimal::from(t as u64 + 1)
                .checked_mul(pv)
                .and_then(|v| v.checked_mul(discount))
                .ok_or_else(|| overflow("rate derivative"))?;
            derivative = derivative.checked_sub(slope).ok_or_else(|| overflow("rate derivative"))?;
        }

        if derivative.is_zero() {
            return Err(MortgageError::ConvergenceFailure {
                function: "periodic rate".into(),
                iterations: i,
                last_delta: value,
            });
        }

        let step = value / derivative;
        rate -= step;
        last_step = step;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(10.0) {
            rate = dec!(10.0);
        }

        if step.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }
    }

    Err(MortgageError::ConvergenceFailure {
        function: "periodic rate".into(),
        iterations: MAX_RATE_ITERATIONS,
        last_delta: last_step,
    })
}

/// Annualises a monthly rate by compounding: `(1 + m)^12 - 1`.
pub fn effective_annual_rate(monthly_rate: Rate) -> MortgageResult<Rate> {
    Ok(compound_factor(monthly_rate, 12)? - Decimal::ONE)
}
