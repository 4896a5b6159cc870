use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::rates::LoanType;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// Maximum loan-to-value for mortgage-bond financing.
pub const MAX_LTV: Rate = dec!(0.80);

/// Longest term accepted for a schedule.
pub const MAX_TERM_YEARS: u32 = 50;

/// Parameters of one Danish mortgage offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParams {
    /// Market value of the Danish property, DKK.
    pub property_value: Money,
    /// Principal being borrowed, DKK.
    pub loan_amount: Money,
    pub loan_type: LoanType,
    pub term_years: u32,
    /// Interest-only years at the start (0 = pure annuity).
    #[serde(default)]
    pub io_years: u32,
    pub institution: String,
    /// Bond price override; the rate sheet's kurs for the loan type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_kurs: Option<Decimal>,
    /// Annual nominal rate override; the sheet's coupon for the loan type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Rate>,
}

impl LoanParams {
    /// Loan-to-value ratio. Zero when the property value is not positive.
    pub fn ltv(&self) -> Rate {
        if self.property_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.loan_amount / self.property_value
    }

    pub fn term_months(&self) -> u32 {
        self.term_years * 12
    }

    pub fn io_months(&self) -> u32 {
        self.io_years * 12
    }

    pub fn validate(&self) -> MortgageResult<()> {
        if self.property_value <= Decimal::ZERO {
            return Err(MortgageError::invalid(
                "property_value",
                "Property value must be positive",
            ));
        }
        if self.loan_amount <= Decimal::ZERO {
            return Err(MortgageError::invalid(
                "loan_amount",
                "Loan amount must be positive",
            ));
        }
        if self.term_years == 0 {
            return Err(MortgageError::invalid("term_years", "Term must be positive"));
        }
        if self.term_years > MAX_TERM_YEARS {
            return Err(MortgageError::invalid(
                "term_years",
                format!("Term cannot exceed {MAX_TERM_YEARS} years"),
            ));
        }
        if self.io_years >= self.term_years {
            return Err(MortgageError::invalid(
                "io_years",
                "interest-only period must be less than term",
            ));
        }

        let ltv = self.ltv();
        if ltv > MAX_LTV {
            return Err(MortgageError::invalid(
                "loan_amount",
                format!(
                    "loan-to-value exceeds 80% (LTV {}%)",
                    (ltv * dec!(100)).round_dp(1)
                ),
            ));
        }

        if let Some(rate) = self.annual_rate {
            if rate < Decimal::ZERO {
                return Err(MortgageError::invalid("annual_rate", "Rate cannot be negative"));
            }
            if rate >= Decimal::ONE {
                return Err(MortgageError::invalid(
                    "annual_rate",
                    "Rate must be a decimal fraction (0.04 = 4%)",
                ));
            }
        }
        if let Some(kurs) = self.bond_kurs {
            if kurs <= Decimal::ZERO {
                return Err(MortgageError::invalid("bond_kurs", "Kurs must be positive"));
            }
        }

        Ok(())
    }
}
