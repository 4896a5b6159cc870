//! Market rate data: bond coupons and kurs per loan type, contribution-fee
//! (bidragssats) tables per institution, one-time origination costs and the
//! rentefradrag rules.
//!
//! The data is configuration, not code. [`RateSheet::default`] carries the
//! February 2026 figures; callers may deserialize a replacement sheet from
//! JSON or TOML and check it with [`RateSheet::validate`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::MortgageError;
use crate::types::{Money, Rate};
use crate::MortgageResult;

/// Age in days after which rate data should be re-checked.
pub const STALE_NOTICE_DAYS: i64 = 30;

/// Age in days after which rate data is considered out of date.
pub const STALE_WARNING_DAYS: i64 = 90;

// ---------------------------------------------------------------------------
// Loan types and LTV brackets
// ---------------------------------------------------------------------------

/// Mortgage bond product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanType {
    /// 30-year fixed-rate annuity bond.
    #[serde(rename = "fixed_30y")]
    Fixed30y,
    /// Adjustable rate, reset every year.
    F1,
    /// Adjustable rate, reset every 3 years.
    F3,
    /// Adjustable rate, reset every 5 years.
    F5,
}

impl LoanType {
    pub const ALL: [LoanType; 4] = [LoanType::Fixed30y, LoanType::F1, LoanType::F3, LoanType::F5];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Fixed30y => "fixed_30y",
            LoanType::F1 => "F1",
            LoanType::F3 => "F3",
            LoanType::F5 => "F5",
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoanType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = LoanType::ALL.iter().map(|t| t.as_str()).collect();
                format!("loan type must be one of {}, got '{s}'", names.join(", "))
            })
    }
}

/// Contribution-fee bracket selected by loan-to-value.
///
/// Boundaries are inclusive on the lower bound: `< 0.40`, `>= 0.40`, `>= 0.60`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LtvBracket {
    #[serde(rename = "0-40")]
    UpTo40,
    #[serde(rename = "40-60")]
    From40To60,
    #[serde(rename = "60-80")]
    From60To80,
}

impl LtvBracket {
    pub fn from_ltv(ltv: Rate) -> Self {
        if ltv >= dec!(0.60) {
            LtvBracket::From60To80
        } else if ltv >= dec!(0.40) {
            LtvBracket::From40To60
        } else {
            LtvBracket::UpTo40
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet entries
// ---------------------------------------------------------------------------

/// Coupon and market price for one loan type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondQuote {
    pub loan_type: LoanType,
    /// Annual coupon rate of the underlying bond.
    pub coupon_rate: Rate,
    /// Bond price as a percentage of face value (100 = par).
    pub kurs: Decimal,
}

/// Annual contribution-fee rates for one LTV bracket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContributionRate {
    /// Annual rate charged on the outstanding balance of an amortizing loan.
    pub annuity: Rate,
    /// Extra annual rate charged during interest-only months.
    pub io_premium: Rate,
}

/// Contribution-fee rates for all brackets of one institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionTable {
    pub up_to_40: ContributionRate,
    pub from_40_to_60: ContributionRate,
    pub from_60_to_80: ContributionRate,
}

impl ContributionTable {
    pub fn for_bracket(&self, bracket: LtvBracket) -> ContributionRate {
        match bracket {
            LtvBracket::UpTo40 => self.up_to_40,
            LtvBracket::From40To60 => self.from_40_to_60,
            LtvBracket::From60To80 => self.from_60_to_80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionRates {
    pub name: String,
    pub contribution: ContributionTable,
}

/// Costs charged once at origination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeCostRates {
    /// Fixed part of the land-registry fee (tinglysningsafgift), DKK.
    pub tinglysning_flat: Money,
    /// Variable part of the land-registry fee, fraction of the loan.
    pub tinglysning_rate: Rate,
    /// Establishment fee, DKK.
    pub establishment_fee: Money,
    /// Bond spread cost (kursskæring), fraction of the loan.
    pub kursskaering_rate: Rate,
}

/// Two-tier Danish interest deduction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestDeductionRules {
    /// Credit rate on annual interest up to the threshold.
    pub low_rate: Rate,
    /// Credit rate on annual interest above the threshold.
    pub high_rate: Rate,
    /// Annual interest threshold, DKK.
    pub threshold: Money,
}

// ---------------------------------------------------------------------------
// Rate sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSheet {
    /// Date the figures were collected.
    pub as_of: NaiveDate,
    /// Fixed EUR/DKK peg.
    pub eur_dkk: Decimal,
    pub bond_quotes: Vec<BondQuote>,
    pub institutions: Vec<InstitutionRates>,
    pub one_time_costs: OneTimeCostRates,
    pub interest_deduction: InterestDeductionRules,
}

fn contribution(annuity: Rate, io_premium: Rate) -> ContributionRate {
    ContributionRate { annuity, io_premium }
}

fn institution(name: &str, brackets: [(Rate, Rate); 3]) -> InstitutionRates {
    let [low, mid, high] = brackets;
    InstitutionRates {
        name: name.to_string(),
        contribution: ContributionTable {
            up_to_40: contribution(low.0, low.1),
            from_40_to_60: contribution(mid.0, mid.1),
            from_60_to_80: contribution(high.0, high.1),
        },
    }
}

impl Default for RateSheet {
    /// Mid-market figures as of 1 February 2026.
    fn default() -> Self {
        RateSheet {
            as_of: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap_or_default(),
            eur_dkk: dec!(7.46),
            bond_quotes: vec![
                BondQuote { loan_type: LoanType::Fixed30y, coupon_rate: dec!(0.0400), kurs: dec!(98.0) },
                BondQuote { loan_type: LoanType::F1, coupon_rate: dec!(0.0233), kurs: dec!(99.5) },
                BondQuote { loan_type: LoanType::F3, coupon_rate: dec!(0.0242), kurs: dec!(99.2) },
                BondQuote { loan_type: LoanType::F5, coupon_rate: dec!(0.0266), kurs: dec!(98.8) },
            ],
            institutions: vec![
                institution(
                    "Totalkredit",
                    [(dec!(0.0040), dec!(0.0004)), (dec!(0.0065), dec!(0.0006)), (dec!(0.0090), dec!(0.0010))],
                ),
                institution(
                    "Nykredit",
                    [(dec!(0.0044), dec!(0.0005)), (dec!(0.0070), dec!(0.0007)), (dec!(0.0095), dec!(0.0011))],
                ),
                institution(
                    "Realkredit Danmark",
                    [(dec!(0.0042), dec!(0.0004)), (dec!(0.0068), dec!(0.0006)), (dec!(0.0092), dec!(0.0010))],
                ),
                institution(
                    "BRFkredit",
                    [(dec!(0.0045), dec!(0.0005)), (dec!(0.0072), dec!(0.0007)), (dec!(0.0097), dec!(0.0012))],
                ),
                institution(
                    "Nordea Kredit",
                    [(dec!(0.0043), dec!(0.0005)), (dec!(0.0069), dec!(0.0007)), (dec!(0.0093), dec!(0.0011))],
                ),
            ],
            one_time_costs: OneTimeCostRates {
                tinglysning_flat: dec!(1_850),
                tinglysning_rate: dec!(0.0145),
                establishment_fee: dec!(5_000),
                kursskaering_rate: dec!(0.0050),
            },
            interest_deduction: InterestDeductionRules {
                low_rate: dec!(0.33),
                high_rate: dec!(0.25),
                threshold: dec!(50_000),
            },
        }
    }
}

impl RateSheet {
    pub fn bond_quote(&self, loan_type: LoanType) -> MortgageResult<&BondQuote> {
        self.bond_quotes
            .iter()
            .find(|q| q.loan_type == loan_type)
            .ok_or_else(|| MortgageError::MissingRate(format!("no bond quote for loan type {loan_type}")))
    }

    /// Looks up an institution by name, ignoring ASCII case and surrounding whitespace.
    pub fn institution(&self, name: &str) -> MortgageResult<&InstitutionRates> {
        let wanted = name.trim();
        self.institutions
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| MortgageError::UnknownInstitution(wanted.to_string()))
    }

    pub fn institution_names(&self) -> Vec<String> {
        self.institutions.iter().map(|i| i.name.clone()).collect()
    }

    /// Effective annual contribution-fee rate for an institution at a given LTV.
    /// During interest-only months the IO premium is added on top.
    pub fn contribution_rate(&self, institution: &str, ltv: Rate, is_io: bool) -> MortgageResult<Rate> {
        let entry = self
            .institution(institution)?
            .contribution
            .for_bracket(LtvBracket::from_ltv(ltv));
        Ok(if is_io {
            entry.annuity + entry.io_premium
        } else {
            entry.annuity
        })
    }

    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.as_of).num_days()
    }

    /// Human-readable notice when the sheet is older than 30 or 90 days.
    pub fn staleness_warning(&self, today: NaiveDate) -> Option<String> {
        let age = self.age_days(today);
        if age > STALE_WARNING_DAYS {
            Some(format!(
                "Rate data is {age} days old (as of {}). Bidragssats and bond rates may have changed; verify with your bank.",
                self.as_of
            ))
        } else if age > STALE_NOTICE_DAYS {
            Some(format!(
                "Rate data is {age} days old (as of {}). Consider verifying current rates.",
                self.as_of
            ))
        } else {
            None
        }
    }

    /// Checks that every rate is a fraction in [0, 1), prices and fees are
    /// positive, and names and loan types are unique.
    pub fn validate(&self) -> MortgageResult<()> {
        if self.eur_dkk <= Decimal::ZERO {
            return Err(MortgageError::invalid("eur_dkk", "Exchange rate must be positive"));
        }
        if self.institutions.is_empty() {
            return Err(MortgageError::invalid("institutions", "At least one institution is required"));
        }

        for (i, quote) in self.bond_quotes.iter().enumerate() {
            check_fraction(&format!("bond_quotes[{i}].coupon_rate"), quote.coupon_rate)?;
            if quote.kurs <= Decimal::ZERO {
                return Err(MortgageError::invalid(
                    &format!("bond_quotes[{i}].kurs"),
                    "Kurs must be positive",
                ));
            }
            if self.bond_quotes[..i].iter().any(|q| q.loan_type == quote.loan_type) {
                return Err(MortgageError::invalid(
                    "bond_quotes",
                    format!("Duplicate quote for loan type {}", quote.loan_type),
                ));
            }
        }

        for (i, inst) in self.institutions.iter().enumerate() {
            if inst.name.trim().is_empty() {
                return Err(MortgageError::invalid(
                    &format!("institutions[{i}].name"),
                    "Institution name cannot be empty",
                ));
            }
            if self.institutions[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&inst.name))
            {
                return Err(MortgageError::invalid(
                    "institutions",
                    format!("Duplicate institution '{}'", inst.name),
                ));
            }
            let table = &inst.contribution;
            for (label, entry) in [
                ("up_to_40", table.up_to_40),
                ("from_40_to_60", table.from_40_to_60),
                ("from_60_to_80", table.from_60_to_80),
            ] {
                check_fraction(&format!("{}.{label}.annuity", inst.name), entry.annuity)?;
                check_fraction(&format!("{}.{label}.io_premium", inst.name), entry.io_premium)?;
            }
        }

        let costs = &self.one_time_costs;
        if costs.tinglysning_flat < Decimal::ZERO || costs.establishment_fee < Decimal::ZERO {
            return Err(MortgageError::invalid("one_time_costs", "Fixed fees cannot be negative"));
        }
        check_fraction("one_time_costs.tinglysning_rate", costs.tinglysning_rate)?;
        check_fraction("one_time_costs.kursskaering_rate", costs.kursskaering_rate)?;

        let deduction = &self.interest_deduction;
        check_fraction("interest_deduction.low_rate", deduction.low_rate)?;
        check_fraction("interest_deduction.high_rate", deduction.high_rate)?;
        if deduction.threshold < Decimal::ZERO {
            return Err(MortgageError::invalid(
                "interest_deduction.threshold",
                "Threshold cannot be negative",
            ));
        }

        Ok(())
    }
}

fn check_fraction(field: &str, value: Rate) -> MortgageResult<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(MortgageError::invalid(
            field,
            format!("Rate must be a decimal fraction in [0, 1), got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ltv_bracket_boundaries() {
        assert_eq!(LtvBracket::from_ltv(dec!(0.39)), LtvBracket::UpTo40);
        assert_eq!(LtvBracket::from_ltv(dec!(0.40)), LtvBracket::From40To60);
        assert_eq!(LtvBracket::from_ltv(dec!(0.59)), LtvBracket::From40To60);
        assert_eq!(LtvBracket::from_ltv(dec!(0.60)), LtvBracket::From60To80);
        assert_eq!(LtvBracket::from_ltv(dec!(0.75)), LtvBracket::From60To80);
        assert_eq!(LtvBracket::from_ltv(dec!(0.80)), LtvBracket::From60To80);
    }

    #[test]
    fn test_default_sheet_is_valid() {
        let sheet = RateSheet::default();
        sheet.validate().unwrap();
        assert_eq!(sheet.institutions.len(), 5);
        assert_eq!(sheet.as_of, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
    }

    #[test]
    fn test_contribution_rate_adds_io_premium() {
        let sheet = RateSheet::default();
        let annuity = sheet.contribution_rate("Totalkredit", dec!(0.75), false).unwrap();
        let io = sheet.contribution_rate("Totalkredit", dec!(0.75), true).unwrap();
        assert_eq!(annuity, dec!(0.0090));
        assert_eq!(io, dec!(0.0100));
    }

    #[test]
    fn test_institution_lookup_ignores_case() {
        let sheet = RateSheet::default();
        assert_eq!(sheet.institution("  nykredit ").unwrap().name, "Nykredit");
        assert!(matches!(
            sheet.institution("Danske Bank"),
            Err(MortgageError::UnknownInstitution(_))
        ));
    }

    #[test]
    fn test_loan_type_parse_and_display() {
        assert_eq!("fixed_30y".parse::<LoanType>().unwrap(), LoanType::Fixed30y);
        assert_eq!("f5".parse::<LoanType>().unwrap(), LoanType::F5);
        assert!("F10".parse::<LoanType>().is_err());
        assert_eq!(LoanType::F3.to_string(), "F3");
    }

    #[test]
    fn test_staleness_thresholds() {
        let sheet = RateSheet::default();
        let fresh = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        let month_old = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let stale = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        assert_eq!(sheet.staleness_warning(fresh), None);
        assert!(sheet.staleness_warning(month_old).unwrap().contains("Consider verifying"));
        assert!(sheet.staleness_warning(stale).unwrap().contains("may have changed"));
    }

    #[test]
    fn test_validate_rejects_percentage_rates() {
        let mut sheet = RateSheet::default();
        sheet.bond_quotes[0].coupon_rate = dec!(4.0);
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_institution() {
        let mut sheet = RateSheet::default();
        let dup = sheet.institutions[0].clone();
        sheet.institutions.push(dup);
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn test_sheet_json_round_trip_preserves_lookup() {
        let json = serde_json::to_string(&RateSheet::default()).unwrap();
        let sheet: RateSheet = serde_json::from_str(&json).unwrap();
        assert_eq!(sheet.bond_quote(LoanType::F1).unwrap().coupon_rate, dec!(0.0233));
    }
}
