use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use dk_mortgage_core::comparison::{compare_institutions, ComparisonInput, RankBy};
use dk_mortgage_core::rates::{LoanType, RateSheet};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RankArg {
    /// Lifetime cost including one-time costs
    TotalCost,
    /// Year-1 monthly payment after rentefradrag
    NetMonthly,
}

impl From<RankArg> for RankBy {
    fn from(arg: RankArg) -> Self {
        match arg {
            RankArg::TotalCost => RankBy::TotalCost,
            RankArg::NetMonthly => RankBy::NetMonthlyPayment,
        }
    }
}

/// Arguments for the institution comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Property value, DKK
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Loan amount, DKK
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Loan type: fixed_30y, F1, F3 or F5
    #[arg(long, default_value = "fixed_30y")]
    pub loan_type: LoanType,

    /// Term in years
    #[arg(long, default_value_t = 30)]
    pub term_years: u32,

    /// Interest-only years at the start
    #[arg(long, default_value_t = 0)]
    pub io_years: u32,

    /// Bond kurs override (100 = par)
    #[arg(long)]
    pub bond_kurs: Option<Decimal>,

    /// Annual rate override as a decimal (0.04 = 4%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Comma-separated institutions; all in the rate sheet when absent
    #[arg(long, value_delimiter = ',')]
    pub institutions: Option<Vec<String>>,

    /// Ranking key
    #[arg(long, default_value = "total-cost")]
    pub rank_by: RankArg,
}

pub fn run_compare(args: CompareArgs, rates: &RateSheet) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input: ComparisonInput = if let Some(parsed) = input::read_input(args.input.as_deref())? {
        parsed
    } else {
        ComparisonInput {
            property_value: args
                .property_value
                .ok_or("--property-value is required (or provide --input)")?,
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            loan_type: args.loan_type,
            term_years: args.term_years,
            io_years: args.io_years,
            bond_kurs: args.bond_kurs,
            annual_rate: args.annual_rate,
            institutions: args.institutions,
            rank_by: args.rank_by.into(),
        }
    };

    let result = compare_institutions(&comparison_input, rates)?;
    Ok(serde_json::to_value(result)?)
}
