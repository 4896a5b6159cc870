use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dk_mortgage_core::rates::RateSheet;
use dk_mortgage_core::tax::deduction::{calculate_rentefradrag, DeductionInput};
use dk_mortgage_core::tax::{analyze_combined, analyze_foreign_property, CombinedInput, ForeignPropertyParams};

use crate::input;

/// Arguments for the foreign rental property analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ForeignPropertyArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Property value, foreign currency
    #[arg(long)]
    pub property_value: Option<Decimal>,

    /// Monthly rental income, foreign currency
    #[arg(long)]
    pub rent: Option<Decimal>,

    /// Monthly operating expenses, foreign currency
    #[arg(long, default_value = "0")]
    pub expenses: Decimal,

    /// Outstanding foreign mortgage, foreign currency
    #[arg(long, default_value = "0")]
    pub mortgage_balance: Decimal,

    /// Annual foreign mortgage rate as a decimal
    #[arg(long, default_value = "0")]
    pub mortgage_rate: Decimal,

    /// Effective foreign tax rate on net rent
    #[arg(long, default_value = "0.21")]
    pub foreign_tax_rate: Decimal,

    /// Danish marginal tax rate
    #[arg(long, default_value = "0.42")]
    pub dk_tax_rate: Decimal,

    /// DKK per unit of foreign currency
    #[arg(long, default_value = "7.46")]
    pub fx: Decimal,

    /// Annual gross Danish income for the debt ceiling, DKK
    #[arg(long, default_value = "0")]
    pub income: Decimal,

    /// Debt ceiling as a multiple of gross income
    #[arg(long, default_value = "3.5")]
    pub debt_multiplier: Decimal,
}

/// Arguments for the combined monthly picture (JSON input only)
#[derive(Args)]
pub struct CombinedArgs {
    /// Path to JSON input file: { "loan": {...}, "foreign_property": {...}, "month": 1 }
    #[arg(long)]
    pub input: Option<String>,

    /// Override the month from the input
    #[arg(long)]
    pub month: Option<u32>,
}

/// Arguments for rentefradrag on one year of interest
#[derive(Args)]
pub struct DeductionArgs {
    /// Bond interest paid over the year, DKK
    #[arg(long)]
    pub annual_interest: Decimal,
}

pub fn run_foreign_property(args: ForeignPropertyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: ForeignPropertyParams = if let Some(parsed) = input::read_input(args.input.as_deref())? {
        parsed
    } else {
        ForeignPropertyParams {
            foreign_mortgage_balance: args.mortgage_balance,
            foreign_mortgage_rate: args.mortgage_rate,
            foreign_income_tax_rate: args.foreign_tax_rate,
            dk_marginal_tax_rate: args.dk_tax_rate,
            currency_to_dkk: args.fx,
            annual_gross_income_dkk: args.income,
            debt_ceiling_multiplier: args.debt_multiplier,
            ..ForeignPropertyParams::new(
                args.property_value
                    .ok_or("--property-value is required (or provide --input)")?,
                args.rent.ok_or("--rent is required (or provide --input)")?,
                args.expenses,
            )
        }
    };

    let result = analyze_foreign_property(&params)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_combined(args: CombinedArgs, rates: &RateSheet) -> Result<Value, Box<dyn std::error::Error>> {
    let mut combined: CombinedInput = input::read_input(args.input.as_deref())?
        .ok_or("combined needs JSON input via --input or stdin")?;
    if let Some(month) = args.month {
        combined.month = month;
    }

    let result = analyze_combined(&combined, rates)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_deduction(args: DeductionArgs, rates: &RateSheet) -> Result<Value, Box<dyn std::error::Error>> {
    let result = calculate_rentefradrag(
        &DeductionInput {
            annual_interest: args.annual_interest,
        },
        &rates.interest_deduction,
    )?;
    Ok(serde_json::to_value(result)?)
}
