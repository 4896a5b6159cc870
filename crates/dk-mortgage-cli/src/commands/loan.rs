use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dk_mortgage_core::loan::{analyze_loan, LoanParams};
use dk_mortgage_core::rates::{LoanType, RateSheet};

use crate::input;

/// Loan parameters shared by the single-loan commands
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanArgs {
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

    /// Lending institution
    #[arg(long, default_value = "Totalkredit")]
    pub institution: String,

    /// Bond kurs override (100 = par)
    #[arg(long)]
    pub bond_kurs: Option<Decimal>,

    /// Annual rate override as a decimal (0.04 = 4%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Only show the first N months
    #[arg(long)]
    pub months: Option<usize>,
}

fn loan_params(args: LoanArgs) -> Result<LoanParams, Box<dyn std::error::Error>> {
    let params: LoanParams = if let Some(parsed) = input::read_input(args.input.as_deref())? {
        parsed
    } else {
        LoanParams {
            property_value: args
                .property_value
                .ok_or("--property-value is required (or provide --input)")?,
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            loan_type: args.loan_type,
            term_years: args.term_years,
            io_years: args.io_years,
            institution: args.institution,
            bond_kurs: args.bond_kurs,
            annual_rate: args.annual_rate,
        }
    };
    Ok(params)
}

/// Replace `result` in the envelope with `f(result)`.
fn map_result(mut value: Value, f: impl FnOnce(Value) -> Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        if let Some(result) = obj.remove("result") {
            obj.insert("result".into(), f(result));
        }
    }
    value
}

pub fn run_analyze(args: LoanArgs, rates: &RateSheet) -> Result<Value, Box<dyn std::error::Error>> {
    let params = loan_params(args)?;
    let result = analyze_loan(&params, rates)?;
    let breakdown: serde_json::Map<String, Value> = result
        .result
        .cost_breakdown()
        .iter()
        .map(|(name, amount)| (name.to_string(), Value::String(amount.to_string())))
        .collect();

    // The full schedule has its own command; keep the summary readable.
    Ok(map_result(serde_json::to_value(result)?, |mut r| {
        if let Some(obj) = r.as_object_mut() {
            obj.remove("schedule");
            obj.remove("yearly");
            obj.remove("params");
            obj.insert("cost_breakdown".into(), Value::Object(breakdown));
        }
        r
    }))
}

pub fn run_schedule(args: ScheduleArgs, rates: &RateSheet) -> Result<Value, Box<dyn std::error::Error>> {
    let limit = args.months;
    let params = loan_params(args.loan)?;
    let result = analyze_loan(&params, rates)?;
    Ok(map_result(serde_json::to_value(result)?, |mut r| {
        match r.get_mut("schedule").map(Value::take) {
            Some(Value::Array(mut rows)) => {
                if let Some(n) = limit {
                    rows.truncate(n);
                }
                Value::Array(rows)
            }
            _ => Value::Array(Vec::new()),
        }
    }))
}

pub fn run_yearly(args: LoanArgs, rates: &RateSheet) -> Result<Value, Box<dyn std::error::Error>> {
    let params = loan_params(args)?;
    let result = analyze_loan(&params, rates)?;
    Ok(map_result(serde_json::to_value(result)?, |mut r| {
        r.get_mut("yearly").map(Value::take).unwrap_or(Value::Array(Vec::new()))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_map_result_replaces_result() {
        let v = json!({ "result": { "a": 1 }, "warnings": [] });
        let out = map_result(v, |_| json!([1, 2]));
        assert_eq!(out["result"], json!([1, 2]));
        assert_eq!(out["warnings"], json!([]));
    }

    #[test]
    fn test_analyze_from_params_drops_schedule() {
        let params = LoanParams {
            property_value: dec!(4_000_000),
            loan_amount: dec!(3_000_000),
            loan_type: LoanType::Fixed30y,
            term_years: 30,
            io_years: 0,
            institution: "Totalkredit".into(),
            bond_kurs: None,
            annual_rate: None,
        };
        let result = analyze_loan(&params, &RateSheet::default()).unwrap();
        let value = map_result(serde_json::to_value(result).unwrap(), |mut r| {
            r.as_object_mut().unwrap().remove("schedule");
            r
        });
        assert!(value["result"].get("schedule").is_none());
        assert!(value["result"].get("aop").is_some());
    }
}
