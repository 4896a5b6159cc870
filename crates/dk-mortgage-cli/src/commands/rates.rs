use chrono::Local;
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use dk_mortgage_core::rates::{InstitutionRates, RateSheet};
use dk_mortgage_core::with_metadata;

/// Arguments for showing the rate sheet
#[derive(Args)]
pub struct RatesArgs {
    /// Show only this institution's contribution rates
    #[arg(long)]
    pub institution: Option<String>,
}

#[derive(Serialize)]
struct SheetView<'a> {
    age_days: i64,
    #[serde(flatten)]
    sheet: &'a RateSheet,
}

pub fn run_rates(args: RatesArgs, rates: &RateSheet) -> Result<Value, Box<dyn std::error::Error>> {
    let today = Local::now().date_naive();
    let warnings: Vec<String> = rates.staleness_warning(today).into_iter().collect();

    if let Some(name) = args.institution {
        let entry: &InstitutionRates = rates.institution(&name)?;
        let out = with_metadata("Contribution-fee table by LTV bracket", &rates.as_of, warnings, 0, entry);
        return Ok(serde_json::to_value(out)?);
    }

    let view = SheetView {
        age_days: rates.age_days(today),
        sheet: rates,
    };
    let out = with_metadata("Rate sheet in use", &rates.as_of, warnings, 0, view);
    Ok(serde_json::to_value(out)?)
}
