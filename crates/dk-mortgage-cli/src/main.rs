mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::comparison::CompareArgs;
use commands::loan::{LoanArgs, ScheduleArgs};
use commands::rates::RatesArgs;
use commands::tax::{CombinedArgs, DeductionArgs, ForeignPropertyArgs};

/// Danish mortgage comparison and tax calculations
#[derive(Parser)]
#[command(
    name = "dkm",
    version,
    about = "Danish mortgage comparison and tax calculations",
    long_about = "A CLI for Danish realkredit loans with decimal precision. Builds \
                  amortization schedules with interest-only periods, computes ÅOP and \
                  rentefradrag, ranks institutions, and models a foreign rental property \
                  under the credit method and the debt ceiling."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Rate sheet file (JSON or TOML); the built-in sheet when absent
    #[arg(long, global = true)]
    rates: Option<String>,

    /// Log debug detail to stderr (DKM_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse one loan: totals, one-time costs, ÅOP, lifetime tax saving
    Analyze(LoanArgs),
    /// Month-by-month amortization schedule
    Schedule(ScheduleArgs),
    /// Loan-year summary with rentefradrag
    Yearly(LoanArgs),
    /// Rank the same loan across institutions
    Compare(CompareArgs),
    /// Foreign rental property P&L, cross-border tax and debt ceiling
    ForeignProperty(ForeignPropertyArgs),
    /// One month of the DK loan after tax, offset by foreign rental income
    Combined(CombinedArgs),
    /// Rentefradrag on a year of bond interest
    Deduction(DeductionArgs),
    /// Show the rate sheet in use
    Rates(RatesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DKM_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Version = cli.command {
        println!("dkm {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> =
        config::load_rates(cli.rates.as_deref()).and_then(|rates| match cli.command {
            Commands::Analyze(args) => commands::loan::run_analyze(args, &rates),
            Commands::Schedule(args) => commands::loan::run_schedule(args, &rates),
            Commands::Yearly(args) => commands::loan::run_yearly(args, &rates),
            Commands::Compare(args) => commands::comparison::run_compare(args, &rates),
            Commands::ForeignProperty(args) => commands::tax::run_foreign_property(args),
            Commands::Combined(args) => commands::tax::run_combined(args, &rates),
            Commands::Deduction(args) => commands::tax::run_deduction(args, &rates),
            Commands::Rates(args) => commands::rates::run_rates(args, &rates),
            Commands::Version => Ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
        });

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
