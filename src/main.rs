//! ROSCA Forecast CLI
//!
//! Runs one forecast from a JSON configuration and writes the result tables as CSV.
//!
//! Usage:
//!   rosca-forecast --config forecast.json --slots slots.csv --output-dir out

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rosca_forecast::config::{
    load_slot_matrix, FeeCollectionMode, ForecastConfig, NiiMode, UserModel,
};
use rosca_forecast::reporting::write_forecast;
use rosca_forecast::ForecastEngine;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "rosca-forecast")]
#[command(about = "Cohort-based 60-month forecast for committee savings products")]
struct Args {
    /// JSON configuration; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Slot matrix CSV (duration,slab,slot,fee_pct,blocked,distribution_pct)
    #[arg(long)]
    slots: Option<PathBuf>,

    /// Directory for the CSV tables
    #[arg(long, default_value = "forecast_output")]
    output_dir: PathBuf,

    #[arg(long, value_enum)]
    nii_mode: Option<NiiArg>,

    #[arg(long, value_enum)]
    fee_mode: Option<FeeArg>,

    #[arg(long, value_enum)]
    user_model: Option<UserModelArg>,

    /// Count default processing fees as revenue
    #[arg(long)]
    recognize_default_fees: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NiiArg {
    Approximate,
    Exact,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FeeArg {
    Upfront,
    Monthly,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UserModelArg {
    Simple,
    Tam,
    Lifecycle,
}

fn build_config(args: &Args) -> Result<ForecastConfig> {
    let mut config = match &args.config {
        Some(path) => ForecastConfig::from_json_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ForecastConfig::default(),
    };

    if let Some(path) = &args.slots {
        let rows = load_slot_matrix(path)
            .with_context(|| format!("loading slot matrix from {}", path.display()))?;
        config.product.apply_slot_matrix(&rows);
    }

    if let Some(mode) = args.nii_mode {
        config.engine.nii_mode = match mode {
            NiiArg::Approximate => NiiMode::Approximate30Day,
            NiiArg::Exact => NiiMode::ExactCalendarDays,
        };
    }
    if let Some(mode) = args.fee_mode {
        config.financial.fee_collection = match mode {
            FeeArg::Upfront => FeeCollectionMode::Upfront,
            FeeArg::Monthly => FeeCollectionMode::Monthly,
        };
    }
    if let Some(model) = args.user_model {
        config.engine.user_model = match model {
            UserModelArg::Simple => UserModel::SimpleGrowth,
            UserModelArg::Tam => UserModel::TamHierarchical,
            UserModelArg::Lifecycle => UserModel::CohortLifecycle,
        };
    }
    if args.recognize_default_fees {
        config.engine.recognize_default_fees = true;
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!("ROSCA Forecast v{}", env!("CARGO_PKG_VERSION"));
    println!("=================\n");

    let config = build_config(&args)?;
    println!("Durations: {:?}", config.product.durations);
    println!("Starting users: {}", config.starting_users());
    println!("NII mode: {:?}, fee collection: {:?}", config.engine.nii_mode, config.financial.fee_collection);
    println!();

    let start = Instant::now();
    let output = match ForecastEngine::new(config).run() {
        Ok(output) => output,
        Err(err) if !err.messages().is_empty() => {
            eprintln!("Configuration rejected:");
            for message in err.messages() {
                eprintln!("  - {}", message);
            }
            std::process::exit(2);
        }
        Err(err) => return Err(err).context("running forecast"),
    };
    println!("Forecast complete in {:?} ({} cohorts)\n", start.elapsed(), output.cohorts.len());

    println!(
        "{:>4} {:>12} {:>12} {:>16} {:>14} {:>14} {:>16} {:>9}",
        "Year", "New Users", "Returning", "Commitment", "Fees", "NII", "Gross Profit", "Margin %"
    );
    for y in &output.yearly {
        println!(
            "{:>4} {:>12} {:>12} {:>16.0} {:>14.0} {:>14.0} {:>16.0} {:>9.2}",
            y.year,
            y.new_users,
            y.returning_users,
            y.total_commitment,
            y.fees_collected,
            y.total_nii,
            y.gross_profit,
            y.profit_margin_pct
        );
    }
    println!();

    let written = write_forecast(&args.output_dir, &output)
        .with_context(|| format!("writing tables to {}", args.output_dir.display()))?;
    for path in &written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
