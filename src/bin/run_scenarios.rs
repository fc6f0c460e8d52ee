//! Run a base forecast plus default-rate and growth sensitivities in parallel
//!
//! Writes one comparison row per scenario to a CSV file.
//!
//! Usage:
//!   run_scenarios --config forecast.json --output scenario_comparison.csv

use anyhow::{Context, Result};
use clap::Parser;
use rosca_forecast::reporting::{export::write_table_to_path, ScenarioComparisonRow};
use rosca_forecast::{ForecastConfig, ScenarioRunner};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "run_scenarios")]
#[command(about = "Default-rate and growth sensitivities for a ROSCA forecast")]
struct Args {
    /// JSON configuration for the base scenario; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comparison CSV to write
    #[arg(long, default_value = "scenario_comparison.csv")]
    output: PathBuf,

    /// Default rates (%) to test
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.5, 1.0, 2.0, 5.0])]
    default_rates: Vec<f64>,

    /// Monthly growth rates (%) to test
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.0, 2.0, 5.0])]
    growth_rates: Vec<f64>,
}

fn print_comparison(rows: &[ScenarioComparisonRow]) {
    println!(
        "{:<28} {:>8} {:>16} {:>14} {:>14} {:>16} {:>9}",
        "Scenario", "Cohorts", "Revenue", "NII", "Net Loss", "Gross Profit", "Margin %"
    );
    for row in rows {
        println!(
            "{:<28} {:>8} {:>16.0} {:>14.0} {:>14.0} {:>16.0} {:>9.2}",
            row.scenario,
            row.cohorts,
            row.total_revenue,
            row.total_nii,
            row.net_default_loss,
            row.gross_profit,
            row.profit_margin_pct
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let base = match &args.config {
        Some(path) => ForecastConfig::from_json_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ForecastConfig::default(),
    };

    let mut runner = ScenarioRunner::new(base);
    runner
        .sweep("default rate %", &args.default_rates, |c, v| c.financial.default_rate_pct = v)
        .sweep("monthly growth %", &args.growth_rates, |c, v| {
            c.lifecycle.monthly_growth_pct = v;
            c.lifecycle.yearly_growth_rates.clear();
        });

    println!("Running {} scenarios...", runner.scenarios().len());
    let start = Instant::now();
    let results = runner.run_all();
    println!("Scenarios complete in {:?}\n", start.elapsed());

    for result in &results {
        if let Err(err) = &result.outcome {
            eprintln!("{}: {}", result.name, err);
        }
    }

    let comparison = ScenarioRunner::compare(&results);
    print_comparison(&comparison);

    write_table_to_path(&args.output, &comparison)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!("\nWrote {}", args.output.display());

    Ok(())
}
