//! Summaries and CSV export of forecast results

pub mod ratios;
mod summary;
pub mod export;

pub use summary::{
    fees_recognized_by_month, summarize_by_duration, summarize_by_slab, summarize_months,
    summarize_years, DimensionSummary, MonthlySummary, ScenarioComparisonRow, Totals,
    YearlySummary,
};
pub use export::{write_forecast, write_table};
