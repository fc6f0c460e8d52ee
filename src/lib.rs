//! ROSCA Forecast - cohort-based forecasting engine for committee savings products
//!
//! This library provides:
//! - User lifecycle modeling (growth, rest periods, automatic rejoining)
//! - Proportional allocation across durations, slabs and payout slots
//! - Per-cohort fee, interest income, default and profit-share accrual
//! - Monthly, yearly and per-dimension summaries with CSV export
//! - Parallel multi-scenario comparison

pub mod error;
pub mod config;
pub mod calendar;
pub mod allocation;
pub mod lifecycle;
pub mod projection;
pub mod reporting;
pub mod scenario;

// Re-export commonly used types
pub use error::{ForecastError, Result};
pub use config::{ForecastConfig, ForecastRequest};
pub use projection::{run_forecast, CohortRow, ForecastEngine, ForecastOutput};
pub use reporting::{MonthlySummary, YearlySummary};
pub use scenario::{Scenario, ScenarioRunner};
