//! Cohort financial projection over the forecast horizon

mod accrual;
mod cohorts;
mod engine;

pub use accrual::{AccrualEngine, DefaultBreakdown, NiiBreakdown};
pub use cohorts::{CohortKey, CohortRow, ForecastOutput};
pub use engine::{run_forecast, ForecastEngine};
