//! Forecast engine: lifecycle -> allocation -> accrual -> summaries

use super::accrual::AccrualEngine;
use super::cohorts::{CohortKey, CohortRow, ForecastOutput};
use crate::allocation::allocate;
use crate::config::{validate, ForecastConfig};
use crate::error::Result;
use crate::lifecycle::{CohortStart, LifecycleEngine, LifecycleProjection};
use crate::reporting::{summarize_months, summarize_years};

/// Main forecast engine
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Validate the configuration, then run the full forecast.
    ///
    /// A run either completes with every table or fails validation with no
    /// tables at all.
    pub fn run(&self) -> Result<ForecastOutput> {
        validate(&self.config)?;

        let lifecycle = LifecycleEngine::new(&self.config).project();
        let accrual = AccrualEngine::new(&self.config);
        let cohorts = self.build_cohorts(&lifecycle, &accrual);

        let monthly = summarize_months(&cohorts, &lifecycle, self.config.financial.fee_collection);
        let yearly = summarize_years(&monthly);

        let output = ForecastOutput {
            cohorts,
            lifecycle,
            monthly,
            yearly,
        };

        log::info!(
            "Forecast complete: {} cohorts, {} new users, revenue {:.2}, gross profit {:.2}, {} returns dropped",
            output.cohorts.len(),
            output.lifecycle.total_new_users(),
            output.total_revenue(),
            output.total_gross_profit(),
            output.lifecycle.dropped_returns
        );

        Ok(output)
    }

    fn build_cohorts(&self, lifecycle: &LifecycleProjection, accrual: &AccrualEngine) -> Vec<CohortRow> {
        let mut cohorts = Vec::new();
        for start in &lifecycle.starts {
            self.allocate_start(start, accrual, &mut cohorts);
        }
        cohorts
    }

    /// Split one (month, duration) start across slabs, then slots
    fn allocate_start(&self, start: &CohortStart, accrual: &AccrualEngine, cohorts: &mut Vec<CohortRow>) {
        let product = &self.config.product;

        for (slab, slab_users) in allocate(start.users, &product.slab_shares(start.duration)) {
            if slab_users == 0 {
                continue;
            }

            // Slabs with no open slot produce no rows
            let slot_shares = product.slot_shares(start.duration, slab);
            for (slot, users) in allocate(slab_users, &slot_shares) {
                if users == 0 {
                    continue;
                }
                let Some(slot_fee) = product.slot_fee(start.duration, slab, slot) else {
                    continue;
                };

                let key = CohortKey {
                    join_month: start.month,
                    duration: start.duration,
                    slab,
                    slot,
                };
                cohorts.push(accrual.accrue(key, users, slot_fee));
            }
        }
    }
}

/// Run a forecast for a borrowed configuration
pub fn run_forecast(config: &ForecastConfig) -> Result<ForecastOutput> {
    ForecastEngine::new(config.clone()).run()
}
