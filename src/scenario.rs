//! Scenario runner for side-by-side forecasts
//!
//! Each scenario owns its configuration copy, so scenarios run in parallel
//! with nothing shared between them.

use crate::config::ForecastConfig;
use crate::error::Result;
use crate::projection::{ForecastEngine, ForecastOutput};
use crate::reporting::ScenarioComparisonRow;
use rayon::prelude::*;

/// A named forecast configuration
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub config: ForecastConfig,
}

impl Scenario {
    pub fn new(name: impl Into<String>, config: ForecastConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

/// Outcome of one scenario; a rejected configuration does not stop the batch
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Result<ForecastOutput>,
}

/// Batch of scenarios derived from a base configuration
///
/// # Example
/// ```ignore
/// let mut runner = ScenarioRunner::new(ForecastConfig::default());
/// runner.sweep("default rate", &[1.0, 3.0, 5.0], |c, v| c.financial.default_rate_pct = v);
/// let comparison = ScenarioRunner::compare(&runner.run_all());
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    base: ForecastConfig,
    scenarios: Vec<Scenario>,
}

impl ScenarioRunner {
    /// Runner holding the base configuration as its first scenario, named "base"
    pub fn new(base: ForecastConfig) -> Self {
        Self {
            scenarios: vec![Scenario::new("base", base.clone())],
            base,
        }
    }

    /// Runner with exactly the given scenarios
    pub fn from_scenarios(base: ForecastConfig, scenarios: Vec<Scenario>) -> Self {
        Self { base, scenarios }
    }

    pub fn base(&self) -> &ForecastConfig {
        &self.base
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn add(&mut self, scenario: Scenario) -> &mut Self {
        self.scenarios.push(scenario);
        self
    }

    /// Add a scenario derived from the base configuration
    pub fn variant<F>(&mut self, name: &str, modify: F) -> &mut Self
    where
        F: FnOnce(&mut ForecastConfig),
    {
        let mut config = self.base.clone();
        modify(&mut config);
        self.add(Scenario::new(name, config))
    }

    /// One scenario per value of a single parameter, named `"{name} = {value}"`
    pub fn sweep<F>(&mut self, name: &str, values: &[f64], apply: F) -> &mut Self
    where
        F: Fn(&mut ForecastConfig, f64),
    {
        for &value in values {
            let mut config = self.base.clone();
            apply(&mut config, value);
            self.scenarios.push(Scenario::new(format!("{} = {}", name, value), config));
        }
        self
    }

    /// Run every scenario in parallel, preserving scenario order
    pub fn run_all(&self) -> Vec<ScenarioResult> {
        log::info!("Running {} scenarios", self.scenarios.len());

        let results: Vec<ScenarioResult> = self
            .scenarios
            .par_iter()
            .map(|scenario| ScenarioResult {
                name: scenario.name.clone(),
                outcome: ForecastEngine::new(scenario.config.clone()).run(),
            })
            .collect();

        let failed = results.iter().filter(|r| r.outcome.is_err()).count();
        if failed > 0 {
            log::warn!("{} of {} scenarios failed validation", failed, results.len());
        }
        results
    }

    /// Comparison rows for the scenarios that completed
    pub fn compare(results: &[ScenarioResult]) -> Vec<ScenarioComparisonRow> {
        results
            .iter()
            .filter_map(|r| match &r.outcome {
                Ok(output) => Some(ScenarioComparisonRow::from_cohorts(&r.name, &output.cohorts)),
                Err(_) => None,
            })
            .collect()
    }
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::new(ForecastConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LifecycleConfig, ProductConfig, SlotFee};

    fn small_config() -> ForecastConfig {
        let mut product = ProductConfig::empty();
        product.durations.push(4);
        product.slab_amounts.insert(4, vec![5000]);
        for slot in 1..=4 {
            product.set_slot(4, 5000, slot, SlotFee::open((5 - slot) as f64), 25.0);
        }

        let mut config = ForecastConfig {
            product,
            ..Default::default()
        };
        config.lifecycle = LifecycleConfig {
            starting_users: 1000,
            monthly_growth_pct: 1.0,
            ..Default::default()
        };
        config
    }

    #[test]
    fn test_sweep_names_and_order() {
        let mut runner = ScenarioRunner::new(small_config());
        runner.sweep("default rate", &[1.0, 5.0], |c, v| c.financial.default_rate_pct = v);

        let names: Vec<_> = runner.scenarios().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["base", "default rate = 1", "default rate = 5"]);
        assert_eq!(runner.scenarios()[2].config.financial.default_rate_pct, 5.0);
        // the base is untouched
        assert_eq!(runner.base().financial.default_rate_pct, 1.0);
    }

    #[test]
    fn test_higher_default_rate_lowers_profit() {
        let mut runner = ScenarioRunner::from_scenarios(small_config(), Vec::new());
        runner.sweep("default rate", &[0.0, 10.0], |c, v| c.financial.default_rate_pct = v);

        let results = runner.run_all();
        let comparison = ScenarioRunner::compare(&results);
        assert_eq!(comparison.len(), 2);
        assert!(comparison[0].gross_profit > comparison[1].gross_profit);
        assert!(comparison[1].net_default_loss > 0.0);
        assert_eq!(comparison[0].net_default_loss, 0.0);
    }

    #[test]
    fn test_invalid_scenario_does_not_stop_batch() {
        let mut runner = ScenarioRunner::new(small_config());
        runner.variant("broken", |c| c.financial.spread_pct = -1.0);

        let results = runner.run_all();
        assert_eq!(results.len(), 2);
        assert!(results[0].outcome.is_ok());
        assert!(results[1].outcome.is_err());

        let comparison = ScenarioRunner::compare(&results);
        assert_eq!(comparison.len(), 1);
        assert_eq!(comparison[0].scenario, "base");
    }

    #[test]
    fn test_parallel_run_matches_direct_run() {
        let config = small_config();
        let direct = ForecastEngine::new(config.clone()).run().unwrap();

        let results = ScenarioRunner::new(config).run_all();
        let output = results[0].outcome.as_ref().unwrap();
        assert_eq!(output.cohorts, direct.cohorts);
    }
}
