//! Month-by-month user lifecycle projection

use super::rows::{CohortStart, LifecycleProjection, LifecycleRow, ReturnLogRow};
use super::state::LifecycleState;
use crate::allocation::allocate;
use crate::config::{
    ForecastConfig, LifecycleConfig, MarketConfig, UserModel, HORIZON_MONTHS, MAX_USER_BASE,
};

/// Floor a non-negative user count, snapping values within float noise of an integer
fn floor_count(value: f64) -> u64 {
    let nearest = value.round();
    let count = if (value - nearest).abs() <= nearest.abs() * 1e-12 {
        nearest
    } else {
        value.floor()
    };
    count.max(0.0) as u64
}

/// Projects new, returning, resting and churned users over the horizon.
///
/// Inputs are trusted; bounds are checked by config validation.
pub struct LifecycleEngine {
    lifecycle: LifecycleConfig,
    market: MarketConfig,
    user_model: UserModel,
    starting_users: u64,
    duration_shares: Vec<(u32, f64)>,
    horizon: u32,
}

impl LifecycleEngine {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            lifecycle: config.lifecycle.clone(),
            market: config.market.clone(),
            user_model: config.engine.user_model,
            starting_users: config.starting_users(),
            duration_shares: config.product.duration_shares(),
            horizon: HORIZON_MONTHS,
        }
    }

    /// Run the projection over the full horizon
    pub fn project(&self) -> LifecycleProjection {
        let mut state = LifecycleState::new(self.horizon, self.market.initial_tam());
        let mut projection = LifecycleProjection::default();

        for _month in 1..=self.horizon {
            state.advance_month();
            let row = self.project_month(&mut state, &mut projection);
            projection.rows.push(row);
        }

        projection.dropped_returns = state.dropped_returns;
        projection
    }

    fn project_month(&self, state: &mut LifecycleState, projection: &mut LifecycleProjection) -> LifecycleRow {
        let month = state.month;
        state.tam = self.market.tam_for_month(month);

        let previous_total = state.total_users;
        let mut total = if month == 1 {
            self.starting_users
        } else {
            let growth = self.lifecycle.growth_pct_for_month(month) / 100.0;
            floor_count(previous_total as f64 * (1.0 + growth))
        };
        if self.caps_at_tam() {
            total = total.min(floor_count(state.tam));
        }
        total = total.min(MAX_USER_BASE);
        let new_users = if month == 1 {
            total
        } else {
            total.saturating_sub(previous_total)
        };
        state.total_users = total.max(previous_total);

        let returning_users = state.return_schedule.take(month);
        let active_users = new_users.saturating_add(returning_users);

        for (duration, users) in allocate(active_users, &self.duration_shares) {
            if users == 0 {
                continue;
            }
            projection.starts.push(CohortStart { month, duration, users });
            self.schedule_completion(state, projection, month, duration, users);
        }

        log::debug!(
            "month {}: total={} new={} returning={} active={} pending_returns={}",
            month,
            state.total_users,
            new_users,
            returning_users,
            active_users,
            state.return_schedule.pending()
        );

        LifecycleRow {
            month,
            year: (month - 1) / 12 + 1,
            tam: state.tam,
            total_users: state.total_users,
            new_users,
            returning_users,
            active_users,
            resting_users: state.resting_in(month),
            churned_users: state.churned_in(month),
        }
    }

    /// Book a cohort's completion: returners rest, the rest churn
    fn schedule_completion(
        &self,
        state: &mut LifecycleState,
        projection: &mut LifecycleProjection,
        start_month: u32,
        duration: u32,
        users: u64,
    ) {
        let returners = if self.user_model.schedules_returns() {
            self.returners(users)
        } else {
            0
        };
        let churned = users - returners;

        let completion = start_month.saturating_add(duration);
        if completion <= self.horizon {
            state.add_resting(completion, returners);
            state.add_churned(completion, churned);
        }

        if !self.user_model.schedules_returns() {
            return;
        }

        let return_month = completion.saturating_add(self.lifecycle.rest_period_months);
        let materialized = state.return_schedule.schedule(return_month, returners);
        if !materialized {
            state.dropped_returns += returners;
            log::debug!(
                "month {}: {} returners of the {}M cohort fall past the horizon (month {})",
                start_month,
                returners,
                duration,
                return_month
            );
        }

        projection.return_log.push(ReturnLogRow {
            source_month: start_month,
            duration,
            cohort_users: users,
            returning_users: returners,
            churned_users: churned,
            return_month,
            materialized,
        });
    }

    /// Members of a completed cohort who come back after resting
    fn returners(&self, cohort_users: u64) -> u64 {
        let rate = self.lifecycle.returning_user_pct * (100.0 - self.lifecycle.churn_pct) / 10_000.0;
        floor_count(cohort_users as f64 * rate).min(cohort_users)
    }

    fn caps_at_tam(&self) -> bool {
        self.user_model == UserModel::TamHierarchical && self.market.enforce_tam_cap
    }
}
