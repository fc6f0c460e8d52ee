//! Monthly, yearly and per-dimension roll-ups of the cohort table

use super::ratios::{growth_pct, percentage_of};
use crate::config::{FeeCollectionMode, HORIZON_MONTHS};
use crate::lifecycle::LifecycleProjection;
use crate::projection::CohortRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running sums over cohort rows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub cohorts: u64,
    pub users: u64,
    pub total_commitment: f64,
    pub fees_collected: f64,
    pub base_nii: f64,
    pub fee_nii: f64,
    pub pool_growth_nii: f64,
    pub total_nii: f64,
    pub default_fees_collected: f64,
    pub default_loss: f64,
    pub recovery: f64,
    pub net_default_loss: f64,
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub party_a_share: f64,
    pub party_b_share: f64,
}

impl Totals {
    pub fn add(&mut self, row: &CohortRow) {
        self.cohorts += 1;
        self.users += row.users;
        self.total_commitment += row.total_commitment;
        self.fees_collected += row.fee_collected;
        self.base_nii += row.base_nii;
        self.fee_nii += row.fee_nii;
        self.pool_growth_nii += row.pool_growth_nii;
        self.total_nii += row.total_nii;
        self.default_fees_collected += row.default_fees_collected;
        self.default_loss += row.default_loss;
        self.recovery += row.recovery;
        self.net_default_loss += row.net_default_loss;
        self.total_revenue += row.total_revenue;
        self.gross_profit += row.gross_profit;
        self.party_a_share += row.party_a_share;
        self.party_b_share += row.party_b_share;
    }

    pub fn of<'a>(rows: impl IntoIterator<Item = &'a CohortRow>) -> Self {
        let mut totals = Totals::default();
        for row in rows {
            totals.add(row);
        }
        totals
    }

    pub fn profit_margin_pct(&self) -> f64 {
        percentage_of(self.gross_profit, self.total_revenue)
    }
}

/// One row per simulated month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "New Users")]
    pub new_users: u64,
    #[serde(rename = "Returning Users")]
    pub returning_users: u64,
    #[serde(rename = "Active Users")]
    pub active_users: u64,
    #[serde(rename = "Resting Users")]
    pub resting_users: u64,
    #[serde(rename = "Churned Users")]
    pub churned_users: u64,
    #[serde(rename = "Total Users")]
    pub total_users: u64,
    #[serde(rename = "Cohorts")]
    pub cohorts: u64,
    #[serde(rename = "Allocated Users")]
    pub allocated_users: u64,
    #[serde(rename = "Total Commitment")]
    pub total_commitment: f64,
    /// Lifetime fees of cohorts joining this month
    #[serde(rename = "Fees Collected")]
    pub fees_collected: f64,
    /// Fees actually charged this month, across all live cohorts
    #[serde(rename = "Fees Recognized")]
    pub fees_recognized: f64,
    #[serde(rename = "Base NII")]
    pub base_nii: f64,
    #[serde(rename = "Fee NII")]
    pub fee_nii: f64,
    #[serde(rename = "Pool Growth NII")]
    pub pool_growth_nii: f64,
    #[serde(rename = "Total NII")]
    pub total_nii: f64,
    #[serde(rename = "Default Fees Collected")]
    pub default_fees_collected: f64,
    #[serde(rename = "Default Loss")]
    pub default_loss: f64,
    #[serde(rename = "Recovery")]
    pub recovery: f64,
    #[serde(rename = "Net Default Loss")]
    pub net_default_loss: f64,
    #[serde(rename = "Total Revenue")]
    pub total_revenue: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "Party A Share")]
    pub party_a_share: f64,
    #[serde(rename = "Party B Share")]
    pub party_b_share: f64,
    #[serde(rename = "Profit Margin %")]
    pub profit_margin_pct: f64,
    #[serde(rename = "Revenue Growth %")]
    pub revenue_growth_pct: f64,
}

/// One row per forecast year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "New Users")]
    pub new_users: u64,
    #[serde(rename = "Returning Users")]
    pub returning_users: u64,
    #[serde(rename = "Active Users")]
    pub active_users: u64,
    #[serde(rename = "Churned Users")]
    pub churned_users: u64,
    /// User base at year end
    #[serde(rename = "Total Users")]
    pub total_users: u64,
    #[serde(rename = "Cohorts")]
    pub cohorts: u64,
    #[serde(rename = "Allocated Users")]
    pub allocated_users: u64,
    #[serde(rename = "Total Commitment")]
    pub total_commitment: f64,
    #[serde(rename = "Fees Collected")]
    pub fees_collected: f64,
    #[serde(rename = "Fees Recognized")]
    pub fees_recognized: f64,
    #[serde(rename = "Total NII")]
    pub total_nii: f64,
    #[serde(rename = "Net Default Loss")]
    pub net_default_loss: f64,
    #[serde(rename = "Total Revenue")]
    pub total_revenue: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "Party A Share")]
    pub party_a_share: f64,
    #[serde(rename = "Party B Share")]
    pub party_b_share: f64,
    #[serde(rename = "Profit Margin %")]
    pub profit_margin_pct: f64,
    #[serde(rename = "Revenue Growth %")]
    pub revenue_growth_pct: f64,
}

/// Totals for one value of a grouping dimension (a duration or a slab)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSummary {
    #[serde(rename = "Dimension")]
    pub dimension: String,
    #[serde(rename = "Value")]
    pub value: u64,
    #[serde(rename = "Cohorts")]
    pub cohorts: u64,
    #[serde(rename = "Users")]
    pub users: u64,
    #[serde(rename = "Total Commitment")]
    pub total_commitment: f64,
    #[serde(rename = "Fees Collected")]
    pub fees_collected: f64,
    #[serde(rename = "Total NII")]
    pub total_nii: f64,
    #[serde(rename = "Net Default Loss")]
    pub net_default_loss: f64,
    #[serde(rename = "Total Revenue")]
    pub total_revenue: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "Profit Margin %")]
    pub profit_margin_pct: f64,
}

/// Fees charged in each month, following each cohort's collection schedule
pub fn fees_recognized_by_month(cohorts: &[CohortRow], mode: FeeCollectionMode) -> BTreeMap<u32, f64> {
    let mut by_month = BTreeMap::new();
    for row in cohorts {
        for (month, amount) in row.fee_schedule(mode) {
            if month <= HORIZON_MONTHS {
                *by_month.entry(month).or_insert(0.0) += amount;
            }
        }
    }
    by_month
}

/// Monthly summary joined with lifecycle counts
pub fn summarize_months(
    cohorts: &[CohortRow],
    lifecycle: &LifecycleProjection,
    mode: FeeCollectionMode,
) -> Vec<MonthlySummary> {
    let mut totals: BTreeMap<u32, Totals> = BTreeMap::new();
    for row in cohorts {
        totals.entry(row.month).or_default().add(row);
    }
    let recognized = fees_recognized_by_month(cohorts, mode);

    let mut previous_revenue = 0.0;
    lifecycle
        .rows
        .iter()
        .map(|life| {
            let t = totals.get(&life.month).copied().unwrap_or_default();
            let summary = MonthlySummary {
                month: life.month,
                year: life.year,
                new_users: life.new_users,
                returning_users: life.returning_users,
                active_users: life.active_users,
                resting_users: life.resting_users,
                churned_users: life.churned_users,
                total_users: life.total_users,
                cohorts: t.cohorts,
                allocated_users: t.users,
                total_commitment: t.total_commitment,
                fees_collected: t.fees_collected,
                fees_recognized: recognized.get(&life.month).copied().unwrap_or(0.0),
                base_nii: t.base_nii,
                fee_nii: t.fee_nii,
                pool_growth_nii: t.pool_growth_nii,
                total_nii: t.total_nii,
                default_fees_collected: t.default_fees_collected,
                default_loss: t.default_loss,
                recovery: t.recovery,
                net_default_loss: t.net_default_loss,
                total_revenue: t.total_revenue,
                gross_profit: t.gross_profit,
                party_a_share: t.party_a_share,
                party_b_share: t.party_b_share,
                profit_margin_pct: t.profit_margin_pct(),
                revenue_growth_pct: growth_pct(t.total_revenue, previous_revenue),
            };
            previous_revenue = t.total_revenue;
            summary
        })
        .collect()
}

/// Yearly summary built from the monthly rows
pub fn summarize_years(monthly: &[MonthlySummary]) -> Vec<YearlySummary> {
    let mut years: BTreeMap<u32, YearlySummary> = BTreeMap::new();

    for m in monthly {
        let y = years.entry(m.year).or_insert_with(|| YearlySummary {
            year: m.year,
            new_users: 0,
            returning_users: 0,
            active_users: 0,
            churned_users: 0,
            total_users: 0,
            cohorts: 0,
            allocated_users: 0,
            total_commitment: 0.0,
            fees_collected: 0.0,
            fees_recognized: 0.0,
            total_nii: 0.0,
            net_default_loss: 0.0,
            total_revenue: 0.0,
            gross_profit: 0.0,
            party_a_share: 0.0,
            party_b_share: 0.0,
            profit_margin_pct: 0.0,
            revenue_growth_pct: 0.0,
        });
        y.new_users += m.new_users;
        y.returning_users += m.returning_users;
        y.active_users += m.active_users;
        y.churned_users += m.churned_users;
        y.total_users = y.total_users.max(m.total_users);
        y.cohorts += m.cohorts;
        y.allocated_users += m.allocated_users;
        y.total_commitment += m.total_commitment;
        y.fees_collected += m.fees_collected;
        y.fees_recognized += m.fees_recognized;
        y.total_nii += m.total_nii;
        y.net_default_loss += m.net_default_loss;
        y.total_revenue += m.total_revenue;
        y.gross_profit += m.gross_profit;
        y.party_a_share += m.party_a_share;
        y.party_b_share += m.party_b_share;
    }

    let mut previous_revenue = 0.0;
    years
        .into_values()
        .map(|mut y| {
            y.profit_margin_pct = percentage_of(y.gross_profit, y.total_revenue);
            y.revenue_growth_pct = growth_pct(y.total_revenue, previous_revenue);
            previous_revenue = y.total_revenue;
            y
        })
        .collect()
}

fn summarize_by<F>(cohorts: &[CohortRow], dimension: &str, key: F) -> Vec<DimensionSummary>
where
    F: Fn(&CohortRow) -> u64,
{
    let mut groups: BTreeMap<u64, Totals> = BTreeMap::new();
    for row in cohorts {
        groups.entry(key(row)).or_default().add(row);
    }

    groups
        .into_iter()
        .map(|(value, t)| DimensionSummary {
            dimension: dimension.to_string(),
            value,
            cohorts: t.cohorts,
            users: t.users,
            total_commitment: t.total_commitment,
            fees_collected: t.fees_collected,
            total_nii: t.total_nii,
            net_default_loss: t.net_default_loss,
            total_revenue: t.total_revenue,
            gross_profit: t.gross_profit,
            profit_margin_pct: t.profit_margin_pct(),
        })
        .collect()
}

pub fn summarize_by_duration(cohorts: &[CohortRow]) -> Vec<DimensionSummary> {
    summarize_by(cohorts, "Duration", |row| row.duration as u64)
}

pub fn summarize_by_slab(cohorts: &[CohortRow]) -> Vec<DimensionSummary> {
    summarize_by(cohorts, "Slab", |row| row.slab)
}

/// Headline totals of one named scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparisonRow {
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Cohorts")]
    pub cohorts: u64,
    #[serde(rename = "Users")]
    pub users: u64,
    #[serde(rename = "Total Commitment")]
    pub total_commitment: f64,
    #[serde(rename = "Fees Collected")]
    pub fees_collected: f64,
    #[serde(rename = "Total NII")]
    pub total_nii: f64,
    #[serde(rename = "Net Default Loss")]
    pub net_default_loss: f64,
    #[serde(rename = "Total Revenue")]
    pub total_revenue: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "Party A Share")]
    pub party_a_share: f64,
    #[serde(rename = "Party B Share")]
    pub party_b_share: f64,
    #[serde(rename = "Profit Margin %")]
    pub profit_margin_pct: f64,
}

impl ScenarioComparisonRow {
    pub fn from_cohorts(scenario: &str, cohorts: &[CohortRow]) -> Self {
        let t = Totals::of(cohorts);
        Self {
            scenario: scenario.to_string(),
            cohorts: t.cohorts,
            users: t.users,
            total_commitment: t.total_commitment,
            fees_collected: t.fees_collected,
            total_nii: t.total_nii,
            net_default_loss: t.net_default_loss,
            total_revenue: t.total_revenue,
            gross_profit: t.gross_profit,
            party_a_share: t.party_a_share,
            party_b_share: t.party_b_share,
            profit_margin_pct: t.profit_margin_pct(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleRow;
    use approx::assert_relative_eq;

    fn cohort(month: u32, duration: u32, slab: u64, users: u64, revenue: f64) -> CohortRow {
        let commitment = slab as f64 * duration as f64;
        let fee = commitment * 0.02 * users as f64;
        CohortRow {
            month,
            year: (month - 1) / 12 + 1,
            duration,
            slab,
            slot: 1,
            users,
            fee_pct: 2.0,
            commitment_per_user: commitment,
            total_commitment: commitment * users as f64,
            fee_collected: fee,
            monthly_fee_per_user: commitment * 0.02 / duration as f64,
            base_nii: revenue - fee,
            fee_nii: 0.0,
            pool_growth_nii: 0.0,
            total_nii: revenue - fee,
            total_defaulters: 0,
            pre_payout_defaulters: 0,
            post_payout_defaulters: 0,
            default_loss: 0.0,
            recovery: 0.0,
            net_default_loss: 10.0,
            default_fees_collected: 0.0,
            total_revenue: revenue,
            gross_profit: revenue - 10.0,
            profit_margin_pct: percentage_of(revenue - 10.0, revenue),
            party_a_share: (revenue - 10.0) / 2.0,
            party_b_share: (revenue - 10.0) / 2.0,
        }
    }

    fn lifecycle(months: u32) -> LifecycleProjection {
        LifecycleProjection {
            rows: (1..=months)
                .map(|m| LifecycleRow {
                    month: m,
                    year: (m - 1) / 12 + 1,
                    tam: 0.0,
                    total_users: 100 * m as u64,
                    new_users: 100,
                    returning_users: 0,
                    active_users: 100,
                    resting_users: 0,
                    churned_users: 0,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_totals_accumulate() {
        let rows = vec![cohort(1, 3, 1000, 10, 500.0), cohort(1, 6, 2000, 5, 700.0)];
        let t = Totals::of(&rows);
        assert_eq!(t.cohorts, 2);
        assert_eq!(t.users, 15);
        assert_relative_eq!(t.total_revenue, 1200.0);
        assert_relative_eq!(t.gross_profit, 1180.0);
        assert_relative_eq!(t.profit_margin_pct(), 1180.0 / 1200.0 * 100.0);
    }

    #[test]
    fn test_months_without_cohorts_are_zero() {
        let rows = vec![cohort(2, 3, 1000, 10, 500.0)];
        let monthly = summarize_months(&rows, &lifecycle(3), FeeCollectionMode::Upfront);

        assert_eq!(monthly.len(), 3);
        assert_eq!(monthly[0].cohorts, 0);
        assert_relative_eq!(monthly[0].total_revenue, 0.0);
        assert_relative_eq!(monthly[0].profit_margin_pct, 0.0);
        assert_eq!(monthly[1].allocated_users, 10);
        // growth from a zero month is reported as 0
        assert_relative_eq!(monthly[1].revenue_growth_pct, 0.0);
        assert_relative_eq!(monthly[2].revenue_growth_pct, -100.0);
    }

    #[test]
    fn test_monthly_fee_recognition_spreads_over_duration() {
        let rows = vec![cohort(1, 3, 1000, 10, 500.0)];
        let upfront = summarize_months(&rows, &lifecycle(4), FeeCollectionMode::Upfront);
        let monthly = summarize_months(&rows, &lifecycle(4), FeeCollectionMode::Monthly);

        assert_relative_eq!(upfront[0].fees_recognized, 600.0, epsilon = 1e-9);
        assert_relative_eq!(upfront[1].fees_recognized, 0.0);

        for m in 0..3 {
            assert_relative_eq!(monthly[m].fees_recognized, 200.0, epsilon = 1e-9);
        }
        assert_relative_eq!(monthly[3].fees_recognized, 0.0);
        // lifetime fee is the same either way
        assert_relative_eq!(monthly[0].fees_collected, upfront[0].fees_collected);
    }

    #[test]
    fn test_fee_recognition_clipped_at_horizon() {
        let rows = vec![cohort(HORIZON_MONTHS, 3, 1000, 10, 500.0)];
        let by_month = fees_recognized_by_month(&rows, FeeCollectionMode::Monthly);
        assert_eq!(by_month.len(), 1);
        assert!(by_month.contains_key(&HORIZON_MONTHS));
    }

    #[test]
    fn test_yearly_rollup() {
        let rows: Vec<CohortRow> = (1..=24).map(|m| cohort(m, 3, 1000, 1, 100.0 * (m as f64))).collect();
        let monthly = summarize_months(&rows, &lifecycle(24), FeeCollectionMode::Upfront);
        let yearly = summarize_years(&monthly);

        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly[0].new_users, 1200);
        assert_eq!(yearly[0].total_users, 1200);
        assert_eq!(yearly[1].total_users, 2400);
        assert_relative_eq!(yearly[0].total_revenue, 100.0 * 78.0, epsilon = 1e-9);
        assert_relative_eq!(yearly[1].total_revenue, 100.0 * 222.0, epsilon = 1e-9);
        assert_relative_eq!(yearly[0].revenue_growth_pct, 0.0);
        assert_relative_eq!(
            yearly[1].revenue_growth_pct,
            (22200.0 - 7800.0) / 7800.0 * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_dimension_summaries() {
        let rows = vec![
            cohort(1, 3, 1000, 10, 500.0),
            cohort(1, 6, 1000, 5, 300.0),
            cohort(2, 3, 5000, 2, 200.0),
        ];
        let by_duration = summarize_by_duration(&rows);
        assert_eq!(by_duration.len(), 2);
        assert_eq!(by_duration[0].value, 3);
        assert_eq!(by_duration[0].users, 12);
        assert_relative_eq!(by_duration[0].total_revenue, 700.0);

        let by_slab = summarize_by_slab(&rows);
        assert_eq!(by_slab.len(), 2);
        assert_eq!(by_slab[0].dimension, "Slab");
        assert_eq!(by_slab[0].value, 1000);
        assert_eq!(by_slab[0].cohorts, 2);
        assert_eq!(by_slab[1].value, 5000);
    }

    #[test]
    fn test_scenario_comparison_row() {
        let rows = vec![cohort(1, 3, 1000, 10, 500.0), cohort(2, 3, 1000, 10, 0.0)];
        let row = ScenarioComparisonRow::from_cohorts("base", &rows);
        assert_eq!(row.scenario, "base");
        assert_eq!(row.cohorts, 2);
        assert_relative_eq!(row.gross_profit, 470.0);
        assert_relative_eq!(row.profit_margin_pct, 94.0, epsilon = 1e-9);

        let empty = ScenarioComparisonRow::from_cohorts("empty", &[]);
        assert_relative_eq!(empty.profit_margin_pct, 0.0);
    }
}
