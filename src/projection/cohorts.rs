//! Cohort-level output rows and the complete forecast result

use crate::config::FeeCollectionMode;
use crate::lifecycle::LifecycleProjection;
use crate::reporting::{MonthlySummary, YearlySummary};
use serde::{Deserialize, Serialize};

/// Identity of a cohort: users joining one (duration, slab, slot) in one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CohortKey {
    pub join_month: u32,
    pub duration: u32,
    pub slab: u64,
    pub slot: u32,
}

impl CohortKey {
    /// Month in which this slot receives the pooled payout
    pub fn payout_month(&self) -> u32 {
        self.join_month.saturating_add(self.slot.saturating_sub(1))
    }
}

/// Lifetime financials of one cohort. Column names are stable for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRow {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "Duration")]
    pub duration: u32,
    #[serde(rename = "Slab")]
    pub slab: u64,
    #[serde(rename = "Slot")]
    pub slot: u32,
    #[serde(rename = "Users")]
    pub users: u64,
    #[serde(rename = "Fee %")]
    pub fee_pct: f64,

    // Commitment and fee
    #[serde(rename = "Commitment Per User")]
    pub commitment_per_user: f64,
    #[serde(rename = "Total Commitment")]
    pub total_commitment: f64,
    #[serde(rename = "Fee Collected")]
    pub fee_collected: f64,
    #[serde(rename = "Monthly Fee Per User")]
    pub monthly_fee_per_user: f64,

    // Interest income
    #[serde(rename = "Base NII")]
    pub base_nii: f64,
    #[serde(rename = "Fee NII")]
    pub fee_nii: f64,
    #[serde(rename = "Pool Growth NII")]
    pub pool_growth_nii: f64,
    #[serde(rename = "Total NII")]
    pub total_nii: f64,

    // Defaults
    #[serde(rename = "Total Defaulters")]
    pub total_defaulters: u64,
    #[serde(rename = "Pre-Payout Defaulters")]
    pub pre_payout_defaulters: u64,
    #[serde(rename = "Post-Payout Defaulters")]
    pub post_payout_defaulters: u64,
    #[serde(rename = "Default Loss")]
    pub default_loss: f64,
    #[serde(rename = "Recovery")]
    pub recovery: f64,
    #[serde(rename = "Net Default Loss")]
    pub net_default_loss: f64,
    #[serde(rename = "Default Fees Collected")]
    pub default_fees_collected: f64,

    // Revenue and profit
    #[serde(rename = "Total Revenue")]
    pub total_revenue: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "Profit Margin %")]
    pub profit_margin_pct: f64,
    #[serde(rename = "Party A Share")]
    pub party_a_share: f64,
    #[serde(rename = "Party B Share")]
    pub party_b_share: f64,
}

impl CohortRow {
    /// Months in which this cohort's fee is charged, with the amount charged
    pub fn fee_schedule(&self, mode: FeeCollectionMode) -> Vec<(u32, f64)> {
        match mode {
            FeeCollectionMode::Upfront => vec![(self.month, self.fee_collected)],
            FeeCollectionMode::Monthly => {
                let per_month = self.monthly_fee_per_user * self.users as f64;
                (0..self.duration).map(|j| (self.month + j, per_month)).collect()
            }
        }
    }
}

/// Complete result of one forecast run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutput {
    pub cohorts: Vec<CohortRow>,
    pub lifecycle: LifecycleProjection,
    pub monthly: Vec<MonthlySummary>,
    pub yearly: Vec<YearlySummary>,
}

impl ForecastOutput {
    pub fn cohorts_in(&self, month: u32) -> impl Iterator<Item = &CohortRow> {
        self.cohorts.iter().filter(move |c| c.month == month)
    }

    pub fn total_revenue(&self) -> f64 {
        self.cohorts.iter().map(|c| c.total_revenue).sum()
    }

    pub fn total_gross_profit(&self) -> f64 {
        self.cohorts.iter().map(|c| c.gross_profit).sum()
    }
}
