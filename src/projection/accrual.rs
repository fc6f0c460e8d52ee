//! Per-cohort financial accrual: commitment, fees, interest income, defaults

use super::cohorts::{CohortKey, CohortRow};
use crate::calendar::SimulationCalendar;
use crate::config::{FeeCollectionMode, FinancialConfig, ForecastConfig, NiiMode, SlotFee};
use crate::reporting::ratios::percentage_of;

/// Relative distance from an integer treated as float noise
const COUNT_SNAP: f64 = 1e-12;

/// Ceil a non-negative count. A value within float noise of a non-zero
/// integer snaps to it; any positive value below 1 still counts as 1.
fn ceil_count(value: f64) -> u64 {
    let nearest = value.round();
    let count = if nearest > 0.0 && (value - nearest).abs() <= nearest * COUNT_SNAP {
        nearest
    } else {
        value.ceil()
    };
    count.max(0.0) as u64
}

/// Interest income per user, by source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NiiBreakdown {
    /// Interest on installments until payout
    pub base: f64,
    /// Interest on fees until payout
    pub fee: f64,
    /// Interest on the principal of earlier installments still pooled
    pub pool_growth: f64,
}

impl NiiBreakdown {
    pub fn total(&self) -> f64 {
        self.base + self.fee + self.pool_growth
    }
}

/// Default counts and amounts for a cohort
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DefaultBreakdown {
    pub total_defaulters: u64,
    pub pre_payout: u64,
    pub post_payout: u64,
    /// Loss per pre-payout defaulter
    pub loss_pre: f64,
    /// Loss per post-payout defaulter
    pub loss_post: f64,
    pub gross_loss: f64,
    pub recovery: f64,
    pub net_loss: f64,
    pub fees_collected: f64,
}

/// Computes cohort financials from fixed financial and calendar terms
#[derive(Debug, Clone)]
pub struct AccrualEngine {
    financial: FinancialConfig,
    calendar: SimulationCalendar,
    collection_day: u32,
    disbursement_day: u32,
    nii_mode: NiiMode,
    recognize_default_fees: bool,
}

impl AccrualEngine {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            financial: config.financial.clone(),
            calendar: SimulationCalendar::from_config(&config.calendar),
            collection_day: config.calendar.collection_day,
            disbursement_day: config.calendar.disbursement_day,
            nii_mode: config.engine.nii_mode,
            recognize_default_fees: config.engine.recognize_default_fees,
        }
    }

    /// Build the cohort row. Commitment and fee are fixed here and never revisited.
    pub fn accrue(&self, key: CohortKey, users: u64, slot_fee: SlotFee) -> CohortRow {
        let fin = &self.financial;
        let duration = key.duration as f64;
        let slab = key.slab as f64;
        let user_count = users as f64;

        let commitment_per_user = duration * slab;
        let total_commitment = user_count * commitment_per_user;

        let fee_per_user = commitment_per_user * slot_fee.fee_pct / 100.0;
        let (fee_collected, monthly_fee_per_user) = match fin.fee_collection {
            FeeCollectionMode::Upfront => (total_commitment * slot_fee.fee_pct / 100.0, 0.0),
            FeeCollectionMode::Monthly => {
                let monthly = fee_per_user / duration;
                (monthly * user_count * duration, monthly)
            }
        };

        let nii = self.nii_per_user(key, fee_per_user, monthly_fee_per_user);
        let base_nii = nii.base * user_count;
        let fee_nii = nii.fee * user_count;
        let pool_growth_nii = nii.pool_growth * user_count;
        let total_nii = nii.total() * user_count;

        let defaults = self.defaults(users, commitment_per_user);

        let mut total_revenue = fee_collected + total_nii;
        if self.recognize_default_fees {
            total_revenue += defaults.fees_collected;
        }
        let gross_profit = total_revenue - defaults.net_loss;
        let party_a_share = gross_profit * fin.profit_split_pct / 100.0;
        let party_b_share = gross_profit * (100.0 - fin.profit_split_pct) / 100.0;

        CohortRow {
            month: key.join_month,
            year: (key.join_month - 1) / 12 + 1,
            duration: key.duration,
            slab: key.slab,
            slot: key.slot,
            users,
            fee_pct: slot_fee.fee_pct,
            commitment_per_user,
            total_commitment,
            fee_collected,
            monthly_fee_per_user,
            base_nii,
            fee_nii,
            pool_growth_nii,
            total_nii,
            total_defaulters: defaults.total_defaulters,
            pre_payout_defaulters: defaults.pre_payout,
            post_payout_defaulters: defaults.post_payout,
            default_loss: defaults.gross_loss,
            recovery: defaults.recovery,
            net_default_loss: defaults.net_loss,
            default_fees_collected: defaults.fees_collected,
            total_revenue,
            gross_profit,
            profit_margin_pct: percentage_of(gross_profit, total_revenue),
            party_a_share,
            party_b_share,
        }
    }

    /// Days installment `installment` (0-based) is held before the cohort's payout
    pub fn days_held(&self, key: CohortKey, installment: u32) -> i64 {
        self.calendar.holding_days(
            self.nii_mode,
            key.join_month.saturating_add(installment),
            self.collection_day,
            key.payout_month(),
            self.disbursement_day,
        )
    }

    /// Interest income for a single member of the cohort
    pub fn nii_per_user(&self, key: CohortKey, fee_per_user: f64, monthly_fee_per_user: f64) -> NiiBreakdown {
        let rate = self.financial.daily_rate();
        let slab = key.slab as f64;
        let mut nii = NiiBreakdown::default();

        if self.financial.fee_collection == FeeCollectionMode::Upfront {
            nii.fee = fee_per_user * rate * self.days_held(key, 0) as f64;
        }

        for j in 0..key.duration {
            let held = self.days_held(key, j) as f64;
            nii.base += slab * rate * held;

            if self.financial.fee_collection == FeeCollectionMode::Monthly {
                nii.fee += monthly_fee_per_user * rate * held;
            }

            // j earlier installments are already in the pool
            nii.pool_growth += j as f64 * slab * rate * held;
        }

        nii
    }

    /// Default counts and losses for a cohort of `users`
    pub fn defaults(&self, users: u64, commitment_per_user: f64) -> DefaultBreakdown {
        let fin = &self.financial;

        let total_defaulters = ceil_count(users as f64 * fin.default_rate_pct / 100.0).min(users);
        let pre_payout =
            ceil_count(total_defaulters as f64 * fin.pre_payout_default_pct / 100.0).min(total_defaulters);
        let post_payout = total_defaulters - pre_payout;

        let processing_fee = commitment_per_user * fin.default_fee_pct / 100.0;
        let refund = commitment_per_user * fin.penalty_pct / 100.0;
        let loss_pre = commitment_per_user - refund + processing_fee;
        let loss_post = commitment_per_user + processing_fee;

        let gross_loss = pre_payout as f64 * loss_pre + post_payout as f64 * loss_post;
        let recovery = gross_loss * fin.recovery_rate_pct / 100.0;

        DefaultBreakdown {
            total_defaulters,
            pre_payout,
            post_payout,
            loss_pre,
            loss_post,
            gross_loss,
            recovery,
            net_loss: gross_loss - recovery,
            fees_collected: total_defaulters as f64 * processing_fee,
        }
    }
}
