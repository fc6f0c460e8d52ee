//! Forecast configuration: market, lifecycle, product structure, financial terms

mod validation;
mod request;
pub mod loader;

pub use validation::{validate, MAX_COHORT_CELLS, MAX_INSTALLMENT_STEPS};
pub use request::ForecastRequest;
pub use loader::{load_slot_matrix, SlotMatrixRow};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Simulation horizon in months
pub const HORIZON_MONTHS: u32 = 60;

/// Largest cumulative user base a run may reach
pub const MAX_USER_BASE: u64 = 1_000_000_000_000;

/// Longest committee duration accepted, in months
pub const MAX_DURATION_MONTHS: u32 = 120;

/// Installment amounts offered by default for every duration
pub const DEFAULT_SLABS: [u64; 8] = [1000, 2000, 5000, 10000, 15000, 20000, 25000, 50000];

/// Committee durations offered by default, with their share of new users (%)
pub const DEFAULT_DURATION_ALLOCATION: [(u32, f64); 6] = [
    (3, 30.0),
    (4, 25.0),
    (5, 15.0),
    (6, 10.0),
    (8, 10.0),
    (10, 10.0),
];

/// Complete, immutable input to a forecast run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub product: ProductConfig,

    #[serde(default)]
    pub financial: FinancialConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub engine: EngineOptions,
}

/// Market sizing used by the TAM-driven user model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Total market size (people)
    pub total_market: f64,

    /// Share of the market that is addressable (%)
    pub tam_pct: f64,

    /// Share of TAM onboarded in month 1 (%)
    pub starting_user_pct: f64,

    /// TAM growth applied every 12 months (%)
    pub annual_tam_growth_pct: f64,

    /// Cap the cumulative user base at the current TAM
    pub enforce_tam_cap: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            total_market: 20_000_000.0,
            tam_pct: 10.0,
            starting_user_pct: 10.0,
            annual_tam_growth_pct: 0.0,
            enforce_tam_cap: false,
        }
    }
}

impl MarketConfig {
    /// Addressable market in month 1
    pub fn initial_tam(&self) -> f64 {
        self.total_market * self.tam_pct / 100.0
    }

    /// TAM in a horizon month; grows once every 12 months
    pub fn tam_for_month(&self, month: u32) -> f64 {
        let years = (month.saturating_sub(1) / 12) as i32;
        self.initial_tam() * (1.0 + self.annual_tam_growth_pct / 100.0).powi(years)
    }

    /// Users onboarded in month 1 under the TAM model
    pub fn tam_starting_users(&self) -> u64 {
        (self.initial_tam() * self.starting_user_pct / 100.0).floor().max(0.0) as u64
    }
}

/// User acquisition and return behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Users active in month 1
    pub starting_users: u64,

    /// Monthly growth of the cumulative user base (%)
    pub monthly_growth_pct: f64,

    /// Optional per-year monthly growth rates (%), year 1 first.
    /// Years past the end reuse the last entry.
    pub yearly_growth_rates: Vec<f64>,

    /// Months a member must sit out after a committee completes
    pub rest_period_months: u32,

    /// Share of completing members who come back (%)
    pub returning_user_pct: f64,

    /// Share of would-be returners lost to churn (%)
    pub churn_pct: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            starting_users: 200_000,
            monthly_growth_pct: 2.0,
            yearly_growth_rates: Vec::new(),
            rest_period_months: 1,
            returning_user_pct: 80.0,
            churn_pct: 5.0,
        }
    }
}

impl LifecycleConfig {
    /// Monthly growth rate (%) in effect for a 1-based month index
    pub fn growth_pct_for_month(&self, month: u32) -> f64 {
        if self.yearly_growth_rates.is_empty() {
            return self.monthly_growth_pct;
        }
        let year_idx = (month.saturating_sub(1) / 12) as usize;
        let idx = year_idx.min(self.yearly_growth_rates.len() - 1);
        self.yearly_growth_rates[idx]
    }
}

/// Fee and block status of one payout slot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotFee {
    #[serde(alias = "feePct")]
    pub fee_pct: f64,
    #[serde(default)]
    pub blocked: bool,
}

impl SlotFee {
    pub fn open(fee_pct: f64) -> Self {
        Self { fee_pct, blocked: false }
    }

    pub fn blocked() -> Self {
        Self { fee_pct: 0.0, blocked: true }
    }
}

/// Product hierarchy: durations -> slabs -> slots.
///
/// A `product` section given in JSON replaces the default product entirely;
/// fields it leaves out are empty rather than defaulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Committee lengths in months
    #[serde(default)]
    pub durations: Vec<u32>,

    /// Share of monthly active users per duration (%). Empty means equal split.
    #[serde(default)]
    pub duration_allocation: BTreeMap<u32, f64>,

    /// Installment amounts offered per duration
    #[serde(default)]
    pub slab_amounts: BTreeMap<u32, Vec<u64>>,

    /// Share of a duration's users per slab (%). Missing durations split equally.
    #[serde(default)]
    pub slab_allocation: BTreeMap<u32, BTreeMap<u64, f64>>,

    /// duration -> slab -> slot -> fee record
    #[serde(default)]
    pub slot_fees: BTreeMap<u32, BTreeMap<u64, BTreeMap<u32, SlotFee>>>,

    /// duration -> slab -> slot -> share of users (%), over unblocked slots
    #[serde(default)]
    pub slot_distribution: BTreeMap<u32, BTreeMap<u64, BTreeMap<u32, f64>>>,
}

impl Default for ProductConfig {
    fn default() -> Self {
        let mut product = ProductConfig::empty();

        for &(duration, share) in DEFAULT_DURATION_ALLOCATION.iter() {
            product.durations.push(duration);
            product.duration_allocation.insert(duration, share);
            product.slab_amounts.insert(duration, DEFAULT_SLABS.to_vec());

            let equal_share = 100.0 / duration as f64;
            for &slab in DEFAULT_SLABS.iter() {
                for slot in 1..=duration {
                    let fee = if slot <= 10 { (11 - slot) as f64 } else { 0.0 };
                    product.set_slot(duration, slab, slot, SlotFee::open(fee), equal_share);
                }
            }
        }

        product
    }
}

impl ProductConfig {
    /// A product with no durations configured
    pub fn empty() -> Self {
        Self {
            durations: Vec::new(),
            duration_allocation: BTreeMap::new(),
            slab_amounts: BTreeMap::new(),
            slab_allocation: BTreeMap::new(),
            slot_fees: BTreeMap::new(),
            slot_distribution: BTreeMap::new(),
        }
    }

    /// Insert or replace one slot's fee record and distribution share
    pub fn set_slot(&mut self, duration: u32, slab: u64, slot: u32, fee: SlotFee, distribution_pct: f64) {
        self.slot_fees
            .entry(duration)
            .or_default()
            .entry(slab)
            .or_default()
            .insert(slot, fee);
        self.slot_distribution
            .entry(duration)
            .or_default()
            .entry(slab)
            .or_default()
            .insert(slot, distribution_pct);
    }

    pub fn slabs_for(&self, duration: u32) -> &[u64] {
        self.slab_amounts.get(&duration).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn slots_for(&self, duration: u32, slab: u64) -> Option<&BTreeMap<u32, SlotFee>> {
        self.slot_fees.get(&duration).and_then(|by_slab| by_slab.get(&slab))
    }

    pub fn slot_fee(&self, duration: u32, slab: u64, slot: u32) -> Option<SlotFee> {
        self.slots_for(duration, slab).and_then(|slots| slots.get(&slot)).copied()
    }

    /// Distribution share for a slot (%); 0 when not configured
    pub fn slot_share(&self, duration: u32, slab: u64, slot: u32) -> f64 {
        self.slot_distribution
            .get(&duration)
            .and_then(|by_slab| by_slab.get(&slab))
            .and_then(|by_slot| by_slot.get(&slot))
            .copied()
            .unwrap_or(0.0)
    }

    /// Duration shares in configuration order; equal split when none are given
    pub fn duration_shares(&self) -> Vec<(u32, f64)> {
        if self.duration_allocation.is_empty() {
            let equal = 100.0 / self.durations.len().max(1) as f64;
            return self.durations.iter().map(|&d| (d, equal)).collect();
        }
        self.durations
            .iter()
            .map(|&d| (d, self.duration_allocation.get(&d).copied().unwrap_or(0.0)))
            .collect()
    }

    /// Slab shares for a duration; equal split when none are given
    pub fn slab_shares(&self, duration: u32) -> Vec<(u64, f64)> {
        let slabs = self.slabs_for(duration);
        match self.slab_allocation.get(&duration) {
            Some(shares) if !shares.is_empty() => slabs
                .iter()
                .map(|&s| (s, shares.get(&s).copied().unwrap_or(0.0)))
                .collect(),
            _ => {
                let equal = 100.0 / slabs.len().max(1) as f64;
                slabs.iter().map(|&s| (s, equal)).collect()
            }
        }
    }

    /// Slot shares for a (duration, slab): blocked and 0% slots are left out
    pub fn slot_shares(&self, duration: u32, slab: u64) -> Vec<(u32, f64)> {
        let Some(slots) = self.slots_for(duration, slab) else {
            return Vec::new();
        };
        slots
            .iter()
            .filter(|(_, fee)| !fee.blocked)
            .map(|(&slot, _)| (slot, self.slot_share(duration, slab, slot)))
            .filter(|&(_, share)| share > 0.0)
            .collect()
    }

    /// Number of configured slots across the whole hierarchy
    pub fn slot_cell_count(&self) -> u64 {
        self.slot_fees
            .values()
            .flat_map(|by_slab| by_slab.values())
            .map(|slots| slots.len() as u64)
            .sum()
    }

    /// Installments accrued per horizon month if every slot is populated
    pub fn installment_step_count(&self) -> u64 {
        self.slot_fees
            .iter()
            .flat_map(|(&duration, by_slab)| {
                by_slab.values().map(move |slots| slots.len() as u64 * duration as u64)
            })
            .fold(0u64, u64::saturating_add)
    }
}

/// Interest, default and revenue-split terms. All rates are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialConfig {
    /// Benchmark rate (KIBOR)
    pub base_rate_pct: f64,
    pub spread_pct: f64,
    pub default_rate_pct: f64,
    /// Share of defaulters who default before their payout
    pub pre_payout_default_pct: f64,
    pub recovery_rate_pct: f64,
    /// Share of commitment refunded to a pre-payout defaulter
    pub penalty_pct: f64,
    /// Processing fee charged on a defaulted commitment
    pub default_fee_pct: f64,
    /// Party A's share of gross profit; Party B gets the rest
    pub profit_split_pct: f64,
    pub fee_collection: FeeCollectionMode,
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            base_rate_pct: 11.0,
            spread_pct: 5.0,
            default_rate_pct: 1.0,
            pre_payout_default_pct: 50.0,
            recovery_rate_pct: 0.0,
            penalty_pct: 0.0,
            default_fee_pct: 0.0,
            profit_split_pct: 50.0,
            fee_collection: FeeCollectionMode::Upfront,
        }
    }
}

impl FinancialConfig {
    pub fn post_payout_default_pct(&self) -> f64 {
        100.0 - self.pre_payout_default_pct
    }

    /// Simple daily interest rate earned on pooled funds
    pub fn daily_rate(&self) -> f64 {
        (self.base_rate_pct + self.spread_pct) / 100.0 / 365.0
    }
}

/// When the committee fee is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeCollectionMode {
    /// Whole fee on total commitment, charged in the join month
    #[default]
    Upfront,
    /// Fee amortized evenly and charged with each installment
    Monthly,
}

/// Simulation start and the monthly collection/payout days
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub start_year: i32,
    pub start_month: u32,
    /// Day of month installments are collected
    pub collection_day: u32,
    /// Day of month the pool is paid out
    pub disbursement_day: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_year: 2025,
            start_month: 1,
            collection_day: 1,
            disbursement_day: 10,
        }
    }
}

/// Engine strategy selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub nii_mode: NiiMode,
    pub user_model: UserModel,
    /// Count default processing fees collected as revenue
    pub recognize_default_fees: bool,
}

/// Day-count method for interest income
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NiiMode {
    /// 30-day months
    #[serde(rename = "approximate_30_day")]
    Approximate30Day,
    /// Actual calendar days between collection and payout
    #[default]
    ExactCalendarDays,
}

/// How the monthly active population is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserModel {
    /// Starting users compounded by the growth rate; no returns
    SimpleGrowth,
    /// Starting users derived from TAM, optionally capped by it; no returns
    TamHierarchical,
    /// Simple growth plus rest periods and automatic rejoining
    #[default]
    CohortLifecycle,
}

impl UserModel {
    pub fn schedules_returns(&self) -> bool {
        matches!(self, UserModel::CohortLifecycle)
    }
}

impl ForecastConfig {
    /// Starting users for the selected user model
    pub fn starting_users(&self) -> u64 {
        match self.engine.user_model {
            UserModel::TamHierarchical => self.market.tam_starting_users(),
            UserModel::SimpleGrowth | UserModel::CohortLifecycle => self.lifecycle.starting_users,
        }
    }

    /// Largest cumulative user base the growth schedule reaches over the horizon
    pub fn projected_user_base(&self) -> f64 {
        let caps = self.engine.user_model == UserModel::TamHierarchical && self.market.enforce_tam_cap;
        let mut base = self.starting_users() as f64;
        let mut peak = base;
        for month in 2..=HORIZON_MONTHS {
            base *= 1.0 + self.lifecycle.growth_pct_for_month(month) / 100.0;
            if caps {
                base = base.min(self.market.tam_for_month(month));
            }
            peak = peak.max(base);
        }
        peak
    }
}
