//! Flat request record accepted by the JSON surfaces

use super::{
    CalendarConfig, EngineOptions, FeeCollectionMode, FinancialConfig, ForecastConfig,
    LifecycleConfig, MarketConfig, NiiMode, ProductConfig, SlotFee, UserModel,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Forecast request with the field names used by the presentation layer.
///
/// Omitted fields take the same defaults as [`ForecastConfig::default`];
/// omitting `durations` keeps the default product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    #[serde(default)]
    pub durations: Vec<u32>,
    #[serde(default)]
    pub duration_allocation: BTreeMap<u32, f64>,
    #[serde(default)]
    pub slab_amounts: BTreeMap<u32, Vec<u64>>,
    #[serde(default)]
    pub slab_allocation: BTreeMap<u32, BTreeMap<u64, f64>>,
    #[serde(default)]
    pub slot_fees: BTreeMap<u32, BTreeMap<u64, BTreeMap<u32, SlotFee>>>,
    #[serde(default)]
    pub slot_distribution: BTreeMap<u32, BTreeMap<u64, BTreeMap<u32, f64>>>,

    pub base_rate: Option<f64>,
    pub spread: Option<f64>,
    pub default_rate: Option<f64>,
    pub pre_payout_default_pct: Option<f64>,
    pub recovery_rate: Option<f64>,
    pub penalty_pct: Option<f64>,
    pub default_fee_rate: Option<f64>,
    pub profit_split_pct: Option<f64>,
    pub fee_collection_mode: Option<FeeCollectionMode>,

    pub starting_users: Option<u64>,
    pub monthly_growth_rate: Option<f64>,
    #[serde(default)]
    pub yearly_growth_rates: Vec<f64>,
    pub rest_period_months: Option<u32>,
    pub returning_user_rate: Option<f64>,
    pub churn_rate: Option<f64>,

    pub total_market: Option<f64>,
    pub tam_pct: Option<f64>,
    pub starting_user_pct: Option<f64>,
    pub annual_tam_growth_rate: Option<f64>,
    #[serde(default)]
    pub enforce_tam_cap: bool,

    pub start_year: Option<i32>,
    pub start_month: Option<u32>,
    pub collection_day: Option<u32>,
    pub disbursement_day: Option<u32>,

    pub nii_calculation_mode: Option<NiiMode>,
    pub user_model: Option<UserModel>,
    #[serde(default)]
    pub recognize_default_fees: bool,
}

impl From<ForecastRequest> for ForecastConfig {
    fn from(req: ForecastRequest) -> Self {
        let product = if req.durations.is_empty() {
            ProductConfig::default()
        } else {
            ProductConfig {
                durations: req.durations,
                duration_allocation: req.duration_allocation,
                slab_amounts: req.slab_amounts,
                slab_allocation: req.slab_allocation,
                slot_fees: req.slot_fees,
                slot_distribution: req.slot_distribution,
            }
        };

        let fin = FinancialConfig::default();
        let financial = FinancialConfig {
            base_rate_pct: req.base_rate.unwrap_or(fin.base_rate_pct),
            spread_pct: req.spread.unwrap_or(fin.spread_pct),
            default_rate_pct: req.default_rate.unwrap_or(fin.default_rate_pct),
            pre_payout_default_pct: req.pre_payout_default_pct.unwrap_or(fin.pre_payout_default_pct),
            recovery_rate_pct: req.recovery_rate.unwrap_or(fin.recovery_rate_pct),
            penalty_pct: req.penalty_pct.unwrap_or(fin.penalty_pct),
            default_fee_pct: req.default_fee_rate.unwrap_or(fin.default_fee_pct),
            profit_split_pct: req.profit_split_pct.unwrap_or(fin.profit_split_pct),
            fee_collection: req.fee_collection_mode.unwrap_or(fin.fee_collection),
        };

        let life = LifecycleConfig::default();
        let lifecycle = LifecycleConfig {
            starting_users: req.starting_users.unwrap_or(life.starting_users),
            monthly_growth_pct: req.monthly_growth_rate.unwrap_or(life.monthly_growth_pct),
            yearly_growth_rates: req.yearly_growth_rates,
            rest_period_months: req.rest_period_months.unwrap_or(life.rest_period_months),
            returning_user_pct: req.returning_user_rate.unwrap_or(life.returning_user_pct),
            churn_pct: req.churn_rate.unwrap_or(life.churn_pct),
        };

        let mkt = MarketConfig::default();
        let market = MarketConfig {
            total_market: req.total_market.unwrap_or(mkt.total_market),
            tam_pct: req.tam_pct.unwrap_or(mkt.tam_pct),
            starting_user_pct: req.starting_user_pct.unwrap_or(mkt.starting_user_pct),
            annual_tam_growth_pct: req.annual_tam_growth_rate.unwrap_or(mkt.annual_tam_growth_pct),
            enforce_tam_cap: req.enforce_tam_cap,
        };

        let cal = CalendarConfig::default();
        let calendar = CalendarConfig {
            start_year: req.start_year.unwrap_or(cal.start_year),
            start_month: req.start_month.unwrap_or(cal.start_month),
            collection_day: req.collection_day.unwrap_or(cal.collection_day),
            disbursement_day: req.disbursement_day.unwrap_or(cal.disbursement_day),
        };

        let engine = EngineOptions {
            nii_mode: req.nii_calculation_mode.unwrap_or_default(),
            user_model: req.user_model.unwrap_or_default(),
            recognize_default_fees: req.recognize_default_fees,
        };

        ForecastConfig {
            market,
            lifecycle,
            product,
            financial,
            calendar,
            engine,
        }
    }
}
