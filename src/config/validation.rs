//! Pre-flight validation of a forecast configuration
//!
//! Every problem found is reported; nothing is clamped or corrected. The
//! engines trust their input once this passes.

use super::{
    ForecastConfig, ProductConfig, HORIZON_MONTHS, MAX_DURATION_MONTHS, MAX_USER_BASE,
};
use crate::error::{ForecastError, Result};

/// Upper bound on month x slot cells a single run may evaluate
pub const MAX_COHORT_CELLS: u64 = 2_000_000;

/// Upper bound on installment accruals a single run may evaluate
pub const MAX_INSTALLMENT_STEPS: u64 = 20_000_000;

/// Allowed drift when checking that shares sum to 100%
const SHARE_TOLERANCE: f64 = 0.01;

/// Validate a configuration, collecting every error message
pub fn validate(config: &ForecastConfig) -> Result<()> {
    let mut errors = Vec::new();

    check_rates(config, &mut errors);
    check_calendar(config, &mut errors);
    check_product(&config.product, &mut errors);

    let cells = config.product.slot_cell_count() * HORIZON_MONTHS as u64;
    if cells > MAX_COHORT_CELLS {
        errors.push(format!(
            "product structure too large: {} month x slot cells exceeds the limit of {}",
            cells, MAX_COHORT_CELLS
        ));
    }

    let steps = config
        .product
        .installment_step_count()
        .saturating_mul(HORIZON_MONTHS as u64);
    if steps > MAX_INSTALLMENT_STEPS {
        errors.push(format!(
            "product structure too large: {} installment accruals exceeds the limit of {}",
            steps, MAX_INSTALLMENT_STEPS
        ));
    }

    check_user_base(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        log::warn!("configuration rejected with {} error(s)", errors.len());
        Err(ForecastError::Configuration(errors))
    }
}

fn check_pct(name: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        errors.push(format!("{} must be within [0, 100], got {}", name, value));
    }
}

fn check_rates(config: &ForecastConfig, errors: &mut Vec<String>) {
    let market = &config.market;
    check_pct("TAM %", market.tam_pct, errors);
    check_pct("starting user %", market.starting_user_pct, errors);
    check_pct("annual TAM growth %", market.annual_tam_growth_pct, errors);
    if !market.total_market.is_finite() || market.total_market < 0.0 {
        errors.push(format!("total market must be non-negative, got {}", market.total_market));
    }

    let lifecycle = &config.lifecycle;
    check_pct("monthly growth %", lifecycle.monthly_growth_pct, errors);
    for (i, rate) in lifecycle.yearly_growth_rates.iter().enumerate() {
        check_pct(&format!("year {} growth %", i + 1), *rate, errors);
    }
    check_pct("returning user %", lifecycle.returning_user_pct, errors);
    if lifecycle.rest_period_months > HORIZON_MONTHS {
        errors.push(format!(
            "rest period must be at most {} months, got {}",
            HORIZON_MONTHS, lifecycle.rest_period_months
        ));
    }
    check_pct("churn %", lifecycle.churn_pct, errors);

    let fin = &config.financial;
    check_pct("base rate %", fin.base_rate_pct, errors);
    check_pct("spread %", fin.spread_pct, errors);
    check_pct("default rate %", fin.default_rate_pct, errors);
    check_pct("pre-payout default %", fin.pre_payout_default_pct, errors);
    check_pct("recovery rate %", fin.recovery_rate_pct, errors);
    check_pct("penalty %", fin.penalty_pct, errors);
    check_pct("default fee %", fin.default_fee_pct, errors);
    check_pct("profit split %", fin.profit_split_pct, errors);
}

fn check_user_base(config: &ForecastConfig, errors: &mut Vec<String>) {
    let starting = config.starting_users();
    if starting > MAX_USER_BASE {
        errors.push(format!(
            "starting users must be at most {}, got {}",
            MAX_USER_BASE, starting
        ));
        return;
    }
    let peak = config.projected_user_base();
    if !peak.is_finite() || peak > MAX_USER_BASE as f64 {
        errors.push(format!(
            "growth schedule reaches {:.3e} users within {} months, above the limit of {}",
            peak, HORIZON_MONTHS, MAX_USER_BASE
        ));
    }
}

fn check_calendar(config: &ForecastConfig, errors: &mut Vec<String>) {
    let cal = &config.calendar;
    if !(1..=12).contains(&cal.start_month) {
        errors.push(format!("start month must be within 1..=12, got {}", cal.start_month));
    }
    if !(1..=31).contains(&cal.collection_day) {
        errors.push(format!("collection day must be within 1..=31, got {}", cal.collection_day));
    }
    if !(1..=31).contains(&cal.disbursement_day) {
        errors.push(format!("disbursement day must be within 1..=31, got {}", cal.disbursement_day));
    }
}

fn sums_to_100(total: f64) -> bool {
    (total - 100.0).abs() <= SHARE_TOLERANCE
}

fn check_product(product: &ProductConfig, errors: &mut Vec<String>) {
    if product.durations.is_empty() {
        errors.push("at least one duration is required".to_string());
        return;
    }

    for (i, &duration) in product.durations.iter().enumerate() {
        if duration == 0 {
            errors.push("durations must be positive".to_string());
        }
        if duration > MAX_DURATION_MONTHS {
            errors.push(format!(
                "duration {}M exceeds the maximum of {} months",
                duration, MAX_DURATION_MONTHS
            ));
        }
        if product.durations[..i].contains(&duration) {
            errors.push(format!("duration {}M is listed more than once", duration));
        }
    }

    if !product.duration_allocation.is_empty() {
        for (&duration, &share) in &product.duration_allocation {
            check_pct(&format!("{}M allocation %", duration), share, errors);
            if !product.durations.contains(&duration) {
                errors.push(format!("allocation given for unknown duration {}M", duration));
            }
        }
        let total: f64 = product.duration_shares().iter().map(|(_, s)| s).sum();
        if !sums_to_100(total) {
            errors.push(format!("duration allocation must sum to 100%, got {:.2}%", total));
        }
    }

    for &duration in product.durations.iter().filter(|&&d| d > 0 && d <= MAX_DURATION_MONTHS) {
        check_duration(product, duration, errors);
    }
}

fn check_duration(product: &ProductConfig, duration: u32, errors: &mut Vec<String>) {
    let slabs = product.slabs_for(duration);
    if slabs.is_empty() {
        errors.push(format!("{}M has no slab amounts", duration));
        return;
    }
    if slabs.contains(&0) {
        errors.push(format!("{}M has a zero slab amount", duration));
    }

    if let Some(shares) = product.slab_allocation.get(&duration).filter(|s| !s.is_empty()) {
        for (&slab, &share) in shares {
            check_pct(&format!("{}M slab {} allocation %", duration, slab), share, errors);
        }
        let total: f64 = product.slab_shares(duration).iter().map(|(_, s)| s).sum();
        if !sums_to_100(total) {
            errors.push(format!("{}M slab allocation must sum to 100%, got {:.2}%", duration, total));
        }
    }

    for &slab in slabs {
        let Some(slots) = product.slots_for(duration, slab) else {
            continue;
        };

        let mut open_total = 0.0;
        let mut has_open = false;
        for (&slot, fee) in slots {
            if slot == 0 || slot > duration {
                errors.push(format!(
                    "{}M slab {}: slot {} is outside 1..={}",
                    duration, slab, slot, duration
                ));
                continue;
            }
            check_pct(&format!("{}M slab {} slot {} fee %", duration, slab, slot), fee.fee_pct, errors);
            if fee.blocked {
                continue;
            }
            let share = product.slot_share(duration, slab, slot);
            check_pct(
                &format!("{}M slab {} slot {} distribution %", duration, slab, slot),
                share,
                errors,
            );
            open_total += share;
            has_open = true;
        }

        if has_open && !sums_to_100(open_total) {
            errors.push(format!(
                "{}M slab {}: slot distribution must sum to 100% across unblocked slots, got {:.2}%",
                duration, slab, open_total
            ));
        }
    }
}
