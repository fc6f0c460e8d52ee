//! Guarded ratio helpers; a zero or non-finite denominator yields 0

/// `part / whole * 100`, or 0 when `whole` is 0
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let pct = part / whole * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

/// Period-over-period growth in percent, or 0 when `previous` is 0
pub fn growth_pct(current: f64, previous: f64) -> f64 {
    percentage_of(current - previous, previous)
}
