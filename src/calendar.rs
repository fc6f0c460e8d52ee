//! Month-index calendar and day counts for interest accrual
//!
//! Simulation months are 1-based indices from the configured start month.
//! Days of month that do not exist (Feb 30) are clamped to month end, and
//! day counts never go negative.

use crate::config::{CalendarConfig, NiiMode};
use chrono::{Datelike, NaiveDate};

/// Convert a 1-based month index into a calendar (year, month)
pub fn month_index_to_year_month(start_year: i32, start_month: u32, month_index: u32) -> (i32, u32) {
    let start_month = start_month.clamp(1, 12);
    let offset = (start_month - 1) as i64 + month_index.saturating_sub(1) as i64;
    let year = start_year + (offset / 12) as i32;
    let month = (offset % 12) as u32 + 1;
    (year, month)
}

/// Number of days in a calendar month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let month = month.clamp(1, 12);
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Build a date, clamping the day into the month
pub fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let month = month.clamp(1, 12);
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// Days from (month1, day1) to (month2, day2) for a simulation starting in
/// January of `start_year`. Returns 0 when the end precedes the start.
pub fn days_between(month1: u32, day1: u32, month2: u32, day2: u32, start_year: i32) -> i64 {
    SimulationCalendar::new(start_year, 1).days_between(month1, day1, month2, day2)
}

/// 30-day-month approximation of [`days_between`]
pub fn approx_days_between(month1: u32, day1: u32, month2: u32, day2: u32) -> i64 {
    let day1 = day1.clamp(1, 30) as i64;
    let day2 = day2.clamp(1, 30) as i64;
    let days = (month2 as i64 - month1 as i64) * 30 + (day2 - day1);
    days.max(0)
}

/// Calendar anchored at the simulation start month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationCalendar {
    pub start_year: i32,
    pub start_month: u32,
}

impl SimulationCalendar {
    pub fn new(start_year: i32, start_month: u32) -> Self {
        Self { start_year, start_month }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(config.start_year, config.start_month)
    }

    pub fn year_month(&self, month_index: u32) -> (i32, u32) {
        month_index_to_year_month(self.start_year, self.start_month, month_index)
    }

    /// Calendar date of a day within a simulation month
    pub fn date(&self, month_index: u32, day: u32) -> NaiveDate {
        let (year, month) = self.year_month(month_index);
        clamped_date(year, month, day)
    }

    pub fn days_between(&self, month1: u32, day1: u32, month2: u32, day2: u32) -> i64 {
        let start = self.date(month1, day1);
        let end = self.date(month2, day2);
        end.signed_duration_since(start).num_days().max(0)
    }

    /// Day count under the selected interest mode
    pub fn holding_days(&self, mode: NiiMode, month1: u32, day1: u32, month2: u32, day2: u32) -> i64 {
        match mode {
            NiiMode::ExactCalendarDays => self.days_between(month1, day1, month2, day2),
            NiiMode::Approximate30Day => approx_days_between(month1, day1, month2, day2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_index_to_year_month() {
        assert_eq!(month_index_to_year_month(2025, 1, 1), (2025, 1));
        assert_eq!(month_index_to_year_month(2025, 1, 12), (2025, 12));
        assert_eq!(month_index_to_year_month(2025, 1, 13), (2026, 1));
        assert_eq!(month_index_to_year_month(2025, 7, 7), (2026, 1));
        assert_eq!(month_index_to_year_month(2025, 1, 60), (2029, 12));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 12), 31);
    }

    #[test]
    fn test_invalid_day_clamps_to_month_end() {
        assert_eq!(clamped_date(2025, 2, 30), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(clamped_date(2024, 2, 31), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(clamped_date(2025, 4, 0), NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());

        // Feb 30 -> Mar 1 is one day in a non-leap year
        assert_eq!(days_between(2, 30, 3, 1, 2025), 1);
    }

    #[test]
    fn test_days_between_same_point_is_zero() {
        for month in [1, 2, 14, 59] {
            for day in [1, 15, 28, 31] {
                assert_eq!(days_between(month, day, month, day, 2025), 0);
            }
        }
    }

    #[test]
    fn test_days_between_counts_calendar_days() {
        assert_eq!(days_between(1, 1, 1, 10, 2025), 9);
        assert_eq!(days_between(1, 1, 2, 1, 2025), 31);
        assert_eq!(days_between(1, 1, 13, 1, 2025), 365);
        assert_eq!(days_between(1, 1, 13, 1, 2024), 366);
    }

    #[test]
    fn test_end_before_start_is_zero() {
        assert_eq!(days_between(3, 1, 1, 10, 2025), 0);
        assert_eq!(approx_days_between(3, 1, 1, 10), 0);
    }

    #[test]
    fn test_days_between_is_monotonic_in_end() {
        let mut last = 0;
        for month in 1..=24 {
            for day in [1, 10, 28, 31] {
                let days = days_between(1, 15, month, day, 2025);
                assert!(days >= last, "month {} day {}: {} < {}", month, day, days, last);
                last = days;
            }
        }
    }

    #[test]
    fn test_approx_uses_thirty_day_months() {
        assert_eq!(approx_days_between(1, 1, 1, 10), 9);
        assert_eq!(approx_days_between(1, 1, 3, 1), 60);
        assert_eq!(approx_days_between(1, 31, 2, 31), 30);
    }

    #[test]
    fn test_calendar_with_mid_year_start() {
        let cal = SimulationCalendar::new(2025, 11);
        assert_eq!(cal.date(1, 1), NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(cal.date(4, 31), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(cal.holding_days(NiiMode::ExactCalendarDays, 1, 1, 2, 1), 30);
        assert_eq!(cal.holding_days(NiiMode::Approximate30Day, 1, 1, 2, 1), 30);
    }
}
