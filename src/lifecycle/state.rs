//! Mutable lifecycle state carried from month to month

use std::collections::BTreeMap;

/// Users due back from rest, keyed by the month they rejoin.
///
/// Returns past the horizon are refused and never stored.
#[derive(Debug, Clone, Default)]
pub struct ReturnSchedule {
    horizon: u32,
    due: BTreeMap<u32, u64>,
}

impl ReturnSchedule {
    pub fn new(horizon: u32) -> Self {
        Self {
            horizon,
            due: BTreeMap::new(),
        }
    }

    /// Schedule `users` to rejoin in `month`; false when past the horizon
    pub fn schedule(&mut self, month: u32, users: u64) -> bool {
        if month > self.horizon {
            return false;
        }
        if users > 0 {
            *self.due.entry(month).or_insert(0) += users;
        }
        true
    }

    /// Remove and return the users due in `month`
    pub fn take(&mut self, month: u32) -> u64 {
        self.due.remove(&month).unwrap_or(0)
    }

    /// Total users still waiting to rejoin
    pub fn pending(&self) -> u64 {
        self.due.values().sum()
    }
}

/// State of the user base during a lifecycle projection
#[derive(Debug, Clone)]
pub struct LifecycleState {
    /// Current month (1-indexed, 0 before the first month)
    pub month: u32,

    /// Cumulative acquired user base
    pub total_users: u64,

    /// Addressable market in the current month
    pub tam: f64,

    pub return_schedule: ReturnSchedule,

    /// Users entering rest, by month
    pub resting: BTreeMap<u32, u64>,

    /// Users leaving for good after completing a committee, by month
    pub churned: BTreeMap<u32, u64>,

    /// Users whose return fell beyond the horizon
    pub dropped_returns: u64,
}

impl LifecycleState {
    pub fn new(horizon: u32, initial_tam: f64) -> Self {
        Self {
            month: 0,
            total_users: 0,
            tam: initial_tam,
            return_schedule: ReturnSchedule::new(horizon),
            resting: BTreeMap::new(),
            churned: BTreeMap::new(),
            dropped_returns: 0,
        }
    }

    pub fn advance_month(&mut self) {
        self.month += 1;
    }

    pub fn add_resting(&mut self, month: u32, users: u64) {
        *self.resting.entry(month).or_insert(0) += users;
    }

    pub fn add_churned(&mut self, month: u32, users: u64) {
        *self.churned.entry(month).or_insert(0) += users;
    }

    pub fn resting_in(&self, month: u32) -> u64 {
        self.resting.get(&month).copied().unwrap_or(0)
    }

    pub fn churned_in(&self, month: u32) -> u64 {
        self.churned.get(&month).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_within_horizon() {
        let mut schedule = ReturnSchedule::new(60);
        assert!(schedule.schedule(4, 100));
        assert!(schedule.schedule(4, 20));
        assert!(schedule.schedule(60, 5));

        assert_eq!(schedule.pending(), 125);
        assert_eq!(schedule.take(4), 120);
        assert_eq!(schedule.take(4), 0);
        assert_eq!(schedule.pending(), 5);
    }

    #[test]
    fn test_schedule_beyond_horizon_is_refused() {
        let mut schedule = ReturnSchedule::new(60);
        assert!(!schedule.schedule(61, 100));
        assert!(!schedule.schedule(u32::MAX, 100));
        assert_eq!(schedule.take(61), 0);
        assert_eq!(schedule.pending(), 0);
    }

    #[test]
    fn test_state_counters() {
        let mut state = LifecycleState::new(60, 1000.0);
        state.advance_month();
        state.add_resting(4, 10);
        state.add_resting(4, 5);
        state.add_churned(4, 2);

        assert_eq!(state.month, 1);
        assert_eq!(state.resting_in(4), 15);
        assert_eq!(state.churned_in(4), 2);
        assert_eq!(state.resting_in(5), 0);
    }
}
