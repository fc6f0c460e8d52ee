//! Lifecycle output tables

use serde::{Deserialize, Serialize};

/// User counts for one simulated month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleRow {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Year")]
    pub year: u32,
    #[serde(rename = "TAM")]
    pub tam: f64,
    #[serde(rename = "Total Users")]
    pub total_users: u64,
    #[serde(rename = "New Users")]
    pub new_users: u64,
    #[serde(rename = "Returning Users")]
    pub returning_users: u64,
    /// New plus returning users joining a committee this month
    #[serde(rename = "Active Users")]
    pub active_users: u64,
    /// Users who completed a committee this month and are sitting out
    #[serde(rename = "Resting Users")]
    pub resting_users: u64,
    /// Users who completed a committee this month and will not return
    #[serde(rename = "Churned Users")]
    pub churned_users: u64,
}

/// Active users of one month assigned to one duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortStart {
    #[serde(rename = "Month")]
    pub month: u32,
    #[serde(rename = "Duration")]
    pub duration: u32,
    #[serde(rename = "Users")]
    pub users: u64,
}

/// One return-scheduling decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLogRow {
    #[serde(rename = "Source Month")]
    pub source_month: u32,
    #[serde(rename = "Duration")]
    pub duration: u32,
    #[serde(rename = "Cohort Users")]
    pub cohort_users: u64,
    #[serde(rename = "Returning Users")]
    pub returning_users: u64,
    #[serde(rename = "Churned Users")]
    pub churned_users: u64,
    #[serde(rename = "Return Month")]
    pub return_month: u32,
    /// False when the return month lies past the horizon
    #[serde(rename = "Materialized")]
    pub materialized: bool,
}

/// Complete lifecycle projection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifecycleProjection {
    pub rows: Vec<LifecycleRow>,
    pub starts: Vec<CohortStart>,
    pub return_log: Vec<ReturnLogRow>,
    /// Users whose scheduled return fell past the horizon
    pub dropped_returns: u64,
}

impl LifecycleProjection {
    pub fn row(&self, month: u32) -> Option<&LifecycleRow> {
        self.rows.iter().find(|r| r.month == month)
    }

    pub fn total_new_users(&self) -> u64 {
        self.rows.iter().map(|r| r.new_users).sum()
    }

    pub fn total_returning_users(&self) -> u64 {
        self.rows.iter().map(|r| r.returning_users).sum()
    }
}
