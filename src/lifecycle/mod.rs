//! Cohort lifecycle: acquisition, rest periods and automatic rejoining

mod state;
mod engine;
mod rows;

pub use state::{LifecycleState, ReturnSchedule};
pub use engine::LifecycleEngine;
pub use rows::{CohortStart, LifecycleProjection, LifecycleRow, ReturnLogRow};
