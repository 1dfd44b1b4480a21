//! Mechanic constants and the performance summary calculation.

use serde::Serialize;

use crate::error::CoreError;
use crate::numeric::{percentage, round2};
use crate::validation::validate_one_of;

// ---------------------------------------------------------------------------
// Status / experience
// ---------------------------------------------------------------------------

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";
pub const STATUS_VACATION: &str = "vacation";

pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_INACTIVE, STATUS_VACATION];

pub const LEVEL_JUNIOR: &str = "junior";
pub const LEVEL_MID: &str = "mid";
pub const LEVEL_SENIOR: &str = "senior";

pub const VALID_EXPERIENCE_LEVELS: &[&str] = &[LEVEL_JUNIOR, LEVEL_MID, LEVEL_SENIOR];

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    validate_one_of("mechanic status", status, VALID_STATUSES)
}

pub fn validate_experience_level(level: &str) -> Result<(), CoreError> {
    validate_one_of("experience level", level, VALID_EXPERIENCE_LEVELS)
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

/// Raw aggregates for one mechanic, as read from the work-order table.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTotals {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    /// Sum of `execution_hours` over completed orders that recorded one.
    pub execution_hours_sum: f64,
    /// Number of completed orders that recorded `execution_hours`.
    pub execution_hours_count: i64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub total_work_orders: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub completion_rate: f64,
    pub average_execution_hours: f64,
    pub total_service_cost: f64,
}

impl From<PerformanceTotals> for Performance {
    fn from(t: PerformanceTotals) -> Self {
        let average = if t.execution_hours_count > 0 {
            round2(t.execution_hours_sum / t.execution_hours_count as f64)
        } else {
            0.0
        };
        Self {
            total_work_orders: t.total,
            completed: t.completed,
            in_progress: t.in_progress,
            completion_rate: percentage(t.completed as f64, t.total as f64),
            average_execution_hours: average,
            total_service_cost: round2(t.total_cost),
        }
    }
}
