//! Work-order lifecycle rules: numbering, state transitions, execution time
//! and the alerts raised on open orders.

use chrono::Datelike;

use crate::alert::{Alert, Severity};
use crate::error::CoreError;
use crate::numeric::round2;
use crate::types::Timestamp;
use crate::validation::validate_one_of;

// ---------------------------------------------------------------------------
// Type / priority / origin constants
// ---------------------------------------------------------------------------

pub const TYPE_PREVENTIVE: &str = "preventive";
pub const TYPE_CORRECTIVE: &str = "corrective";

pub const VALID_TYPES: &[&str] = &[TYPE_PREVENTIVE, TYPE_CORRECTIVE];

pub const PRIORITY_LOW: &str = "low";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_CRITICAL: &str = "critical";

pub const VALID_PRIORITIES: &[&str] =
    &[PRIORITY_LOW, PRIORITY_MEDIUM, PRIORITY_HIGH, PRIORITY_CRITICAL];

pub const ORIGIN_MANUAL: &str = "manual";
pub const ORIGIN_PREVENTIVE_AUTO: &str = "preventive_auto";

/// Prefix of every work-order number (`OS-2024-007`).
pub const NUMBER_PREFIX: &str = "OS";

/// Days past the due date after which an overdue order escalates to high.
pub const OVERDUE_ESCALATION_DAYS: i64 = 7;

/// An open order waiting this many days for a start raises an alert.
pub const WAITING_START_ALERT_DAYS: i64 = 1;

/// An in-progress order running this many days raises an alert.
pub const LONG_RUNNING_ALERT_DAYS: i64 = 3;

pub fn validate_type(order_type: &str) -> Result<(), CoreError> {
    validate_one_of("work order type", order_type, VALID_TYPES)
}

pub fn validate_priority(priority: &str) -> Result<(), CoreError> {
    validate_one_of("priority", priority, VALID_PRIORITIES)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub const STATUS_OPEN: &str = "open";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_AWAITING_PARTS: &str = "awaiting_parts";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const VALID_STATUSES: &[&str] = &[
    STATUS_OPEN,
    STATUS_IN_PROGRESS,
    STATUS_AWAITING_PARTS,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
];

/// Statuses counted as "open" on the dashboard.
pub const ACTIVE_STATUSES: &[&str] = &[STATUS_OPEN, STATUS_IN_PROGRESS, STATUS_AWAITING_PARTS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOrderStatus {
    Open,
    InProgress,
    AwaitingParts,
    Completed,
    Cancelled,
}

impl WorkOrderStatus {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => STATUS_OPEN,
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::AwaitingParts => STATUS_AWAITING_PARTS,
            Self::Completed => STATUS_COMPLETED,
            Self::Cancelled => STATUS_CANCELLED,
        }
    }

    /// Parse from a string, returning an error for unknown statuses.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_OPEN => Ok(Self::Open),
            STATUS_IN_PROGRESS => Ok(Self::InProgress),
            STATUS_AWAITING_PARTS => Ok(Self::AwaitingParts),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Invalid work order status: '{other}'. Valid statuses: {}",
                VALID_STATUSES.join(", ")
            ))),
        }
    }

    /// Completed and cancelled orders accept no further transitions.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Check that an order may be started.
pub fn check_can_start(status: WorkOrderStatus) -> Result<(), CoreError> {
    if status != WorkOrderStatus::Open {
        return Err(CoreError::Validation(format!(
            "Only open work orders can be started (current status: {})",
            status.as_str()
        )));
    }
    Ok(())
}

/// Check that an order may be completed.
pub fn check_can_complete(status: WorkOrderStatus) -> Result<(), CoreError> {
    match status {
        WorkOrderStatus::Completed => Err(CoreError::Validation(
            "Work order is already completed".to_string(),
        )),
        WorkOrderStatus::Cancelled => Err(CoreError::Validation(
            "Cancelled work orders cannot be completed".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Check that an order may be deleted.
pub fn check_can_delete(status: WorkOrderStatus) -> Result<(), CoreError> {
    if status == WorkOrderStatus::InProgress {
        return Err(CoreError::Validation(
            "Work orders in progress cannot be deleted".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Numbering
// ---------------------------------------------------------------------------

/// Extract the numeric sequence from a number such as `OS-2024-012`.
pub fn parse_sequence(number: &str) -> Option<u32> {
    number.rsplit('-').next()?.parse().ok()
}

/// Build the next work-order number.
///
/// `last_number` is the number of the most recently created order, and
/// `existing_count` the current row count, used when the last number does
/// not parse.
pub fn next_number(now: Timestamp, last_number: Option<&str>, existing_count: i64) -> String {
    let sequence = match last_number {
        Some(last) => match parse_sequence(last) {
            Some(seq) => i64::from(seq) + 1,
            None => existing_count + 1,
        },
        None => 1,
    };
    format!("{NUMBER_PREFIX}-{}-{sequence:03}", now.year())
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Hours between start and completion, rounded to two places.
pub fn execution_hours(started_at: Option<Timestamp>, closed_at: Timestamp) -> Option<f64> {
    let started = started_at?;
    let seconds = (closed_at - started).num_seconds().max(0);
    Some(round2(seconds as f64 / 3600.0))
}

/// Reason recorded on the stock movement for parts consumed by an order.
pub fn part_usage_reason(number: &str) -> String {
    format!("Used in work order {number}")
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Alerts raised on a single order.
pub fn order_alerts(
    status: WorkOrderStatus,
    priority: &str,
    due_at: Option<Timestamp>,
    now: Timestamp,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(due) = due_at {
        if due < now && !status.is_final() {
            let days_late = (now - due).num_days();
            let severity = if days_late > OVERDUE_ESCALATION_DAYS {
                Severity::High
            } else {
                Severity::Medium
            };
            alerts.push(Alert::new(
                "overdue",
                severity,
                format!("Work order is {days_late} day(s) overdue"),
            ));
        }
    }

    if status == WorkOrderStatus::AwaitingParts {
        alerts.push(Alert::new(
            "awaiting_parts",
            Severity::Medium,
            "Work order is waiting for parts",
        ));
    }

    if priority == PRIORITY_CRITICAL && status == WorkOrderStatus::Open {
        alerts.push(Alert::new(
            "critical_open",
            Severity::Critical,
            "Critical work order has not been started",
        ));
    }

    alerts
}

/// Alert shown to the assigned mechanic for an order left waiting or running.
pub fn mechanic_alert(
    status: WorkOrderStatus,
    priority: &str,
    opened_at: Timestamp,
    started_at: Option<Timestamp>,
    now: Timestamp,
) -> Option<Alert> {
    match status {
        WorkOrderStatus::Open => {
            let days = (now - opened_at).num_days();
            if days < WAITING_START_ALERT_DAYS {
                return None;
            }
            let severity = if priority == PRIORITY_CRITICAL {
                Severity::High
            } else {
                Severity::Medium
            };
            Some(Alert::new(
                "waiting_start",
                severity,
                format!("Open for {days} day(s) without being started"),
            ))
        }
        WorkOrderStatus::InProgress => {
            let started = started_at?;
            let days = (now - started).num_days();
            if days < LONG_RUNNING_ALERT_DAYS {
                return None;
            }
            Some(Alert::new(
                "long_running",
                Severity::Medium,
                format!("In progress for {days} day(s)"),
            ))
        }
        _ => None,
    }
}
