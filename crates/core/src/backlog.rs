//! Backlog prioritisation.
//!
//! Items are ranked by a score combining urgency, impact and priority, with
//! bonuses for emergency and maintenance work and for items that have been
//! waiting more than a month.

use serde::Serialize;

use crate::error::CoreError;
use crate::numeric::round2;
use crate::types::Timestamp;
use crate::validation::validate_one_of;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub const CATEGORY_MAINTENANCE: &str = "maintenance";
pub const CATEGORY_IMPROVEMENT: &str = "improvement";
pub const CATEGORY_PROJECT: &str = "project";
pub const CATEGORY_EMERGENCY: &str = "emergency";

pub const VALID_CATEGORIES: &[&str] = &[
    CATEGORY_MAINTENANCE,
    CATEGORY_IMPROVEMENT,
    CATEGORY_PROJECT,
    CATEGORY_EMERGENCY,
];

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

pub const STATUS_IDENTIFIED: &str = "identified";
pub const STATUS_ANALYZED: &str = "analyzed";
pub const STATUS_APPROVED: &str = "approved";
pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

pub const VALID_STATUSES: &[&str] = &[
    STATUS_IDENTIFIED,
    STATUS_ANALYZED,
    STATUS_APPROVED,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
];

/// Statuses still awaiting execution (used by stats and re-prioritisation).
pub const PENDING_STATUSES: &[&str] = &[STATUS_IDENTIFIED, STATUS_ANALYZED, STATUS_APPROVED];

/// Statuses that no longer accumulate age.
pub const CLOSED_STATUSES: &[&str] = &[STATUS_COMPLETED, STATUS_CANCELLED];

// ---------------------------------------------------------------------------
// Levels
// ---------------------------------------------------------------------------

pub const LEVEL_LOW: &str = "low";
pub const LEVEL_MEDIUM: &str = "medium";
pub const LEVEL_HIGH: &str = "high";
pub const LEVEL_CRITICAL: &str = "critical";

/// Scale shared by priority, urgency and impact.
pub const VALID_LEVELS: &[&str] = &[LEVEL_LOW, LEVEL_MEDIUM, LEVEL_HIGH, LEVEL_CRITICAL];

pub const DEFAULT_LEVEL: &str = LEVEL_MEDIUM;

/// Items older than this many days receive an age bonus.
pub const AGE_BONUS_AFTER_DAYS: i64 = 30;
/// Cap on the age bonus.
pub const MAX_AGE_BONUS: f64 = 5.0;

pub const EMERGENCY_BONUS: f64 = 5.0;
pub const MAINTENANCE_BONUS: f64 = 2.0;

pub fn validate_category(category: &str) -> Result<(), CoreError> {
    validate_one_of("category", category, VALID_CATEGORIES)
}

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    validate_one_of("backlog status", status, VALID_STATUSES)
}

pub fn validate_level(field: &str, level: &str) -> Result<(), CoreError> {
    validate_one_of(field, level, VALID_LEVELS)
}

/// Numeric weight of a level. Unknown values weigh as medium.
pub fn level_score(level: &str) -> f64 {
    match level {
        LEVEL_LOW => 1.0,
        LEVEL_MEDIUM => 2.0,
        LEVEL_HIGH => 3.0,
        LEVEL_CRITICAL => 4.0,
        _ => 2.0,
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Inputs to the prioritisation score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub priority: &'a str,
    pub urgency: &'a str,
    pub impact: &'a str,
    pub category: &'a str,
    pub identified_at: Timestamp,
}

/// Prioritisation score, rounded to two places.
pub fn priority_score(input: &ScoreInput<'_>, now: Timestamp) -> f64 {
    let mut score =
        level_score(input.urgency) * level_score(input.impact) + level_score(input.priority);

    score += match input.category {
        CATEGORY_EMERGENCY => EMERGENCY_BONUS,
        CATEGORY_MAINTENANCE => MAINTENANCE_BONUS,
        _ => 0.0,
    };

    let age_days = (now - input.identified_at).num_days();
    if age_days > AGE_BONUS_AFTER_DAYS {
        score += (age_days as f64 / 10.0).min(MAX_AGE_BONUS);
    }

    round2(score)
}

/// Days an item has been pending. Closed items report 0.
pub fn days_pending(status: &str, identified_at: Timestamp, now: Timestamp) -> i64 {
    if CLOSED_STATUSES.contains(&status) {
        return 0;
    }
    (now - identified_at).num_days().max(0)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

pub fn check_can_start(status: &str) -> Result<(), CoreError> {
    if status != STATUS_APPROVED {
        return Err(CoreError::Validation(format!(
            "Only approved backlog items can be started (current status: {status})"
        )));
    }
    Ok(())
}

pub fn check_can_complete(status: &str) -> Result<(), CoreError> {
    if status != STATUS_IN_PROGRESS {
        return Err(CoreError::Validation(format!(
            "Only backlog items in progress can be completed (current status: {status})"
        )));
    }
    Ok(())
}

/// Notes after appending the completion remark.
pub fn completion_notes(existing: Option<&str>, remark: Option<&str>) -> Option<String> {
    let remark = match remark.map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => format!("Completion: {r}"),
        None => return existing.map(str::to_string),
    };
    match existing.map(str::trim_end).filter(|e| !e.is_empty()) {
        Some(prev) => Some(format!("{prev}\n{remark}")),
        None => Some(remark),
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

pub fn status_label(status: &str) -> &'static str {
    match status {
        STATUS_IDENTIFIED => "Identified",
        STATUS_ANALYZED => "Analyzed",
        STATUS_APPROVED => "Approved",
        STATUS_IN_PROGRESS => "In progress",
        STATUS_COMPLETED => "Completed",
        STATUS_CANCELLED => "Cancelled",
        _ => "Unknown",
    }
}

pub fn category_label(category: &str) -> &'static str {
    match category {
        CATEGORY_MAINTENANCE => "Maintenance",
        CATEGORY_IMPROVEMENT => "Improvement",
        CATEGORY_PROJECT => "Project",
        CATEGORY_EMERGENCY => "Emergency",
        _ => "Unknown",
    }
}

pub fn level_label(level: &str) -> &'static str {
    match level {
        LEVEL_LOW => "Low",
        LEVEL_MEDIUM => "Medium",
        LEVEL_HIGH => "High",
        LEVEL_CRITICAL => "Critical",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Map a `sort_by` parameter to its column. Defaults to the score.
pub fn sort_column(sort_by: Option<&str>) -> Result<&'static str, CoreError> {
    match sort_by.unwrap_or("score") {
        "score" => Ok("priority_score"),
        "title" => Ok("title"),
        "identified_at" => Ok("identified_at"),
        "due_at" => Ok("due_at"),
        "priority" => Ok("priority"),
        "status" => Ok("status"),
        other => Err(CoreError::Validation(format!(
            "Invalid sort_by: '{other}'. Valid values: score, title, identified_at, due_at, priority, status"
        ))),
    }
}

/// Map a `sort_order` parameter to SQL. Defaults to descending.
pub fn sort_direction(sort_order: Option<&str>) -> Result<&'static str, CoreError> {
    match sort_order.unwrap_or("desc") {
        "desc" => Ok("DESC"),
        "asc" => Ok("ASC"),
        other => Err(CoreError::Validation(format!(
            "Invalid sort_order: '{other}'. Valid values: asc, desc"
        ))),
    }
}

/// Pagination metadata returned with backlog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    /// Clamp the requested page and page size.
    pub fn clamp(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }

    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            total,
            pages,
            current_page: page,
            per_page,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }

    pub fn offset(page: i64, per_page: i64) -> i64 {
        (page - 1) * per_page
    }
}
