//! Backlog item model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::backlog::{category_label, days_pending, level_label, status_label, ScoreInput};
use cmms_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BacklogItem {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub item_type: String,
    pub priority: String,
    pub urgency: String,
    pub impact: String,
    pub equipment_id: Option<DbId>,
    pub equipment_name: Option<String>,
    pub work_order_id: Option<DbId>,
    pub work_order_number: Option<String>,
    pub preventive_plan_id: Option<DbId>,
    pub estimated_effort_hours: Option<f64>,
    pub estimated_cost: Option<f64>,
    pub identified_at: Timestamp,
    pub due_at: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub status: String,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub priority_score: f64,
    pub created_by: Option<DbId>,
    pub created_by_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BacklogItem {
    pub fn score_input(&self) -> ScoreInput<'_> {
        ScoreInput {
            priority: &self.priority,
            urgency: &self.urgency,
            impact: &self.impact,
            category: &self.category,
            identified_at: self.identified_at,
        }
    }
}

/// A backlog item with its display labels and age, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct BacklogItemResponse {
    #[serde(flatten)]
    pub item: BacklogItem,
    pub status_label: &'static str,
    pub category_label: &'static str,
    pub priority_label: &'static str,
    pub days_pending: i64,
}

impl BacklogItemResponse {
    pub fn new(item: BacklogItem, now: Timestamp) -> Self {
        Self {
            status_label: status_label(&item.status),
            category_label: category_label(&item.category),
            priority_label: level_label(&item.priority),
            days_pending: days_pending(&item.status, item.identified_at, now),
            item,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBacklogItem {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub item_type: String,
    pub priority: String,
    pub urgency: String,
    pub impact: String,
    pub equipment_id: Option<DbId>,
    pub work_order_id: Option<DbId>,
    pub preventive_plan_id: Option<DbId>,
    pub estimated_effort_hours: Option<f64>,
    pub estimated_cost: Option<f64>,
    pub identified_at: Timestamp,
    pub due_at: Option<Timestamp>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub priority_score: f64,
    pub created_by: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBacklogItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub item_type: Option<String>,
    pub priority: Option<String>,
    pub urgency: Option<String>,
    pub impact: Option<String>,
    pub equipment_id: Option<DbId>,
    pub work_order_id: Option<DbId>,
    pub preventive_plan_id: Option<DbId>,
    pub estimated_effort_hours: Option<f64>,
    pub estimated_cost: Option<f64>,
    pub due_at: Option<Timestamp>,
    pub status: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

/// Timestamps and score maintained by the handler on update.
#[derive(Debug, Clone, Default)]
pub struct BacklogDerived {
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub priority_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BacklogFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub responsible: Option<String>,
    pub equipment_id: Option<DbId>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Aggregates for the backlog statistics endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BacklogTotals {
    pub total: i64,
    pub critical: i64,
    pub overdue: i64,
    pub open_effort_hours: f64,
    pub open_cost: f64,
}
