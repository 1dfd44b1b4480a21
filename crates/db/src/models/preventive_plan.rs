//! Preventive-maintenance plan model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::preventive::Schedule;
use cmms_core::types::{DbId, Timestamp};

/// A plan row joined with equipment and maintenance-type details.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PreventivePlan {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub equipment_id: DbId,
    pub equipment_name: Option<String>,
    /// Current equipment hour meter, used by the due check.
    pub equipment_hour_meter: Option<f64>,
    pub maintenance_type_id: DbId,
    pub maintenance_type_name: Option<String>,
    pub interval_hours: Option<i32>,
    pub interval_days: Option<i32>,
    pub interval_km: Option<f64>,
    pub lead_days: i32,
    pub priority: String,
    pub is_active: bool,
    pub last_executed_at: Option<Timestamp>,
    pub last_hour_meter: Option<f64>,
    pub last_km: Option<f64>,
    pub next_due_at: Option<Timestamp>,
    pub next_hour_meter: Option<f64>,
    pub next_km: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PreventivePlan {
    pub fn schedule(&self) -> Schedule {
        Schedule {
            is_active: self.is_active,
            interval_hours: self.interval_hours,
            interval_days: self.interval_days,
            interval_km: self.interval_km,
            lead_days: self.lead_days,
            last_executed_at: self.last_executed_at,
            last_hour_meter: self.last_hour_meter,
            last_km: self.last_km,
            next_due_at: self.next_due_at,
            next_hour_meter: self.next_hour_meter,
            next_km: self.next_km,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.schedule().is_due(now, self.equipment_hour_meter)
    }
}

/// A plan with its due flag, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PreventivePlanResponse {
    #[serde(flatten)]
    pub plan: PreventivePlan,
    pub is_due: bool,
}

impl PreventivePlanResponse {
    pub fn new(plan: PreventivePlan, now: Timestamp) -> Self {
        let is_due = plan.is_due(now);
        Self { plan, is_due }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePreventivePlan {
    pub name: String,
    pub description: Option<String>,
    pub equipment_id: DbId,
    pub maintenance_type_id: DbId,
    pub priority: String,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreventivePlan {
    pub name: Option<String>,
    pub description: Option<String>,
    pub maintenance_type_id: Option<DbId>,
    pub interval_hours: Option<i32>,
    pub interval_days: Option<i32>,
    pub interval_km: Option<f64>,
    pub lead_days: Option<i32>,
    pub priority: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreventivePlanFilter {
    pub equipment_id: Option<DbId>,
    pub is_active: Option<bool>,
    /// Keep only plans whose due flag matches.
    pub due: Option<bool>,
    pub search: Option<String>,
}
