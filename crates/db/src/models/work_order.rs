//! Work order entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::types::{DbId, Timestamp};

/// A work-order row joined with equipment, mechanic and maintenance-type names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrder {
    pub id: DbId,
    pub number: String,
    pub equipment_id: DbId,
    pub equipment_name: Option<String>,
    pub equipment_code: Option<String>,
    pub mechanic_id: Option<DbId>,
    pub mechanic_name: Option<String>,
    pub maintenance_type_id: Option<DbId>,
    pub maintenance_type_name: Option<String>,
    pub order_type: String,
    pub priority: String,
    pub status: String,
    pub origin: String,
    pub problem_description: String,
    pub solution_description: Option<String>,
    pub opened_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub due_at: Option<Timestamp>,
    pub closed_at: Option<Timestamp>,
    pub execution_hours: Option<f64>,
    pub labor_cost: f64,
    pub parts_cost: f64,
    pub total_cost: f64,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a work order. The number is generated by the repository.
#[derive(Debug, Clone)]
pub struct CreateWorkOrder {
    pub equipment_id: DbId,
    pub mechanic_id: Option<DbId>,
    pub maintenance_type_id: Option<DbId>,
    pub order_type: String,
    pub priority: String,
    pub origin: String,
    pub problem_description: String,
    pub due_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_by: Option<DbId>,
}

/// DTO for updating a work order. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkOrder {
    pub mechanic_id: Option<DbId>,
    pub maintenance_type_id: Option<DbId>,
    pub order_type: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub problem_description: Option<String>,
    pub solution_description: Option<String>,
    pub due_at: Option<Timestamp>,
    pub labor_cost: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkOrderFilter {
    pub status: Option<String>,
    pub order_type: Option<String>,
    pub priority: Option<String>,
    pub equipment_id: Option<DbId>,
    pub mechanic_id: Option<DbId>,
    pub search: Option<String>,
}

/// A part consumed by a work order, joined with the part code and name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkOrderPart {
    pub id: DbId,
    pub work_order_id: DbId,
    pub part_id: DbId,
    pub part_code: String,
    pub part_name: String,
    pub quantity: i32,
    pub unit_cost: f64,
    pub total_cost: f64,
    pub created_at: Timestamp,
}

/// One requested part on completion.
#[derive(Debug, Clone, Deserialize)]
pub struct PartUsage {
    pub part_id: DbId,
    pub quantity: i32,
}

/// Everything written when a work order is completed.
#[derive(Debug, Clone)]
pub struct CompleteWorkOrder {
    pub solution_description: String,
    pub labor_cost: f64,
    pub notes: Option<String>,
    pub parts_used: Vec<PartUsage>,
    pub user_id: DbId,
    pub closed_at: Timestamp,
}
