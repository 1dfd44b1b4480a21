//! Stock movement model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::types::{Date, DbId, Timestamp};

use crate::models::part::PartResponse;

/// A stock movement joined with the part and user names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockMovement {
    pub id: DbId,
    pub part_id: DbId,
    pub part_code: Option<String>,
    pub part_name: Option<String>,
    pub movement_type: String,
    pub quantity: i32,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub reason: Option<String>,
    pub invoice_number: Option<String>,
    pub equipment_id: Option<DbId>,
    pub mechanic_id: Option<DbId>,
    pub sector: Option<String>,
    pub work_order_id: Option<DbId>,
    pub source_location_id: Option<DbId>,
    pub target_location_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub moved_at: Timestamp,
}

/// A movement posted by a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStockMovement {
    pub part_id: DbId,
    pub movement_type: String,
    pub quantity: i32,
    pub reason: Option<String>,
    pub invoice_number: Option<String>,
    pub equipment_id: Option<DbId>,
    pub mechanic_id: Option<DbId>,
    pub sector: Option<String>,
    pub work_order_id: Option<DbId>,
    pub source_location_id: Option<DbId>,
    pub target_location_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovementFilter {
    pub part_id: Option<DbId>,
    pub movement_type: Option<String>,
    pub user_id: Option<DbId>,
    /// Inclusive start date (`YYYY-MM-DD`).
    pub date_from: Option<Date>,
    /// Inclusive end date (`YYYY-MM-DD`).
    pub date_to: Option<Date>,
}

/// A posted movement and the part after it was applied.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedMovement {
    pub part: PartResponse,
    pub movement: StockMovement,
}

/// Result of counting a single part.
#[derive(Debug, Clone, Serialize)]
pub struct CountResult {
    pub part: PartResponse,
    pub difference: i32,
}
