//! Equipment entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::types::{Date, DbId, Timestamp};

/// An equipment row joined with its type name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Equipment {
    pub id: DbId,
    pub internal_code: String,
    pub name: String,
    pub equipment_type_id: DbId,
    pub equipment_type_name: Option<String>,
    pub model: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub location: String,
    pub acquired_on: Date,
    pub status: String,
    pub hour_meter: f64,
    pub acquisition_value: Option<f64>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating equipment. Fields are validated by the handler.
#[derive(Debug, Clone)]
pub struct CreateEquipment {
    pub internal_code: String,
    pub name: String,
    pub equipment_type_id: DbId,
    pub model: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub location: String,
    pub acquired_on: Date,
    pub status: String,
    pub hour_meter: f64,
    pub acquisition_value: Option<f64>,
    pub notes: Option<String>,
}

/// DTO for updating equipment. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub equipment_type_id: Option<DbId>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub hour_meter: Option<f64>,
    pub acquisition_value: Option<f64>,
    pub notes: Option<String>,
}

/// Query parameters for listing equipment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentFilter {
    pub status: Option<String>,
    pub equipment_type_id: Option<DbId>,
    pub search: Option<String>,
}
