//! Mechanic entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::types::{Date, DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Mechanic {
    pub id: DbId,
    pub full_name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub experience_level: String,
    pub salary: Option<f64>,
    pub hired_on: Date,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateMechanic {
    pub full_name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub experience_level: String,
    pub salary: Option<f64>,
    pub hired_on: Date,
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMechanic {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub specialty: Option<String>,
    pub experience_level: Option<String>,
    pub salary: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MechanicFilter {
    pub status: Option<String>,
    pub specialty: Option<String>,
    pub experience_level: Option<String>,
    pub search: Option<String>,
}
