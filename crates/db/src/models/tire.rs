//! Tire entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::tire::{km_run, life_used_percent};
use cmms_core::types::{Date, DbId, Timestamp};

/// A tire row joined with the name of the equipment it is mounted on.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tire {
    pub id: DbId,
    pub serial_number: String,
    pub fire_number: Option<String>,
    pub brand: String,
    pub model: String,
    pub size: String,
    pub tire_type: String,
    pub status: String,
    pub equipment_id: Option<DbId>,
    pub equipment_name: Option<String>,
    pub position: Option<String>,
    pub purchased_on: Date,
    pub purchase_value: Option<f64>,
    pub installed_at: Option<Timestamp>,
    pub km_at_install: Option<f64>,
    pub km_current: Option<f64>,
    pub recommended_pressure: Option<f64>,
    pub estimated_life_km: Option<f64>,
    pub tread_depth_mm: Option<f64>,
    pub supplier: Option<String>,
    pub retread_supplier: Option<String>,
    pub retreaded_at: Option<Timestamp>,
    pub discarded_at: Option<Timestamp>,
    pub discard_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tire {
    pub fn km_run(&self) -> Option<f64> {
        km_run(self.km_at_install, self.km_current)
    }

    pub fn life_used_percent(&self) -> Option<f64> {
        life_used_percent(self.km_run(), self.estimated_life_km)
    }
}

/// A tire with its derived wear figures, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct TireResponse {
    #[serde(flatten)]
    pub tire: Tire,
    pub km_run: Option<f64>,
    pub life_used_percent: Option<f64>,
}

impl From<Tire> for TireResponse {
    fn from(tire: Tire) -> Self {
        Self {
            km_run: tire.km_run(),
            life_used_percent: tire.life_used_percent(),
            tire,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTire {
    pub serial_number: String,
    pub fire_number: Option<String>,
    pub brand: String,
    pub model: String,
    pub size: String,
    pub tire_type: String,
    pub purchased_on: Date,
    pub purchase_value: Option<f64>,
    pub recommended_pressure: Option<f64>,
    pub estimated_life_km: Option<f64>,
    pub tread_depth_mm: Option<f64>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

/// DTO for updating a tire's descriptive fields. Status and mounting change
/// only through the lifecycle endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTire {
    pub fire_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub size: Option<String>,
    pub purchase_value: Option<f64>,
    pub recommended_pressure: Option<f64>,
    pub estimated_life_km: Option<f64>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TireFilter {
    pub status: Option<String>,
    pub brand: Option<String>,
    pub equipment_id: Option<DbId>,
    pub search: Option<String>,
}

/// Full lifecycle state written by the mounting/treatment endpoints.
///
/// Handlers load the tire, apply the transition to this struct and write it
/// back in one statement.
#[derive(Debug, Clone)]
pub struct TireLifecycle {
    pub tire_type: String,
    pub status: String,
    pub equipment_id: Option<DbId>,
    pub position: Option<String>,
    pub installed_at: Option<Timestamp>,
    pub km_at_install: Option<f64>,
    pub km_current: Option<f64>,
    pub tread_depth_mm: Option<f64>,
    pub retread_supplier: Option<String>,
    pub retreaded_at: Option<Timestamp>,
    pub discarded_at: Option<Timestamp>,
    pub discard_reason: Option<String>,
    pub notes: Option<String>,
}

impl From<&Tire> for TireLifecycle {
    fn from(t: &Tire) -> Self {
        Self {
            tire_type: t.tire_type.clone(),
            status: t.status.clone(),
            equipment_id: t.equipment_id,
            position: t.position.clone(),
            installed_at: t.installed_at,
            km_at_install: t.km_at_install,
            km_current: t.km_current,
            tread_depth_mm: t.tread_depth_mm,
            retread_supplier: t.retread_supplier.clone(),
            retreaded_at: t.retreaded_at,
            discarded_at: t.discarded_at,
            discard_reason: t.discard_reason.clone(),
            notes: t.notes.clone(),
        }
    }
}

/// Per-brand aggregate for the performance report.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BrandPerformance {
    pub brand: String,
    pub total: i64,
    pub in_use: i64,
    pub discarded: i64,
    pub retreaded: i64,
    pub total_km: f64,
    pub total_value: f64,
}
