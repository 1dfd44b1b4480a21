//! Oil analysis entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OilAnalysis {
    pub id: DbId,
    pub equipment_id: DbId,
    pub equipment_name: Option<String>,
    pub equipment_code: Option<String>,
    pub sample_number: String,
    pub collected_at: Timestamp,
    pub hour_meter_at_collection: Option<f64>,
    pub oil_type: Option<String>,
    pub laboratory: Option<String>,
    pub lab_result_at: Option<Timestamp>,
    pub parameters: Option<serde_json::Value>,
    pub diagnosis: Option<String>,
    pub recommended_action: Option<String>,
    pub executed_action: Option<String>,
    pub status: String,
    pub priority: String,
    pub collected_by: Option<String>,
    pub analyzed_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateOilAnalysis {
    pub equipment_id: DbId,
    pub sample_number: String,
    pub collected_at: Timestamp,
    pub hour_meter_at_collection: Option<f64>,
    pub oil_type: Option<String>,
    pub laboratory: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub status: String,
    pub priority: String,
    pub collected_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOilAnalysis {
    pub hour_meter_at_collection: Option<f64>,
    pub oil_type: Option<String>,
    pub laboratory: Option<String>,
    pub lab_result_at: Option<Timestamp>,
    pub parameters: Option<serde_json::Value>,
    pub diagnosis: Option<String>,
    pub recommended_action: Option<String>,
    pub executed_action: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
}

/// Values written when an analysis is completed.
#[derive(Debug, Clone)]
pub struct CompleteOilAnalysis {
    pub diagnosis: String,
    pub recommended_action: Option<String>,
    pub executed_action: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub lab_result_at: Timestamp,
    pub analyzed_by: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OilAnalysisFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub equipment_id: Option<DbId>,
    pub search: Option<String>,
}
