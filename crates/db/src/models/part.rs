//! Stock part entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::inventory::stock_status;
use cmms_core::types::{Date, DbId, Timestamp};

/// A part row joined with its group and stock-location names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Part {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: String,
    pub quantity: i32,
    pub min_stock: i32,
    pub max_stock: i32,
    pub unit_price: f64,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub item_group_id: Option<DbId>,
    pub item_group_name: Option<String>,
    pub stock_location_id: Option<DbId>,
    pub stock_location_name: Option<String>,
    pub last_counted_at: Option<Timestamp>,
    pub last_counted_by: Option<DbId>,
    pub registered_on: Option<Date>,
    pub last_valuation_price: Option<f64>,
    pub last_purchase_price: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A part with its derived stock status, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PartResponse {
    #[serde(flatten)]
    pub part: Part,
    pub stock_status: &'static str,
    pub stock_value: f64,
}

impl From<Part> for PartResponse {
    fn from(part: Part) -> Self {
        let stock_status = stock_status(part.quantity, part.min_stock);
        let stock_value = f64::from(part.quantity) * part.unit_price;
        Self {
            part,
            stock_status,
            stock_value,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreatePart {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: String,
    pub quantity: i32,
    pub min_stock: i32,
    pub max_stock: i32,
    pub unit_price: f64,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub item_group_id: Option<DbId>,
    pub stock_location_id: Option<DbId>,
    pub registered_on: Option<Date>,
    pub last_valuation_price: Option<f64>,
    pub last_purchase_price: Option<f64>,
}

/// DTO for updating a part. Quantity is changed only through movements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePart {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<i32>,
    pub max_stock: Option<i32>,
    pub unit_price: Option<f64>,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub item_group_id: Option<DbId>,
    pub stock_location_id: Option<DbId>,
    pub last_valuation_price: Option<f64>,
    pub last_purchase_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartFilter {
    pub category: Option<String>,
    pub low_stock: Option<bool>,
    pub item_group_id: Option<DbId>,
    pub stock_location_id: Option<DbId>,
    pub search: Option<String>,
}

/// Per-category aggregate for the stock report.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
    pub total_quantity: i64,
    pub total_value: f64,
}

/// Values written for one row of a spreadsheet import.
#[derive(Debug, Clone)]
pub struct ImportedPart {
    pub code: String,
    pub name: String,
    pub unit: String,
    pub item_group_id: Option<DbId>,
    pub min_stock: Option<i32>,
    pub registered_on: Option<Date>,
    pub last_valuation_price: Option<f64>,
    pub last_purchase_price: Option<f64>,
}
