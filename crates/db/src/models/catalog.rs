//! Reference catalogs: equipment types, maintenance types, item groups,
//! catalog items and stock locations.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cmms_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Equipment types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EquipmentType {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateEquipmentType {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEquipmentType {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Maintenance types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaintenanceType {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub color: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateMaintenanceType {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub color: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaintenanceType {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Item groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ItemGroup {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateItemGroup {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemGroup {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A catalog item (material master record, independent of stock).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Item {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub group_name: Option<String>,
    pub manufacturer: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateItem {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub group_name: Option<String>,
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItem {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_of_measure: Option<String>,
    pub group_name: Option<String>,
    pub manufacturer: Option<String>,
}

// ---------------------------------------------------------------------------
// Stock locations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockLocation {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub location: Option<String>,
    pub shelf: Option<String>,
    pub shelf_column: Option<String>,
    pub sector: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default)]
pub struct CreateStockLocation {
    pub name: String,
    pub code: String,
    pub location: Option<String>,
    pub shelf: Option<String>,
    pub shelf_column: Option<String>,
    pub sector: Option<String>,
    pub responsible: Option<String>,
    pub notes: Option<String>,
}

/// Query parameters shared by the catalog listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}
