//! Dashboard aggregates.

use serde::Serialize;
use sqlx::FromRow;

/// A `(label, count)` pair used by the chart series.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Headline counters.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct DashboardKpis {
    pub equipment_total: i64,
    pub equipment_active: i64,
    pub equipment_in_maintenance: i64,
    pub work_orders_total: i64,
    pub work_orders_open: i64,
    pub work_orders_completed: i64,
    pub parts_total: i64,
    pub parts_low_stock: i64,
    pub mechanics_active: i64,
    pub tires_total: i64,
    pub tires_in_use: i64,
    pub monthly_cost: f64,
}
