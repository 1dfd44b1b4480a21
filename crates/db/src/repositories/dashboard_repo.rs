//! Read-only aggregates for the dashboard.

use cmms_core::dashboard::TrendWindow;
use cmms_core::equipment::{STATUS_ACTIVE as EQUIPMENT_ACTIVE, STATUS_MAINTENANCE};
use cmms_core::mechanic::STATUS_ACTIVE as MECHANIC_ACTIVE;
use cmms_core::tire::STATUS_IN_USE;
use cmms_core::types::Timestamp;
use cmms_core::work_order::{ACTIVE_STATUSES, STATUS_COMPLETED};
use sqlx::PgPool;

use crate::models::dashboard::{DashboardKpis, LabelCount};

pub struct DashboardRepo;

impl DashboardRepo {
    /// Headline counters. `cost_since` bounds the monthly cost sum.
    pub async fn kpis(pool: &PgPool, cost_since: Timestamp) -> Result<DashboardKpis, sqlx::Error> {
        let active: Vec<String> = ACTIVE_STATUSES.iter().map(|s| s.to_string()).collect();
        sqlx::query_as::<_, DashboardKpis>(
            "SELECT
                (SELECT COUNT(*) FROM equipment) AS equipment_total,
                (SELECT COUNT(*) FROM equipment WHERE status = $1) AS equipment_active,
                (SELECT COUNT(*) FROM equipment WHERE status = $2) AS equipment_in_maintenance,
                (SELECT COUNT(*) FROM work_orders) AS work_orders_total,
                (SELECT COUNT(*) FROM work_orders WHERE status = ANY($3)) AS work_orders_open,
                (SELECT COUNT(*) FROM work_orders WHERE status = $4) AS work_orders_completed,
                (SELECT COUNT(*) FROM parts) AS parts_total,
                (SELECT COUNT(*) FROM parts WHERE quantity <= min_stock) AS parts_low_stock,
                (SELECT COUNT(*) FROM mechanics WHERE status = $5) AS mechanics_active,
                (SELECT COUNT(*) FROM tires) AS tires_total,
                (SELECT COUNT(*) FROM tires WHERE status = $6) AS tires_in_use,
                (SELECT COALESCE(SUM(total_cost), 0) FROM work_orders
                  WHERE status = $4 AND closed_at >= $7) AS monthly_cost",
        )
        .bind(EQUIPMENT_ACTIVE)
        .bind(STATUS_MAINTENANCE)
        .bind(&active)
        .bind(STATUS_COMPLETED)
        .bind(MECHANIC_ACTIVE)
        .bind(STATUS_IN_USE)
        .bind(cost_since)
        .fetch_one(pool)
        .await
    }

    /// Orders opened inside each window, in window order.
    pub async fn work_order_trend(
        pool: &PgPool,
        windows: &[TrendWindow],
    ) -> Result<Vec<LabelCount>, sqlx::Error> {
        let mut series = Vec::with_capacity(windows.len());
        for window in windows {
            let count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM work_orders WHERE opened_at >= $1 AND opened_at < $2",
            )
            .bind(window.start)
            .bind(window.end)
            .fetch_one(pool)
            .await?;
            series.push(LabelCount {
                label: window.label.clone(),
                count,
            });
        }
        Ok(series)
    }

    pub async fn work_orders_by_status(pool: &PgPool) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT status AS label, COUNT(*) AS count FROM work_orders GROUP BY status",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn work_orders_by_type(pool: &PgPool) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT order_type AS label, COUNT(*) AS count FROM work_orders GROUP BY order_type",
        )
        .fetch_all(pool)
        .await
    }

    /// Equipment with the most work orders.
    pub async fn top_equipment(pool: &PgPool, limit: i64) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT e.name AS label, COUNT(*) AS count
             FROM work_orders w JOIN equipment e ON e.id = w.equipment_id
             GROUP BY e.id, e.name
             ORDER BY COUNT(*) DESC, e.name
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
