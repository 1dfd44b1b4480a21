//! Repository for the `preventive_plans` table.

use cmms_core::preventive::Schedule;
use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::filter::{bind_values, Filter};
use crate::models::preventive_plan::{
    CreatePreventivePlan, PreventivePlan, PreventivePlanFilter, UpdatePreventivePlan,
};
use crate::models::work_order::{CreateWorkOrder, WorkOrder};
use crate::repositories::WorkOrderRepo;

/// Columns selected from `preventive_plans pp` joined with equipment and type.
const COLUMNS: &str = "pp.id, pp.name, pp.description, pp.equipment_id, \
                        e.name AS equipment_name, e.hour_meter AS equipment_hour_meter, \
                        pp.maintenance_type_id, mt.name AS maintenance_type_name, \
                        pp.interval_hours, pp.interval_days, pp.interval_km, pp.lead_days, \
                        pp.priority, pp.is_active, pp.last_executed_at, pp.last_hour_meter, \
                        pp.last_km, pp.next_due_at, pp.next_hour_meter, pp.next_km, \
                        pp.created_at, pp.updated_at";

const JOINS: &str = "LEFT JOIN equipment e ON e.id = pp.equipment_id \
                     LEFT JOIN maintenance_types mt ON mt.id = pp.maintenance_type_id";

pub struct PreventivePlanRepo;

impl PreventivePlanRepo {
    /// Insert a plan with its initial projection.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePreventivePlan,
    ) -> Result<PreventivePlan, sqlx::Error> {
        let s = &input.schedule;
        let query = format!(
            "WITH pp AS (
                INSERT INTO preventive_plans
                    (name, description, equipment_id, maintenance_type_id, interval_hours,
                     interval_days, interval_km, lead_days, priority, is_active,
                     next_due_at, next_hour_meter, next_km)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
             )
             SELECT {COLUMNS} FROM pp {JOINS}"
        );
        sqlx::query_as::<_, PreventivePlan>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.equipment_id)
            .bind(input.maintenance_type_id)
            .bind(s.interval_hours)
            .bind(s.interval_days)
            .bind(s.interval_km)
            .bind(s.lead_days)
            .bind(&input.priority)
            .bind(s.is_active)
            .bind(s.next_due_at)
            .bind(s.next_hour_meter)
            .bind(s.next_km)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PreventivePlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM preventive_plans pp {JOINS} WHERE pp.id = $1");
        sqlx::query_as::<_, PreventivePlan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List plans ordered by name.
    ///
    /// The `due` flag depends on the current time and equipment readings, so
    /// callers apply it to the result.
    pub async fn list(
        pool: &PgPool,
        filter: &PreventivePlanFilter,
    ) -> Result<Vec<PreventivePlan>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_id("pp.equipment_id", filter.equipment_id)
            .eq_bool("pp.is_active", filter.is_active)
            .search(&["pp.name", "pp.description", "e.name"], filter.search.as_deref());
        let query = format!(
            "SELECT {COLUMNS} FROM preventive_plans pp {JOINS} {} ORDER BY pp.name",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, PreventivePlan>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    /// Update a plan. Descriptive fields follow `input`; the schedule is
    /// written as given, already merged and re-projected by the caller.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePreventivePlan,
        schedule: &Schedule,
    ) -> Result<Option<PreventivePlan>, sqlx::Error> {
        let query = format!(
            "WITH pp AS (
                UPDATE preventive_plans SET
                    name = COALESCE($2, name),
                    description = COALESCE($3, description),
                    maintenance_type_id = COALESCE($4, maintenance_type_id),
                    priority = COALESCE($5, priority),
                    interval_hours = $6,
                    interval_days = $7,
                    interval_km = $8,
                    lead_days = $9,
                    is_active = $10,
                    next_due_at = $11,
                    next_hour_meter = $12,
                    next_km = $13,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM pp {JOINS}"
        );
        sqlx::query_as::<_, PreventivePlan>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.maintenance_type_id)
            .bind(&input.priority)
            .bind(schedule.interval_hours)
            .bind(schedule.interval_days)
            .bind(schedule.interval_km)
            .bind(schedule.lead_days)
            .bind(schedule.is_active)
            .bind(schedule.next_due_at)
            .bind(schedule.next_hour_meter)
            .bind(schedule.next_km)
            .fetch_optional(pool)
            .await
    }

    async fn save_execution_in(
        conn: &mut PgConnection,
        id: DbId,
        schedule: &Schedule,
    ) -> Result<PreventivePlan, sqlx::Error> {
        let query = format!(
            "WITH pp AS (
                UPDATE preventive_plans SET
                    last_executed_at = $2,
                    last_hour_meter = $3,
                    last_km = $4,
                    next_due_at = $5,
                    next_hour_meter = $6,
                    next_km = $7,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM pp {JOINS}"
        );
        sqlx::query_as::<_, PreventivePlan>(&query)
            .bind(id)
            .bind(schedule.last_executed_at)
            .bind(schedule.last_hour_meter)
            .bind(schedule.last_km)
            .bind(schedule.next_due_at)
            .bind(schedule.next_hour_meter)
            .bind(schedule.next_km)
            .fetch_one(conn)
            .await
    }

    /// Record an execution and optionally open the matching work order, in
    /// one transaction.
    pub async fn execute(
        pool: &PgPool,
        id: DbId,
        schedule: &Schedule,
        work_order: Option<&CreateWorkOrder>,
    ) -> Result<(PreventivePlan, Option<WorkOrder>), sqlx::Error> {
        let mut tx = pool.begin().await?;
        let plan = Self::save_execution_in(&mut tx, id, schedule).await?;
        let order = match work_order {
            Some(input) => Some(WorkOrderRepo::create_in(&mut tx, input).await?),
            None => None,
        };
        tx.commit().await?;
        Ok((plan, order))
    }

    /// Open work orders for due plans, skipping equipment that already has
    /// an open or running preventive order.
    pub async fn generate_work_orders(
        pool: &PgPool,
        orders: &[CreateWorkOrder],
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::new();
        for input in orders {
            if WorkOrderRepo::has_active_preventive(&mut tx, input.equipment_id).await? {
                continue;
            }
            created.push(WorkOrderRepo::create_in(&mut tx, input).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM preventive_plans WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
