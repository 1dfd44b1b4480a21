//! Repository for the `work_orders` and `work_order_parts` tables.

use chrono::Utc;
use cmms_core::error::CoreError;
use cmms_core::inventory::{insufficient_stock, MOVEMENT_OUT};
use cmms_core::types::{DbId, Timestamp};
use cmms_core::work_order::{
    check_can_complete, execution_hours, next_number, part_usage_reason, WorkOrderStatus,
    STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_OPEN, TYPE_PREVENTIVE,
};
use sqlx::{PgConnection, PgPool};

use crate::error::TxError;
use crate::filter::{bind_values, Filter};
use crate::models::work_order::{
    CompleteWorkOrder, CreateWorkOrder, UpdateWorkOrder, WorkOrder, WorkOrderFilter,
    WorkOrderPart,
};

/// Columns selected from `work_orders w` joined with its display names.
const COLUMNS: &str = "w.id, w.number, w.equipment_id, e.name AS equipment_name, \
                        e.internal_code AS equipment_code, w.mechanic_id, \
                        m.full_name AS mechanic_name, w.maintenance_type_id, \
                        mt.name AS maintenance_type_name, w.order_type, w.priority, w.status, \
                        w.origin, w.problem_description, w.solution_description, w.opened_at, \
                        w.started_at, w.due_at, w.closed_at, w.execution_hours, w.labor_cost, \
                        w.parts_cost, w.total_cost, w.notes, w.created_by, w.created_at, \
                        w.updated_at";

const JOINS: &str = "LEFT JOIN equipment e ON e.id = w.equipment_id \
                     LEFT JOIN mechanics m ON m.id = w.mechanic_id \
                     LEFT JOIN maintenance_types mt ON mt.id = w.maintenance_type_id";

const PART_COLUMNS: &str = "wp.id, wp.work_order_id, wp.part_id, p.code AS part_code, \
                             p.name AS part_name, wp.quantity, wp.unit_cost, wp.total_cost, \
                             wp.created_at";

/// Advisory-lock key serialising number generation.
const NUMBERING_LOCK_KEY: i64 = 0x574f_4e55_4d;

pub struct WorkOrderRepo;

impl WorkOrderRepo {
    /// Insert a work order with a freshly generated number.
    pub async fn create(pool: &PgPool, input: &CreateWorkOrder) -> Result<WorkOrder, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let order = Self::create_in(&mut tx, input).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Insert a work order inside an open transaction.
    ///
    /// The numbering lock is held until the caller commits, so two
    /// concurrent creates never read the same last number.
    pub async fn create_in(
        conn: &mut PgConnection,
        input: &CreateWorkOrder,
    ) -> Result<WorkOrder, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(NUMBERING_LOCK_KEY)
            .execute(&mut *conn)
            .await?;

        let last: Option<String> =
            sqlx::query_scalar("SELECT number FROM work_orders ORDER BY id DESC LIMIT 1")
                .fetch_optional(&mut *conn)
                .await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM work_orders")
            .fetch_one(&mut *conn)
            .await?;
        let number = next_number(Utc::now(), last.as_deref(), count);

        let query = format!(
            "WITH w AS (
                INSERT INTO work_orders
                    (number, equipment_id, mechanic_id, maintenance_type_id, order_type,
                     priority, status, origin, problem_description, due_at, notes, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING *
             )
             SELECT {COLUMNS} FROM w {JOINS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(&number)
            .bind(input.equipment_id)
            .bind(input.mechanic_id)
            .bind(input.maintenance_type_id)
            .bind(&input.order_type)
            .bind(&input.priority)
            .bind(STATUS_OPEN)
            .bind(&input.origin)
            .bind(&input.problem_description)
            .bind(input.due_at)
            .bind(&input.notes)
            .bind(input.created_by)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_orders w {JOINS} WHERE w.id = $1");
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List work orders, most recently opened first.
    pub async fn list(
        pool: &PgPool,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_text("w.status", filter.status.as_deref())
            .eq_text("w.order_type", filter.order_type.as_deref())
            .eq_text("w.priority", filter.priority.as_deref())
            .eq_id("w.equipment_id", filter.equipment_id)
            .eq_id("w.mechanic_id", filter.mechanic_id)
            .search(&["w.number", "w.problem_description"], filter.search.as_deref());
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders w {JOINS} {} ORDER BY w.opened_at DESC, w.id DESC",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, WorkOrder>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    /// Open and in-progress orders assigned to a mechanic.
    pub async fn list_active_for_mechanic(
        pool: &PgPool,
        mechanic_id: DbId,
    ) -> Result<Vec<WorkOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_orders w {JOINS}
             WHERE w.mechanic_id = $1 AND w.status IN ($2, $3)
             ORDER BY w.opened_at"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(mechanic_id)
            .bind(STATUS_OPEN)
            .bind(STATUS_IN_PROGRESS)
            .fetch_all(pool)
            .await
    }

    /// Update a work order. Only non-`None` fields in `input` are applied.
    ///
    /// `total_cost` follows a labor-cost change.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWorkOrder,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!(
            "WITH w AS (
                UPDATE work_orders SET
                    mechanic_id = COALESCE($2, mechanic_id),
                    maintenance_type_id = COALESCE($3, maintenance_type_id),
                    order_type = COALESCE($4, order_type),
                    priority = COALESCE($5, priority),
                    status = COALESCE($6, status),
                    problem_description = COALESCE($7, problem_description),
                    solution_description = COALESCE($8, solution_description),
                    due_at = COALESCE($9, due_at),
                    labor_cost = COALESCE($10, labor_cost),
                    total_cost = COALESCE($10, labor_cost) + parts_cost,
                    notes = COALESCE($11, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM w {JOINS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(input.mechanic_id)
            .bind(input.maintenance_type_id)
            .bind(&input.order_type)
            .bind(&input.priority)
            .bind(&input.status)
            .bind(&input.problem_description)
            .bind(&input.solution_description)
            .bind(input.due_at)
            .bind(input.labor_cost)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Move an order to `in_progress`, assigning `mechanic_id` when the
    /// order has none.
    pub async fn start(
        pool: &PgPool,
        id: DbId,
        mechanic_id: Option<DbId>,
    ) -> Result<Option<WorkOrder>, sqlx::Error> {
        let query = format!(
            "WITH w AS (
                UPDATE work_orders SET
                    status = $2,
                    started_at = NOW(),
                    mechanic_id = COALESCE(mechanic_id, $3),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM w {JOINS}"
        );
        sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(STATUS_IN_PROGRESS)
            .bind(mechanic_id)
            .fetch_optional(pool)
            .await
    }

    /// Complete an order, consuming the listed parts from stock.
    ///
    /// Each used part gets a `work_order_parts` row with a unit-cost
    /// snapshot, a stock decrement and an `out` movement. Entries with a
    /// non-positive quantity are ignored. Returns `None` if the order does
    /// not exist.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        input: &CompleteWorkOrder,
    ) -> Result<Option<WorkOrder>, TxError> {
        let mut tx = pool.begin().await?;

        let current: Option<(String, String, DbId, Option<Timestamp>)> = sqlx::query_as(
            "SELECT status, number, equipment_id, started_at
             FROM work_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((status, number, equipment_id, started_at)) = current else {
            return Ok(None);
        };
        check_can_complete(WorkOrderStatus::from_str(&status)?)?;

        let reason = part_usage_reason(&number);
        for usage in input.parts_used.iter().filter(|u| u.quantity > 0) {
            let part: Option<(i32, f64)> =
                sqlx::query_as("SELECT quantity, unit_price FROM parts WHERE id = $1 FOR UPDATE")
                    .bind(usage.part_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let (available, unit_price) = part.ok_or(CoreError::NotFound {
                entity: "Part",
                id: usage.part_id,
            })?;
            if usage.quantity > available {
                return Err(insufficient_stock(available, usage.quantity).into());
            }
            let remaining = available - usage.quantity;

            sqlx::query(
                "INSERT INTO work_order_parts (work_order_id, part_id, quantity, unit_cost, total_cost)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id)
            .bind(usage.part_id)
            .bind(usage.quantity)
            .bind(unit_price)
            .bind(f64::from(usage.quantity) * unit_price)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE parts SET quantity = $2, updated_at = NOW() WHERE id = $1")
                .bind(usage.part_id)
                .bind(remaining)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO stock_movements
                    (part_id, movement_type, quantity, quantity_before, quantity_after, reason,
                     equipment_id, work_order_id, user_id, moved_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(usage.part_id)
            .bind(MOVEMENT_OUT)
            .bind(usage.quantity)
            .bind(available)
            .bind(remaining)
            .bind(&reason)
            .bind(equipment_id)
            .bind(id)
            .bind(input.user_id)
            .bind(input.closed_at)
            .execute(&mut *tx)
            .await?;
        }

        let parts_cost: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cost), 0) FROM work_order_parts WHERE work_order_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "WITH w AS (
                UPDATE work_orders SET
                    status = $2,
                    solution_description = $3,
                    labor_cost = $4,
                    parts_cost = $5,
                    total_cost = $4 + $5,
                    closed_at = $6,
                    execution_hours = $7,
                    notes = COALESCE($8, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM w {JOINS}"
        );
        let order = sqlx::query_as::<_, WorkOrder>(&query)
            .bind(id)
            .bind(STATUS_COMPLETED)
            .bind(&input.solution_description)
            .bind(input.labor_cost)
            .bind(parts_cost)
            .bind(input.closed_at)
            .bind(execution_hours(started_at, input.closed_at))
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(order))
    }

    /// Parts consumed by an order.
    pub async fn parts(pool: &PgPool, id: DbId) -> Result<Vec<WorkOrderPart>, sqlx::Error> {
        let query = format!(
            "SELECT {PART_COLUMNS} FROM work_order_parts wp
             JOIN parts p ON p.id = wp.part_id
             WHERE wp.work_order_id = $1
             ORDER BY wp.id"
        );
        sqlx::query_as::<_, WorkOrderPart>(&query)
            .bind(id)
            .fetch_all(pool)
            .await
    }

    /// Whether the equipment already has an open or running preventive order.
    pub async fn has_active_preventive(
        conn: &mut PgConnection,
        equipment_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM work_orders
                WHERE equipment_id = $1 AND order_type = $2 AND status IN ($3, $4)
             )",
        )
        .bind(equipment_id)
        .bind(TYPE_PREVENTIVE)
        .bind(STATUS_OPEN)
        .bind(STATUS_IN_PROGRESS)
        .fetch_one(conn)
        .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
