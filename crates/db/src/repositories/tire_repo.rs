//! Repository for the `tires` table.

use cmms_core::error::CoreError;
use cmms_core::tire::{
    STATUS_DISCARDED, STATUS_IN_USE, STATUS_RETREADING, STATUS_STOCK, TYPE_RETREADED,
};
use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::TxError;
use crate::filter::{bind_values, Filter};
use crate::models::dashboard::LabelCount;
use crate::models::tire::{
    BrandPerformance, CreateTire, Tire, TireFilter, TireLifecycle, UpdateTire,
};

/// Columns selected from `tires t` joined with the mounting equipment.
const COLUMNS: &str = "t.id, t.serial_number, t.fire_number, t.brand, t.model, t.size, \
                        t.tire_type, t.status, t.equipment_id, e.name AS equipment_name, \
                        t.position, t.purchased_on, t.purchase_value, t.installed_at, \
                        t.km_at_install, t.km_current, t.recommended_pressure, \
                        t.estimated_life_km, t.tread_depth_mm, t.supplier, t.retread_supplier, \
                        t.retreaded_at, t.discarded_at, t.discard_reason, t.notes, \
                        t.created_at, t.updated_at";

const JOINS: &str = "LEFT JOIN equipment e ON e.id = t.equipment_id";

pub struct TireRepo;

impl TireRepo {
    /// Insert a tire. New tires start in stock.
    pub async fn create(pool: &PgPool, input: &CreateTire) -> Result<Tire, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::create_in(&mut conn, input).await
    }

    /// Insert on an open connection or transaction.
    pub async fn create_in(
        conn: &mut PgConnection,
        input: &CreateTire,
    ) -> Result<Tire, sqlx::Error> {
        let query = format!(
            "WITH t AS (
                INSERT INTO tires
                    (serial_number, fire_number, brand, model, size, tire_type, status,
                     purchased_on, purchase_value, recommended_pressure, estimated_life_km,
                     tread_depth_mm, supplier, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                RETURNING *
             )
             SELECT {COLUMNS} FROM t {JOINS}"
        );
        sqlx::query_as::<_, Tire>(&query)
            .bind(&input.serial_number)
            .bind(&input.fire_number)
            .bind(&input.brand)
            .bind(&input.model)
            .bind(&input.size)
            .bind(&input.tire_type)
            .bind(STATUS_STOCK)
            .bind(input.purchased_on)
            .bind(input.purchase_value)
            .bind(input.recommended_pressure)
            .bind(input.estimated_life_km)
            .bind(input.tread_depth_mm)
            .bind(&input.supplier)
            .bind(&input.notes)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tire>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tires t {JOINS} WHERE t.id = $1");
        sqlx::query_as::<_, Tire>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tires ordered by serial number.
    pub async fn list(pool: &PgPool, filter: &TireFilter) -> Result<Vec<Tire>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_text("t.status", filter.status.as_deref())
            .eq_text("t.brand", filter.brand.as_deref())
            .eq_id("t.equipment_id", filter.equipment_id)
            .search(
                &["t.serial_number", "t.fire_number", "t.brand", "t.model"],
                filter.search.as_deref(),
            );
        let query = format!(
            "SELECT {COLUMNS} FROM tires t {JOINS} {} ORDER BY t.serial_number",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, Tire>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    /// Tires mounted on a piece of equipment, ordered by position.
    pub async fn list_mounted(pool: &PgPool, equipment_id: DbId) -> Result<Vec<Tire>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tires t {JOINS}
             WHERE t.equipment_id = $1 AND t.status = $2
             ORDER BY t.position"
        );
        sqlx::query_as::<_, Tire>(&query)
            .bind(equipment_id)
            .bind(STATUS_IN_USE)
            .fetch_all(pool)
            .await
    }

    /// Every tire that has not been discarded.
    pub async fn list_not_discarded(pool: &PgPool) -> Result<Vec<Tire>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tires t {JOINS} WHERE t.status <> $1 ORDER BY t.serial_number"
        );
        sqlx::query_as::<_, Tire>(&query)
            .bind(STATUS_DISCARDED)
            .fetch_all(pool)
            .await
    }

    pub async fn serial_taken(pool: &PgPool, serial_number: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tires WHERE serial_number = $1)")
            .bind(serial_number)
            .fetch_one(pool)
            .await
    }

    /// Update descriptive fields. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTire,
    ) -> Result<Option<Tire>, sqlx::Error> {
        let query = format!(
            "WITH t AS (
                UPDATE tires SET
                    fire_number = COALESCE($2, fire_number),
                    brand = COALESCE($3, brand),
                    model = COALESCE($4, model),
                    size = COALESCE($5, size),
                    purchase_value = COALESCE($6, purchase_value),
                    recommended_pressure = COALESCE($7, recommended_pressure),
                    estimated_life_km = COALESCE($8, estimated_life_km),
                    supplier = COALESCE($9, supplier),
                    notes = COALESCE($10, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM t {JOINS}"
        );
        sqlx::query_as::<_, Tire>(&query)
            .bind(id)
            .bind(&input.fire_number)
            .bind(&input.brand)
            .bind(&input.model)
            .bind(&input.size)
            .bind(input.purchase_value)
            .bind(input.recommended_pressure)
            .bind(input.estimated_life_km)
            .bind(&input.supplier)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Apply a lifecycle transition under a row lock.
    ///
    /// The tire is locked with `FOR UPDATE`, `apply` computes the new state
    /// from the locked row, and the result is written before commit. A tire
    /// mounted into a position that another in-use tire holds is refused.
    /// Returns `None` if the tire does not exist.
    pub async fn transition<F>(pool: &PgPool, id: DbId, apply: F) -> Result<Option<Tire>, TxError>
    where
        F: FnOnce(&Tire) -> Result<TireLifecycle, CoreError> + Send,
    {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM tires t {JOINS} WHERE t.id = $1 FOR UPDATE OF t");
        let current = sqlx::query_as::<_, Tire>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Ok(None);
        };
        let next = apply(&current)?;

        if next.status == STATUS_IN_USE {
            if let (Some(equipment_id), Some(position)) = (next.equipment_id, next.position.as_deref()) {
                if Self::position_occupied(&mut tx, equipment_id, position, id).await? {
                    return Err(CoreError::Validation(format!(
                        "Position '{position}' on equipment {equipment_id} is already occupied"
                    ))
                    .into());
                }
            }
        }

        let tire = Self::save_lifecycle(&mut tx, id, &next).await?;
        tx.commit().await?;
        Ok(Some(tire))
    }

    /// Whether another in-use tire occupies `position` on the equipment.
    async fn position_occupied(
        conn: &mut PgConnection,
        equipment_id: DbId,
        position: &str,
        exclude_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM tires
                WHERE equipment_id = $1 AND position = $2 AND status = $3 AND id <> $4
             )",
        )
        .bind(equipment_id)
        .bind(position)
        .bind(STATUS_IN_USE)
        .bind(exclude_id)
        .fetch_one(conn)
        .await
    }

    /// Write the full lifecycle state. Clearing the mounting is expressed
    /// with `None`.
    async fn save_lifecycle(
        conn: &mut PgConnection,
        id: DbId,
        state: &TireLifecycle,
    ) -> Result<Tire, sqlx::Error> {
        let query = format!(
            "WITH t AS (
                UPDATE tires SET
                    tire_type = $2,
                    status = $3,
                    equipment_id = $4,
                    position = $5,
                    installed_at = $6,
                    km_at_install = $7,
                    km_current = $8,
                    tread_depth_mm = $9,
                    retread_supplier = $10,
                    retreaded_at = $11,
                    discarded_at = $12,
                    discard_reason = $13,
                    notes = $14,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM t {JOINS}"
        );
        sqlx::query_as::<_, Tire>(&query)
            .bind(id)
            .bind(&state.tire_type)
            .bind(&state.status)
            .bind(state.equipment_id)
            .bind(&state.position)
            .bind(state.installed_at)
            .bind(state.km_at_install)
            .bind(state.km_current)
            .bind(state.tread_depth_mm)
            .bind(&state.retread_supplier)
            .bind(state.retreaded_at)
            .bind(state.discarded_at)
            .bind(&state.discard_reason)
            .bind(&state.notes)
            .fetch_one(conn)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tires WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT status AS label, COUNT(*) AS count FROM tires GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }

    /// Tire counts per brand, largest first.
    pub async fn count_by_brand(pool: &PgPool) -> Result<Vec<LabelCount>, sqlx::Error> {
        sqlx::query_as::<_, LabelCount>(
            "SELECT brand AS label, COUNT(*) AS count FROM tires
             GROUP BY brand ORDER BY COUNT(*) DESC, brand",
        )
        .fetch_all(pool)
        .await
    }

    /// Sum of purchase values of tires in stock.
    pub async fn stock_value(pool: &PgPool) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(purchase_value), 0) FROM tires WHERE status = $1",
        )
        .bind(STATUS_STOCK)
        .fetch_one(pool)
        .await
    }

    /// Per-brand lifecycle aggregates.
    pub async fn brand_performance(pool: &PgPool) -> Result<Vec<BrandPerformance>, sqlx::Error> {
        sqlx::query_as::<_, BrandPerformance>(
            "SELECT brand,
                    COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = $1) AS in_use,
                    COUNT(*) FILTER (WHERE status = $2) AS discarded,
                    COUNT(*) FILTER (WHERE status = $3 OR tire_type = $4) AS retreaded,
                    COALESCE(SUM(km_current - km_at_install), 0) AS total_km,
                    COALESCE(SUM(purchase_value), 0) AS total_value
             FROM tires
             GROUP BY brand
             ORDER BY brand",
        )
        .bind(STATUS_IN_USE)
        .bind(STATUS_DISCARDED)
        .bind(STATUS_RETREADING)
        .bind(TYPE_RETREADED)
        .fetch_all(pool)
        .await
    }

    /// Tires with the highest recorded mileage.
    pub async fn top_by_km_run(pool: &PgPool, limit: i64) -> Result<Vec<Tire>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tires t {JOINS}
             WHERE t.km_current IS NOT NULL AND t.km_at_install IS NOT NULL
             ORDER BY (t.km_current - t.km_at_install) DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, Tire>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
