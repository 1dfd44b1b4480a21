//! Repository for the `equipment` table.

use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::filter::{bind_values, Filter};
use crate::models::equipment::{CreateEquipment, Equipment, EquipmentFilter, UpdateEquipment};

/// Columns selected from `equipment e` joined with its type.
const COLUMNS: &str = "e.id, e.internal_code, e.name, e.equipment_type_id, \
                        t.name AS equipment_type_name, e.model, e.manufacturer, \
                        e.serial_number, e.location, e.acquired_on, e.status, e.hour_meter, \
                        e.acquisition_value, e.notes, e.created_at, e.updated_at";

const JOINS: &str = "LEFT JOIN equipment_types t ON t.id = e.equipment_type_id";

pub struct EquipmentRepo;

impl EquipmentRepo {
    pub async fn create(pool: &PgPool, input: &CreateEquipment) -> Result<Equipment, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::create_in(&mut conn, input).await
    }

    /// Insert on an open connection or transaction.
    pub async fn create_in(
        conn: &mut PgConnection,
        input: &CreateEquipment,
    ) -> Result<Equipment, sqlx::Error> {
        let query = format!(
            "WITH e AS (
                INSERT INTO equipment
                    (internal_code, name, equipment_type_id, model, manufacturer, serial_number,
                     location, acquired_on, status, hour_meter, acquisition_value, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING *
             )
             SELECT {COLUMNS} FROM e {JOINS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(&input.internal_code)
            .bind(&input.name)
            .bind(input.equipment_type_id)
            .bind(&input.model)
            .bind(&input.manufacturer)
            .bind(&input.serial_number)
            .bind(&input.location)
            .bind(input.acquired_on)
            .bind(&input.status)
            .bind(input.hour_meter)
            .bind(input.acquisition_value)
            .bind(&input.notes)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM equipment e {JOINS} WHERE e.id = $1");
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List equipment ordered by name.
    pub async fn list(
        pool: &PgPool,
        filter: &EquipmentFilter,
    ) -> Result<Vec<Equipment>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_text("e.status", filter.status.as_deref())
            .eq_id("e.equipment_type_id", filter.equipment_type_id)
            .search(
                &["e.name", "e.internal_code", "e.manufacturer"],
                filter.search.as_deref(),
            );
        let query = format!(
            "SELECT {COLUMNS} FROM equipment e {JOINS} {} ORDER BY e.name",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, Equipment>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    /// Update equipment. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEquipment,
    ) -> Result<Option<Equipment>, sqlx::Error> {
        let query = format!(
            "WITH e AS (
                UPDATE equipment SET
                    name = COALESCE($2, name),
                    equipment_type_id = COALESCE($3, equipment_type_id),
                    model = COALESCE($4, model),
                    manufacturer = COALESCE($5, manufacturer),
                    status = COALESCE($6, status),
                    location = COALESCE($7, location),
                    hour_meter = COALESCE($8, hour_meter),
                    acquisition_value = COALESCE($9, acquisition_value),
                    notes = COALESCE($10, notes),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM e {JOINS}"
        );
        sqlx::query_as::<_, Equipment>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.equipment_type_id)
            .bind(&input.model)
            .bind(&input.manufacturer)
            .bind(&input.status)
            .bind(&input.location)
            .bind(input.hour_meter)
            .bind(input.acquisition_value)
            .bind(&input.notes)
            .fetch_optional(pool)
            .await
    }

    /// Whether another row already uses the internal code.
    pub async fn code_taken(pool: &PgPool, internal_code: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM equipment WHERE internal_code = $1)",
        )
        .bind(internal_code)
        .fetch_one(pool)
        .await
    }

    pub async fn serial_taken(pool: &PgPool, serial_number: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM equipment WHERE serial_number = $1)",
        )
        .bind(serial_number)
        .fetch_one(pool)
        .await
    }

    /// Number of work orders referencing the equipment.
    pub async fn work_order_count(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM work_orders WHERE equipment_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
