//! Repository for the `stock_movements` table.

use chrono::Duration;
use cmms_core::inventory::{apply_movement, MovementType};
use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::TxError;
use crate::filter::{bind_values, BindValue, Filter};
use crate::models::stock_movement::{
    CreateStockMovement, MovementFilter, RecordedMovement, StockMovement,
};
use crate::repositories::PartRepo;

/// Columns selected from `stock_movements sm` joined with part and user.
const COLUMNS: &str = "sm.id, sm.part_id, p.code AS part_code, p.name AS part_name, \
                        sm.movement_type, sm.quantity, sm.quantity_before, sm.quantity_after, \
                        sm.reason, sm.invoice_number, sm.equipment_id, sm.mechanic_id, sm.sector, \
                        sm.work_order_id, sm.source_location_id, sm.target_location_id, \
                        sm.user_id, u.full_name AS user_name, sm.moved_at";

const JOINS: &str = "LEFT JOIN parts p ON p.id = sm.part_id \
                     LEFT JOIN users u ON u.id = sm.user_id";

pub struct StockMovementRepo;

impl StockMovementRepo {
    /// List movements, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &MovementFilter,
    ) -> Result<Vec<StockMovement>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_id("sm.part_id", filter.part_id)
            .eq_text("sm.movement_type", filter.movement_type.as_deref())
            .eq_id("sm.user_id", filter.user_id);
        if let Some(from) = filter.date_from {
            f.push("sm.moved_at >= {}::DATE", BindValue::Date(from));
        }
        if let Some(to) = filter.date_to {
            // Inclusive end date: everything before the following midnight.
            f.push("sm.moved_at < {}::DATE", BindValue::Date(to + Duration::days(1)));
        }
        let query = format!(
            "SELECT {COLUMNS} FROM stock_movements sm {JOINS} {}
             ORDER BY sm.moved_at DESC, sm.id DESC",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, StockMovement>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    async fn find_by_id_in(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<StockMovement, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stock_movements sm {JOINS} WHERE sm.id = $1");
        sqlx::query_as::<_, StockMovement>(&query)
            .bind(id)
            .fetch_one(conn)
            .await
    }

    /// Apply a movement to a part and record it.
    ///
    /// The part row is locked for the duration. `transfer` keeps the quantity
    /// and, with a target, moves the part to that location. Returns `None`
    /// if the part does not exist.
    pub async fn record(
        pool: &PgPool,
        movement: MovementType,
        input: &CreateStockMovement,
        user_id: DbId,
    ) -> Result<Option<RecordedMovement>, TxError> {
        let mut tx = pool.begin().await?;

        let current: Option<(i32, Option<DbId>)> = sqlx::query_as(
            "SELECT quantity, stock_location_id FROM parts WHERE id = $1 FOR UPDATE",
        )
        .bind(input.part_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((before, location_id)) = current else {
            return Ok(None);
        };
        let after = apply_movement(before, movement, input.quantity)?;

        let (source, target) = match movement {
            MovementType::Transfer => (
                input.source_location_id.or(location_id),
                input.target_location_id,
            ),
            _ => (input.source_location_id, input.target_location_id),
        };

        let movement_id: DbId = sqlx::query_scalar(
            "INSERT INTO stock_movements
                (part_id, movement_type, quantity, quantity_before, quantity_after, reason,
                 invoice_number, equipment_id, mechanic_id, sector, work_order_id,
                 source_location_id, target_location_id, user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING id",
        )
        .bind(input.part_id)
        .bind(movement.as_str())
        .bind(input.quantity)
        .bind(before)
        .bind(after)
        .bind(&input.reason)
        .bind(&input.invoice_number)
        .bind(input.equipment_id)
        .bind(input.mechanic_id)
        .bind(&input.sector)
        .bind(input.work_order_id)
        .bind(source)
        .bind(target)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let relocate = match movement {
            MovementType::Transfer => target,
            _ => None,
        };
        sqlx::query(
            "UPDATE parts SET
                quantity = $2,
                stock_location_id = COALESCE($3, stock_location_id),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(input.part_id)
        .bind(after)
        .bind(relocate)
        .execute(&mut *tx)
        .await?;

        let movement = Self::find_by_id_in(&mut tx, movement_id).await?;
        let part = PartRepo::find_by_id_in(&mut tx, input.part_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(Some(RecordedMovement {
            part: part.into(),
            movement,
        }))
    }
}
