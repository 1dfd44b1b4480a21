//! Repository for the `stock_locations` table.

use cmms_core::inventory::CENTRAL_LOCATION_CODE;
use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::catalog::{CreateStockLocation, StockLocation};

const COLUMNS: &str = "id, name, code, location, shelf, shelf_column, sector, responsible, \
                        notes, is_active, created_at, updated_at";

pub struct StockLocationRepo;

impl StockLocationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateStockLocation,
    ) -> Result<StockLocation, sqlx::Error> {
        let query = format!(
            "INSERT INTO stock_locations
                (name, code, location, shelf, shelf_column, sector, responsible, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StockLocation>(&query)
            .bind(&input.name)
            .bind(&input.code)
            .bind(&input.location)
            .bind(&input.shelf)
            .bind(&input.shelf_column)
            .bind(&input.sector)
            .bind(&input.responsible)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<StockLocation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stock_locations WHERE id = $1");
        sqlx::query_as::<_, StockLocation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active locations ordered by name.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<StockLocation>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM stock_locations WHERE is_active = true ORDER BY name");
        sqlx::query_as::<_, StockLocation>(&query)
            .fetch_all(pool)
            .await
    }

    /// Location given to newly imported parts: the central warehouse, or the
    /// first active location when it is missing.
    pub async fn default_for_import(conn: &mut PgConnection) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM stock_locations
             WHERE is_active = true
             ORDER BY (code = $1) DESC, id
             LIMIT 1",
        )
        .bind(CENTRAL_LOCATION_CODE)
        .fetch_optional(conn)
        .await
    }
}
