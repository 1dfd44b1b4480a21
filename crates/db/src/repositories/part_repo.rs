//! Repository for the `parts` table.
//!
//! Stock quantities change only through [`StockMovementRepo`], work-order
//! completion and the count/import operations here, each of which records
//! the matching movement rows in the same transaction.
//!
//! [`StockMovementRepo`]: crate::repositories::StockMovementRepo

use cmms_core::import::{
    group_code_for, parse_row, ImportReport, RawRow, RowOutcome, IMPORT_DEFAULT_MIN_STOCK,
};
use cmms_core::inventory::{count_adjustment_reason, count_difference, MOVEMENT_ADJUSTMENT};
use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::error::TxError;
use crate::filter::{bind_values, Filter};
use crate::models::part::{CategoryCount, CreatePart, ImportedPart, Part, PartFilter, UpdatePart};
use crate::models::stock_movement::CountResult;
use crate::repositories::{ItemGroupRepo, StockLocationRepo};

/// Columns selected from `parts p` joined with group and location names.
pub(crate) const COLUMNS: &str = "p.id, p.code, p.name, p.category, p.description, p.unit, \
                        p.quantity, p.min_stock, p.max_stock, p.unit_price, p.location, \
                        p.supplier, p.notes, p.item_group_id, g.name AS item_group_name, \
                        p.stock_location_id, sl.name AS stock_location_name, \
                        p.last_counted_at, p.last_counted_by, p.registered_on, \
                        p.last_valuation_price, p.last_purchase_price, p.created_at, \
                        p.updated_at";

pub(crate) const JOINS: &str = "LEFT JOIN item_groups g ON g.id = p.item_group_id \
                                LEFT JOIN stock_locations sl ON sl.id = p.stock_location_id";

pub struct PartRepo;

impl PartRepo {
    pub async fn create(pool: &PgPool, input: &CreatePart) -> Result<Part, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::create_in(&mut conn, input).await
    }

    /// Insert on an open connection or transaction.
    pub async fn create_in(
        conn: &mut PgConnection,
        input: &CreatePart,
    ) -> Result<Part, sqlx::Error> {
        let query = format!(
            "WITH p AS (
                INSERT INTO parts
                    (code, name, category, description, unit, quantity, min_stock, max_stock,
                     unit_price, location, supplier, notes, item_group_id, stock_location_id,
                     registered_on, last_valuation_price, last_purchase_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                RETURNING *
             )
             SELECT {COLUMNS} FROM p {JOINS}"
        );
        sqlx::query_as::<_, Part>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.description)
            .bind(&input.unit)
            .bind(input.quantity)
            .bind(input.min_stock)
            .bind(input.max_stock)
            .bind(input.unit_price)
            .bind(&input.location)
            .bind(&input.supplier)
            .bind(&input.notes)
            .bind(input.item_group_id)
            .bind(input.stock_location_id)
            .bind(input.registered_on)
            .bind(input.last_valuation_price)
            .bind(input.last_purchase_price)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Part>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parts p {JOINS} WHERE p.id = $1");
        sqlx::query_as::<_, Part>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Same as [`Self::find_by_id`] on an open transaction.
    pub(crate) async fn find_by_id_in(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Part>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parts p {JOINS} WHERE p.id = $1");
        sqlx::query_as::<_, Part>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// List parts ordered by name.
    pub async fn list(pool: &PgPool, filter: &PartFilter) -> Result<Vec<Part>, sqlx::Error> {
        let mut f = Filter::new();
        f.eq_text("p.category", filter.category.as_deref())
            .eq_id("p.item_group_id", filter.item_group_id)
            .eq_id("p.stock_location_id", filter.stock_location_id)
            .search(&["p.code", "p.name"], filter.search.as_deref());
        if filter.low_stock == Some(true) {
            f.push_raw("p.quantity <= p.min_stock");
        }
        let query = format!(
            "SELECT {COLUMNS} FROM parts p {JOINS} {} ORDER BY p.name",
            f.where_clause()
        );
        bind_values(sqlx::query_as::<_, Part>(&query), f.values())
            .fetch_all(pool)
            .await
    }

    /// Update a part's descriptive fields. Quantity is not touched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePart,
    ) -> Result<Option<Part>, sqlx::Error> {
        let query = format!(
            "WITH p AS (
                UPDATE parts SET
                    name = COALESCE($2, name),
                    category = COALESCE($3, category),
                    description = COALESCE($4, description),
                    unit = COALESCE($5, unit),
                    min_stock = COALESCE($6, min_stock),
                    max_stock = COALESCE($7, max_stock),
                    unit_price = COALESCE($8, unit_price),
                    location = COALESCE($9, location),
                    supplier = COALESCE($10, supplier),
                    notes = COALESCE($11, notes),
                    item_group_id = COALESCE($12, item_group_id),
                    stock_location_id = COALESCE($13, stock_location_id),
                    last_valuation_price = COALESCE($14, last_valuation_price),
                    last_purchase_price = COALESCE($15, last_purchase_price),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM p {JOINS}"
        );
        sqlx::query_as::<_, Part>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.description)
            .bind(&input.unit)
            .bind(input.min_stock)
            .bind(input.max_stock)
            .bind(input.unit_price)
            .bind(&input.location)
            .bind(&input.supplier)
            .bind(&input.notes)
            .bind(input.item_group_id)
            .bind(input.stock_location_id)
            .bind(input.last_valuation_price)
            .bind(input.last_purchase_price)
            .fetch_optional(pool)
            .await
    }

    /// Number of work-order lines that consumed the part.
    pub async fn work_order_usage_count(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM work_order_parts WHERE part_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM parts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Distinct non-empty categories, sorted.
    pub async fn categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM parts
             WHERE category IS NOT NULL AND category <> ''
             ORDER BY category",
        )
        .fetch_all(pool)
        .await
    }

    /// Per-category counts for the stock report. Uncategorised parts are
    /// grouped under an empty name.
    pub async fn category_counts(pool: &PgPool) -> Result<Vec<CategoryCount>, sqlx::Error> {
        sqlx::query_as::<_, CategoryCount>(
            "SELECT COALESCE(category, '') AS category,
                    COUNT(*) AS count,
                    COALESCE(SUM(quantity), 0)::BIGINT AS total_quantity,
                    COALESCE(SUM(quantity * unit_price), 0) AS total_value
             FROM parts
             GROUP BY COALESCE(category, '')
             ORDER BY category",
        )
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Inventory count
    // -----------------------------------------------------------------------

    /// Record a physical count of one part.
    ///
    /// A non-zero difference writes an `adjustment` movement and sets the
    /// quantity to the counted value. Returns `None` if the part does not
    /// exist.
    pub async fn count_one(
        pool: &PgPool,
        part_id: DbId,
        counted_quantity: i32,
        notes: Option<&str>,
        user_id: DbId,
    ) -> Result<Option<CountResult>, TxError> {
        let mut tx = pool.begin().await?;

        let system: Option<i32> =
            sqlx::query_scalar("SELECT quantity FROM parts WHERE id = $1 FOR UPDATE")
                .bind(part_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(system) = system else {
            return Ok(None);
        };
        let difference = count_difference(system, counted_quantity)?;

        if difference != 0 {
            sqlx::query(
                "INSERT INTO stock_movements
                    (part_id, movement_type, quantity, quantity_before, quantity_after, reason, user_id)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(part_id)
            .bind(MOVEMENT_ADJUSTMENT)
            .bind(difference.abs())
            .bind(system)
            .bind(counted_quantity)
            .bind(count_adjustment_reason(difference, notes))
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE parts SET
                quantity = $2,
                last_counted_at = NOW(),
                last_counted_by = $3,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(part_id)
        .bind(counted_quantity)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let part = Self::find_by_id_in(&mut tx, part_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;

        Ok(Some(CountResult {
            part: part.into(),
            difference,
        }))
    }

    /// Stamp every part as counted now. Returns the number of parts.
    pub async fn mark_all_counted(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE parts SET last_counted_at = NOW(), last_counted_by = $1, updated_at = NOW()",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Spreadsheet import
    // -----------------------------------------------------------------------

    /// Upsert parts from spreadsheet rows in one transaction.
    ///
    /// Row-level problems are collected in the report and do not abort the
    /// import; a database error rolls everything back.
    pub async fn import_rows(pool: &PgPool, rows: &[RawRow]) -> Result<ImportReport, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut report = ImportReport {
            total_rows: rows.len(),
            ..Default::default()
        };
        let default_location = StockLocationRepo::default_for_import(&mut tx).await?;

        for (index, raw) in rows.iter().enumerate() {
            let row = match parse_row(raw) {
                RowOutcome::Skip => {
                    report.skipped += 1;
                    continue;
                }
                RowOutcome::Invalid(message) => {
                    report.push_error(index, &message);
                    continue;
                }
                RowOutcome::Part(row) => row,
            };

            let item_group_id = match row.group_name.as_deref() {
                Some(name) => {
                    let code = group_code_for(name);
                    let (id, created) = ItemGroupRepo::find_or_create_in(&mut tx, name, &code).await?;
                    if created {
                        tracing::debug!(group = name, code = %code, "Created item group during import");
                    }
                    Some(id)
                }
                None => None,
            };

            let imported = ImportedPart {
                code: row.code,
                name: row.name,
                unit: row.unit,
                item_group_id,
                min_stock: row.min_stock,
                registered_on: row.registered_on,
                last_valuation_price: row.last_valuation_price,
                last_purchase_price: row.last_purchase_price,
            };
            if Self::upsert_imported_in(&mut tx, &imported, default_location).await? {
                report.added += 1;
            } else {
                report.updated += 1;
            }
        }

        tx.commit().await?;
        Ok(report)
    }

    /// Insert or update one imported part. Returns `true` when inserted.
    async fn upsert_imported_in(
        conn: &mut PgConnection,
        input: &ImportedPart,
        default_location: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let existing: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM parts WHERE code = $1 FOR UPDATE")
                .bind(&input.code)
                .fetch_optional(&mut *conn)
                .await?;

        match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE parts SET
                        name = $2,
                        unit = $3,
                        item_group_id = COALESCE($4, item_group_id),
                        last_valuation_price = COALESCE($5, last_valuation_price),
                        last_purchase_price = COALESCE($6, last_purchase_price),
                        unit_price = COALESCE($6, unit_price),
                        min_stock = COALESCE($7, min_stock),
                        registered_on = COALESCE($8, registered_on),
                        updated_at = NOW()
                     WHERE id = $1",
                )
                .bind(id)
                .bind(&input.name)
                .bind(&input.unit)
                .bind(input.item_group_id)
                .bind(input.last_valuation_price)
                .bind(input.last_purchase_price)
                .bind(input.min_stock)
                .bind(input.registered_on)
                .execute(&mut *conn)
                .await?;
                Ok(false)
            }
            None => {
                sqlx::query(
                    "INSERT INTO parts
                        (code, name, unit, item_group_id, stock_location_id, quantity, min_stock,
                         unit_price, last_valuation_price, last_purchase_price, registered_on)
                     VALUES ($1, $2, $3, $4, $5, 0, $6, COALESCE($7, 0), $8, $7, $9)",
                )
                .bind(&input.code)
                .bind(&input.name)
                .bind(&input.unit)
                .bind(input.item_group_id)
                .bind(default_location)
                .bind(input.min_stock.unwrap_or(IMPORT_DEFAULT_MIN_STOCK))
                .bind(input.last_purchase_price)
                .bind(input.last_valuation_price)
                .bind(input.registered_on)
                .execute(&mut *conn)
                .await?;
                Ok(true)
            }
        }
    }
}
