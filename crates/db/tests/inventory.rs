//! Integration tests for stock movements, inventory counts and spreadsheet
//! import.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use cmms_core::error::CoreError;
use cmms_core::import::RawRow;
use cmms_core::inventory::MovementType;
use cmms_db::error::TxError;
use cmms_db::models::catalog::CreateStockLocation;
use cmms_db::models::part::{CreatePart, PartFilter};
use cmms_db::models::stock_movement::{CreateStockMovement, MovementFilter};
use cmms_db::models::user::CreateUser;
use cmms_db::repositories::{PartRepo, StockLocationRepo, StockMovementRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn storekeeper(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: "stock".to_string(),
            email: "stock@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Sam Stock".to_string(),
            job_title: "Storekeeper".to_string(),
            access_level: "storekeeper".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn part(pool: &PgPool, code: &str, quantity: i32, min_stock: i32) -> i64 {
    PartRepo::create(
        pool,
        &CreatePart {
            code: code.to_string(),
            name: format!("Part {code}"),
            category: Some("Filters".to_string()),
            unit: "UN".to_string(),
            quantity,
            min_stock,
            max_stock: 100,
            unit_price: 2.0,
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

fn movement(part_id: i64, quantity: i32) -> CreateStockMovement {
    CreateStockMovement {
        part_id,
        quantity,
        ..Default::default()
    }
}

fn row(cells: &[(&str, &str)]) -> RawRow {
    cells
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Movements
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_in_and_out_movements(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let id = part(&pool, "FLT-1", 5, 3).await;

    let received = StockMovementRepo::record(&pool, MovementType::In, &movement(id, 10), user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.part.part.quantity, 15);
    assert_eq!(received.movement.quantity_before, 5);
    assert_eq!(received.movement.quantity_after, 15);
    assert_eq!(received.movement.user_name.as_deref(), Some("Sam Stock"));

    let issued = StockMovementRepo::record(&pool, MovementType::Out, &movement(id, 13), user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(issued.part.part.quantity, 2);
    assert_eq!(issued.part.stock_status, "low");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_out_beyond_stock_is_refused(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let id = part(&pool, "FLT-2", 3, 1).await;

    let err = StockMovementRepo::record(&pool, MovementType::Out, &movement(id, 4), user)
        .await
        .unwrap_err();
    assert_matches!(err, TxError::Core(CoreError::Validation(_)));

    let reloaded = PartRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(reloaded.quantity, 3);
    let history = StockMovementRepo::list(&pool, &MovementFilter::default())
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_movement_for_missing_part(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let result = StockMovementRepo::record(&pool, MovementType::In, &movement(999, 1), user)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_transfer_relocates_part(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let id = part(&pool, "FLT-3", 8, 1).await;
    let annex = StockLocationRepo::create(
        &pool,
        &CreateStockLocation {
            name: "Annex".to_string(),
            code: "ANNEX".to_string(),
            location: None,
            shelf: Some("B2".to_string()),
            shelf_column: None,
            sector: None,
            responsible: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    let input = CreateStockMovement {
        target_location_id: Some(annex.id),
        ..movement(id, 8)
    };
    let moved = StockMovementRepo::record(&pool, MovementType::Transfer, &input, user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.part.part.quantity, 8);
    assert_eq!(moved.part.part.stock_location_id, Some(annex.id));
    assert_eq!(moved.part.part.stock_location_name.as_deref(), Some("Annex"));
    assert_eq!(moved.movement.movement_type, "transfer");
    assert_eq!(moved.movement.target_location_id, Some(annex.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_movement_date_filters(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let id = part(&pool, "FLT-4", 0, 0).await;
    StockMovementRepo::record(&pool, MovementType::In, &movement(id, 1), user)
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let same_day = MovementFilter {
        date_from: Some(today),
        date_to: Some(today),
        ..Default::default()
    };
    assert_eq!(StockMovementRepo::list(&pool, &same_day).await.unwrap().len(), 1);

    let tomorrow = MovementFilter {
        date_from: Some(today + Duration::days(1)),
        ..Default::default()
    };
    assert!(StockMovementRepo::list(&pool, &tomorrow).await.unwrap().is_empty());

    let outs = MovementFilter {
        movement_type: Some("out".to_string()),
        ..Default::default()
    };
    assert!(StockMovementRepo::list(&pool, &outs).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Inventory count
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_count_writes_adjustment(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let id = part(&pool, "CNT-1", 10, 2).await;

    let result = PartRepo::count_one(&pool, id, 7, Some("shelf recount"), user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.difference, -3);
    assert_eq!(result.part.part.quantity, 7);
    assert_eq!(result.part.part.last_counted_by, Some(user));
    assert!(result.part.part.last_counted_at.is_some());

    let history = StockMovementRepo::list(
        &pool,
        &MovementFilter {
            part_id: Some(id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].movement_type, "adjustment");
    assert_eq!(history[0].quantity, 3);
    assert_eq!(
        history[0].reason.as_deref(),
        Some("Inventory count adjustment (-3): shelf recount")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_matching_count_writes_no_movement(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let id = part(&pool, "CNT-2", 4, 2).await;

    let result = PartRepo::count_one(&pool, id, 4, None, user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.difference, 0);
    assert!(StockMovementRepo::list(&pool, &MovementFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_negative_count_is_refused(pool: PgPool) {
    let user = storekeeper(&pool).await;
    let id = part(&pool, "CNT-3", 4, 2).await;
    let err = PartRepo::count_one(&pool, id, -1, None, user)
        .await
        .unwrap_err();
    assert_matches!(err, TxError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_low_stock_filter(pool: PgPool) {
    part(&pool, "LOW-1", 1, 5).await;
    part(&pool, "OK-1", 9, 5).await;
    let low = PartRepo::list(
        &pool,
        &PartFilter {
            low_stock: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let codes: Vec<&str> = low.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(codes, vec!["LOW-1"]);
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_import_adds_updates_and_reports(pool: PgPool) {
    let existing = part(&pool, "IMP-2", 6, 1).await;

    let rows = vec![
        row(&[
            ("item_number", "IMP-1"),
            ("item_description", "Air filter"),
            ("item_group", "Filters"),
            ("last_purchase_price", "12,50"),
        ]),
        row(&[
            ("item_number", "IMP-2"),
            ("item_description", "Oil filter (new name)"),
            ("low_stock", "3"),
        ]),
        row(&[("item_number", "IMP-3")]),
        row(&[
            ("item_number", "IMP-4"),
            ("item_description", "Bad price"),
            ("last_purchase_price", "abc"),
        ]),
    ];

    let report = PartRepo::import_rows(&pool, &rows).await.unwrap();
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.added, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.error_count, 1);

    let added = PartRepo::list(
        &pool,
        &PartFilter {
            search: Some("IMP-1".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].quantity, 0);
    assert_eq!(added[0].min_stock, 10);
    assert_eq!(added[0].unit_price, 12.5);
    assert_eq!(added[0].item_group_name.as_deref(), Some("Filters"));
    assert!(added[0].stock_location_id.is_some());

    let updated = PartRepo::find_by_id(&pool, existing).await.unwrap().unwrap();
    assert_eq!(updated.name, "Oil filter (new name)");
    assert_eq!(updated.min_stock, 3);
    assert_eq!(updated.quantity, 6);
}
