//! Tests for the first-start demo seed.

use chrono::NaiveDate;
use cmms_api::seed::seed_demo_data;
use cmms_db::models::catalog::CatalogFilter;
use cmms_db::models::equipment::CreateEquipment;
use cmms_db::repositories::{EquipmentRepo, EquipmentTypeRepo, UserRepo};
use sqlx::PgPool;

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn seed_runs_once(pool: PgPool) {
    assert!(seed_demo_data(&pool).await.unwrap());
    assert_eq!(UserRepo::count(&pool).await.unwrap(), 5);
    assert_eq!(count(&pool, "equipment").await, 3);
    assert!(count(&pool, "work_orders").await > 0);

    assert!(!seed_demo_data(&pool).await.unwrap());
    assert_eq!(count(&pool, "equipment").await, 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_seed_leaves_nothing_behind(pool: PgPool) {
    let type_id = EquipmentTypeRepo::list(&pool, &CatalogFilter::default())
        .await
        .unwrap()[0]
        .id;
    let blocker = EquipmentRepo::create(
        &pool,
        &CreateEquipment {
            internal_code: "EXC-001".to_string(),
            name: "Existing excavator".to_string(),
            equipment_type_id: type_id,
            model: "330".to_string(),
            manufacturer: "Caterpillar".to_string(),
            serial_number: "EXISTING-1".to_string(),
            location: "Yard".to_string(),
            acquired_on: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            status: "active".to_string(),
            hour_meter: 0.0,
            acquisition_value: None,
            notes: None,
        },
    )
    .await
    .unwrap();

    assert!(seed_demo_data(&pool).await.is_err());
    assert_eq!(UserRepo::count(&pool).await.unwrap(), 0, "demo users are rolled back");
    assert_eq!(count(&pool, "equipment").await, 1);

    EquipmentRepo::delete(&pool, blocker.id).await.unwrap();
    assert!(seed_demo_data(&pool).await.unwrap(), "next start seeds again");
    assert_eq!(UserRepo::count(&pool).await.unwrap(), 5);
}
