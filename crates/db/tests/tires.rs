//! Integration tests for tire lifecycle transitions.

use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use cmms_core::error::CoreError;
use cmms_core::tire::{STATUS_IN_USE, STATUS_RETREADING, STATUS_STOCK, TYPE_NEW, TYPE_RETREADED};
use cmms_db::error::TxError;
use cmms_db::models::catalog::CatalogFilter;
use cmms_db::models::equipment::CreateEquipment;
use cmms_db::models::tire::{CreateTire, Tire, TireLifecycle};
use cmms_db::repositories::{EquipmentRepo, EquipmentTypeRepo, TireRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn truck(pool: &PgPool, code: &str) -> i64 {
    let type_id = EquipmentTypeRepo::list(pool, &CatalogFilter::default())
        .await
        .unwrap()[0]
        .id;
    EquipmentRepo::create(
        pool,
        &CreateEquipment {
            internal_code: code.to_string(),
            name: format!("Truck {code}"),
            equipment_type_id: type_id,
            model: "FMX".to_string(),
            manufacturer: "Volvo".to_string(),
            serial_number: format!("SN-{code}"),
            location: "Pit".to_string(),
            acquired_on: NaiveDate::from_ymd_opt(2021, 4, 1).unwrap(),
            status: "active".to_string(),
            hour_meter: 500.0,
            acquisition_value: None,
            notes: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn stock_tire(pool: &PgPool, serial: &str) -> i64 {
    TireRepo::create(
        pool,
        &CreateTire {
            serial_number: serial.to_string(),
            fire_number: None,
            brand: "Michelin".to_string(),
            model: "XZY3".to_string(),
            size: "295/80R22.5".to_string(),
            tire_type: TYPE_NEW.to_string(),
            purchased_on: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            purchase_value: Some(1_800.0),
            recommended_pressure: Some(110.0),
            estimated_life_km: Some(80_000.0),
            tread_depth_mm: Some(16.0),
            supplier: None,
            notes: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn install(
    pool: &PgPool,
    tire_id: i64,
    equipment_id: i64,
    position: &str,
) -> Result<Option<Tire>, TxError> {
    let position = position.to_string();
    TireRepo::transition(pool, tire_id, move |tire| {
        let mut lc = TireLifecycle::from(tire);
        lc.status = STATUS_IN_USE.to_string();
        lc.equipment_id = Some(equipment_id);
        lc.position = Some(position);
        lc.installed_at = Some(Utc::now());
        lc.km_at_install = Some(1_000.0);
        lc.km_current = Some(1_000.0);
        Ok(lc)
    })
    .await
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_install_mounts_the_tire(pool: PgPool) {
    let equipment_id = truck(&pool, "TRK-1").await;
    let tire_id = stock_tire(&pool, "PN-1").await;

    let tire = install(&pool, tire_id, equipment_id, "FL").await.unwrap().unwrap();
    assert_eq!(tire.status, STATUS_IN_USE);
    assert_eq!(tire.equipment_id, Some(equipment_id));
    assert_eq!(tire.equipment_name.as_deref(), Some("Truck TRK-1"));
    assert_eq!(tire.position.as_deref(), Some("FL"));

    let mounted = TireRepo::list_mounted(&pool, equipment_id).await.unwrap();
    assert_eq!(mounted.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_occupied_position_is_refused(pool: PgPool) {
    let equipment_id = truck(&pool, "TRK-2").await;
    let first = stock_tire(&pool, "PN-2").await;
    let second = stock_tire(&pool, "PN-3").await;

    install(&pool, first, equipment_id, "RR").await.unwrap();
    let result = install(&pool, second, equipment_id, "RR").await;
    assert_matches!(result, Err(TxError::Core(CoreError::Validation(msg))) if msg.contains("RR"));

    let untouched = TireRepo::find_by_id(&pool, second).await.unwrap().unwrap();
    assert_eq!(untouched.status, STATUS_STOCK);
    assert_eq!(untouched.equipment_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_position_index_rejects_a_second_mounted_tire(pool: PgPool) {
    let equipment_id = truck(&pool, "TRK-3").await;
    let first = stock_tire(&pool, "PN-4").await;
    let second = stock_tire(&pool, "PN-5").await;
    install(&pool, first, equipment_id, "FR").await.unwrap();

    let err = sqlx::query(
        "UPDATE tires SET status = 'in_use', equipment_id = $1, position = 'FR' WHERE id = $2",
    )
    .bind(equipment_id)
    .bind(second)
    .execute(&pool)
    .await
    .unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.constraint(), Some("uq_tires_equipment_position"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refused_transition_leaves_the_row_unchanged(pool: PgPool) {
    let tire_id = stock_tire(&pool, "PN-6").await;

    let result = TireRepo::transition(&pool, tire_id, |tire| {
        cmms_core::tire::check_can_remove(&tire.status)?;
        Ok(TireLifecycle::from(tire))
    })
    .await;
    assert_matches!(result, Err(TxError::Core(CoreError::Validation(_))));

    let tire = TireRepo::find_by_id(&pool, tire_id).await.unwrap().unwrap();
    assert_eq!(tire.status, STATUS_STOCK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_tire_returns_none(pool: PgPool) {
    let result = TireRepo::transition(&pool, 9_999, |tire| Ok(TireLifecycle::from(tire)))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_removed_position_can_be_reused(pool: PgPool) {
    let equipment_id = truck(&pool, "TRK-4").await;
    let first = stock_tire(&pool, "PN-7").await;
    let second = stock_tire(&pool, "PN-8").await;
    install(&pool, first, equipment_id, "FL").await.unwrap();

    let removed = TireRepo::transition(&pool, first, |tire| {
        let mut lc = TireLifecycle::from(tire);
        lc.status = STATUS_RETREADING.to_string();
        lc.equipment_id = None;
        lc.position = None;
        Ok(lc)
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(removed.status, STATUS_RETREADING);
    assert_eq!(removed.equipment_name, None);

    let mounted = install(&pool, second, equipment_id, "FL").await.unwrap().unwrap();
    assert_eq!(mounted.position.as_deref(), Some("FL"));

    let returned = TireRepo::transition(&pool, first, |tire| {
        let mut lc = TireLifecycle::from(tire);
        lc.status = STATUS_STOCK.to_string();
        lc.tire_type = TYPE_RETREADED.to_string();
        lc.km_at_install = Some(0.0);
        lc.km_current = Some(0.0);
        lc.installed_at = None;
        Ok(lc)
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(returned.status, STATUS_STOCK);
    assert_eq!(returned.tire_type, TYPE_RETREADED);
    assert_eq!(returned.km_current, Some(0.0));
}
