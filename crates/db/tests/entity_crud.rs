//! Integration tests for catalog, equipment and mechanic repositories.
//!
//! Exercises the repository layer against a real database:
//! - Reference data seeded by migration
//! - Joined display names on inserted rows
//! - Unique constraint violations
//! - Partial updates and filtered listings

use chrono::NaiveDate;
use cmms_db::models::catalog::{CatalogFilter, CreateEquipmentType, CreateMaintenanceType};
use cmms_db::models::equipment::{CreateEquipment, EquipmentFilter, UpdateEquipment};
use cmms_db::models::mechanic::CreateMechanic;
use cmms_db::models::user::{CreateUser, UpdateUser, UserFilter};
use cmms_db::repositories::{
    EquipmentRepo, EquipmentTypeRepo, MaintenanceTypeRepo, MechanicRepo, StockLocationRepo,
    UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_type(pool: &PgPool, name: &str) -> i64 {
    EquipmentTypeRepo::create(
        pool,
        &CreateEquipmentType {
            name: name.to_string(),
            description: None,
            is_active: true,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_equipment(type_id: i64, code: &str, serial: &str) -> CreateEquipment {
    CreateEquipment {
        internal_code: code.to_string(),
        name: format!("Machine {code}"),
        equipment_type_id: type_id,
        model: "X1".to_string(),
        manufacturer: "Acme".to_string(),
        serial_number: serial.to_string(),
        location: "Yard".to_string(),
        acquired_on: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
        status: "active".to_string(),
        hour_meter: 0.0,
        acquisition_value: None,
        notes: None,
    }
}

fn new_mechanic(national_id: &str, email: Option<&str>) -> CreateMechanic {
    CreateMechanic {
        full_name: format!("Mechanic {national_id}"),
        national_id: national_id.to_string(),
        phone: None,
        email: email.map(str::to_string),
        specialty: Some("Hydraulics".to_string()),
        experience_level: "mid".to_string(),
        salary: None,
        hired_on: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
        status: "active".to_string(),
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_reference_data_is_seeded(pool: PgPool) {
    let types = MaintenanceTypeRepo::list(&pool, &CatalogFilter::default())
        .await
        .unwrap();
    assert!(types.iter().any(|t| t.code == "PREV"));

    let locations = StockLocationRepo::list_active(&pool).await.unwrap();
    assert!(locations.iter().any(|l| l.code == "ALM_CENTRAL"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_maintenance_type_color_defaults(pool: PgPool) {
    let created = MaintenanceTypeRepo::create(
        &pool,
        &CreateMaintenanceType {
            name: "Inspection".to_string(),
            code: "INSP".to_string(),
            description: None,
            color: "#123abc".to_string(),
            is_active: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.color, "#123abc");
    assert_eq!(MaintenanceTypeRepo::usage_count(&pool, created.id).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_equipment_carries_type_name(pool: PgPool) {
    let type_id = new_type(&pool, "Crane").await;
    let created = EquipmentRepo::create(&pool, &new_equipment(type_id, "EQ-1", "SN-1"))
        .await
        .unwrap();
    assert_eq!(created.equipment_type_name.as_deref(), Some("Crane"));
    assert_eq!(created.status, "active");

    let found = EquipmentRepo::find_by_id(&pool, created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.internal_code, "EQ-1");
    assert_eq!(EquipmentTypeRepo::usage_count(&pool, type_id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_equipment_unique_code(pool: PgPool) {
    let type_id = new_type(&pool, "Crane").await;
    EquipmentRepo::create(&pool, &new_equipment(type_id, "EQ-1", "SN-1"))
        .await
        .unwrap();
    let err = EquipmentRepo::create(&pool, &new_equipment(type_id, "EQ-1", "SN-2"))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_equipment_internal_code"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_equipment_update_and_filter(pool: PgPool) {
    let type_id = new_type(&pool, "Crane").await;
    let a = EquipmentRepo::create(&pool, &new_equipment(type_id, "EQ-1", "SN-1"))
        .await
        .unwrap();
    EquipmentRepo::create(&pool, &new_equipment(type_id, "EQ-2", "SN-2"))
        .await
        .unwrap();

    let updated = EquipmentRepo::update(
        &pool,
        a.id,
        &UpdateEquipment {
            status: Some("maintenance".to_string()),
            hour_meter: Some(1250.5),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.status, "maintenance");
    assert_eq!(updated.hour_meter, 1250.5);
    assert_eq!(updated.name, a.name);

    let in_maintenance = EquipmentRepo::list(
        &pool,
        &EquipmentFilter {
            status: Some("maintenance".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(in_maintenance.len(), 1);
    assert_eq!(in_maintenance[0].id, a.id);

    let searched = EquipmentRepo::list(
        &pool,
        &EquipmentFilter {
            search: Some("eq-2".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(searched.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_missing_equipment_returns_none(pool: PgPool) {
    let result = EquipmentRepo::update(&pool, 9999, &UpdateEquipment::default())
        .await
        .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Mechanics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_mechanic_specialties_and_email_lookup(pool: PgPool) {
    MechanicRepo::create(&pool, &new_mechanic("111", Some("ana@example.com")))
        .await
        .unwrap();
    let mut other = new_mechanic("222", None);
    other.specialty = Some("Electrical".to_string());
    MechanicRepo::create(&pool, &other).await.unwrap();

    let specialties = MechanicRepo::specialties(&pool).await.unwrap();
    assert_eq!(specialties, vec!["Electrical".to_string(), "Hydraulics".to_string()]);

    let found = MechanicRepo::find_by_email(&pool, "ANA@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.national_id, "111");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_mechanic_performance_without_orders(pool: PgPool) {
    let m = MechanicRepo::create(&pool, &new_mechanic("111", None))
        .await
        .unwrap();
    let totals = MechanicRepo::performance_totals(&pool, m.id).await.unwrap();
    assert_eq!(totals.total, 0);
    assert_eq!(totals.execution_hours_count, 0);
    assert_eq!(totals.total_cost, 0.0);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_user_crud(pool: PgPool) {
    let user = UserRepo::create(
        &pool,
        &CreateUser {
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "John Doe".to_string(),
            job_title: "Planner".to_string(),
            access_level: "planner".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(user.is_active);
    assert!(UserRepo::email_taken(&pool, "JDOE@example.com", None).await.unwrap());
    assert!(!UserRepo::email_taken(&pool, "jdoe@example.com", Some(user.id)).await.unwrap());

    let updated = UserRepo::update(
        &pool,
        user.id,
        &UpdateUser {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!updated.is_active);
    assert_eq!(updated.access_level, "planner");

    let inactive = UserRepo::list(
        &pool,
        &UserFilter {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(inactive.len(), 1);

    assert!(UserRepo::delete(&pool, user.id).await.unwrap());
    assert_eq!(UserRepo::count(&pool).await.unwrap(), 0);
}
