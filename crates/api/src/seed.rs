//! Demo data for a freshly migrated database.
//!
//! Reference catalogs come from the migrations. This module only adds the
//! login accounts and a handful of operational records so the API has
//! something to show on first start.

use anyhow::{anyhow, Context};
use chrono::{Duration, NaiveDate, Utc};
use cmms_core::access::{
    LEVEL_ADMIN, LEVEL_MECHANIC, LEVEL_PLANNER, LEVEL_STOREKEEPER, LEVEL_SUPERVISOR,
};
use cmms_core::types::{Date, DbId};
use cmms_core::{equipment, mechanic, tire, work_order};
use cmms_db::models::catalog::{CatalogFilter, EquipmentType, MaintenanceType};
use cmms_db::models::equipment::CreateEquipment;
use cmms_db::models::mechanic::CreateMechanic;
use cmms_db::models::part::CreatePart;
use cmms_db::models::tire::CreateTire;
use cmms_db::models::user::CreateUser;
use cmms_db::models::work_order::CreateWorkOrder;
use cmms_db::repositories::{
    EquipmentRepo, EquipmentTypeRepo, MaintenanceTypeRepo, MechanicRepo, PartRepo, TireRepo,
    UserRepo, WorkOrderRepo,
};
use cmms_db::DbPool;
use sqlx::PgConnection;

use crate::auth::password::hash_password;

/// `(username, password, full name, job title, level)` for each demo account.
const DEMO_USERS: &[(&str, &str, &str, &str, &str)] = &[
    ("admin", "admin123", "System Administrator", "Administrator", LEVEL_ADMIN),
    ("supervisor", "super123", "Maintenance Supervisor", "Supervisor", LEVEL_SUPERVISOR),
    ("planner", "pcm123", "Maintenance Planner", "Planner", LEVEL_PLANNER),
    ("storekeeper", "almox123", "Warehouse Keeper", "Storekeeper", LEVEL_STOREKEEPER),
    ("mechanic", "mec123", "Field Mechanic", "Mechanic", LEVEL_MECHANIC),
];

/// Seed demo records when the users table is empty.
///
/// Returns `false` without touching anything if at least one user exists.
/// All records are written in one transaction, so a failure leaves the
/// database empty and the next start tries again.
pub async fn seed_demo_data(pool: &DbPool) -> anyhow::Result<bool> {
    if UserRepo::count(pool).await? > 0 {
        return Ok(false);
    }

    let equipment_types = EquipmentTypeRepo::list(pool, &CatalogFilter::default()).await?;
    let maintenance_types = MaintenanceTypeRepo::list(pool, &CatalogFilter::default()).await?;

    let mut tx = pool.begin().await?;
    let admin_id = seed_users(&mut tx).await?;
    let equipment_ids = seed_equipment(&mut tx, &equipment_types).await?;
    let mechanic_ids = seed_mechanics(&mut tx).await?;
    seed_parts(&mut tx).await?;
    seed_tires(&mut tx).await?;
    seed_work_orders(&mut tx, &maintenance_types, admin_id, &equipment_ids, &mechanic_ids).await?;
    tx.commit().await.context("Failed to commit demo data")?;

    tracing::info!(
        users = DEMO_USERS.len(),
        equipment = equipment_ids.len(),
        mechanics = mechanic_ids.len(),
        "Demo data seeded"
    );
    Ok(true)
}

async fn seed_users(conn: &mut PgConnection) -> anyhow::Result<DbId> {
    let mut admin_id = None;
    for (username, password, full_name, job_title, level) in DEMO_USERS {
        let password_hash =
            hash_password(password).map_err(|e| anyhow!("Failed to hash demo password: {e}"))?;
        let user = UserRepo::create_in(
            &mut *conn,
            &CreateUser {
                username: (*username).to_string(),
                email: format!("{username}@cmms.local"),
                password_hash,
                full_name: (*full_name).to_string(),
                job_title: (*job_title).to_string(),
                access_level: (*level).to_string(),
            },
        )
        .await
        .with_context(|| format!("Failed to create demo user {username}"))?;

        if *level == LEVEL_ADMIN {
            admin_id = Some(user.id);
        }
    }
    admin_id.ok_or_else(|| anyhow!("Demo admin user was not created"))
}

async fn seed_equipment(
    conn: &mut PgConnection,
    types: &[EquipmentType],
) -> anyhow::Result<Vec<DbId>> {
    let type_id = |name: &str| {
        types
            .iter()
            .find(|t| t.name == name)
            .or_else(|| types.first())
            .map(|t| t.id)
            .ok_or_else(|| anyhow!("No equipment types available for demo data"))
    };

    let fleet = [
        ("EXC-001", "Excavator CAT 320", "Excavator", "320", "Caterpillar", "CAT320-0001", "Pit A", 4_250.0),
        ("TRK-001", "Haul Truck Volvo FMX", "Truck", "FMX 500", "Volvo", "VFMX-0001", "Pit A", 8_120.0),
        ("LDR-001", "Wheel Loader 950", "Loader", "950 GC", "Caterpillar", "CAT950-0001", "Yard", 2_980.0),
    ];

    let mut ids = Vec::with_capacity(fleet.len());
    for (code, name, kind, model, manufacturer, serial, location, hours) in fleet {
        let created = EquipmentRepo::create_in(
            &mut *conn,
            &CreateEquipment {
                internal_code: code.to_string(),
                name: name.to_string(),
                equipment_type_id: type_id(kind)?,
                model: model.to_string(),
                manufacturer: manufacturer.to_string(),
                serial_number: serial.to_string(),
                location: location.to_string(),
                acquired_on: demo_date(2022, 3, 15)?,
                status: equipment::STATUS_ACTIVE.to_string(),
                hour_meter: hours,
                acquisition_value: None,
                notes: None,
            },
        )
        .await
        .with_context(|| format!("Failed to create demo equipment {code}"))?;
        ids.push(created.id);
    }
    Ok(ids)
}

async fn seed_mechanics(conn: &mut PgConnection) -> anyhow::Result<Vec<DbId>> {
    let crew = [
        ("Carlos Pereira", "111.111.111-11", "Hydraulics", mechanic::LEVEL_SENIOR),
        ("Ana Souza", "222.222.222-22", "Electrical", mechanic::LEVEL_MID),
        ("João Lima", "333.333.333-33", "Diesel engines", mechanic::LEVEL_JUNIOR),
    ];

    let mut ids = Vec::with_capacity(crew.len());
    for (full_name, national_id, specialty, level) in crew {
        let created = MechanicRepo::create_in(
            &mut *conn,
            &CreateMechanic {
                full_name: full_name.to_string(),
                national_id: national_id.to_string(),
                phone: None,
                email: None,
                specialty: Some(specialty.to_string()),
                experience_level: level.to_string(),
                salary: None,
                hired_on: demo_date(2021, 6, 1)?,
                status: mechanic::STATUS_ACTIVE.to_string(),
                notes: None,
            },
        )
        .await
        .with_context(|| format!("Failed to create demo mechanic {full_name}"))?;
        ids.push(created.id);
    }
    Ok(ids)
}

async fn seed_parts(conn: &mut PgConnection) -> anyhow::Result<()> {
    let parts = [
        ("FLT-OIL-01", "Engine oil filter", "Filters", 24, 10, 60, 45.90),
        ("LUB-15W40", "Engine oil 15W40 (20 L)", "Lubricants", 6, 8, 40, 389.00),
        ("BRG-6205", "Bearing 6205", "Bearings", 15, 5, 50, 32.50),
    ];

    for (code, name, category, quantity, min_stock, max_stock, unit_price) in parts {
        PartRepo::create_in(
            &mut *conn,
            &CreatePart {
                code: code.to_string(),
                name: name.to_string(),
                category: Some(category.to_string()),
                description: None,
                unit: "UN".to_string(),
                quantity,
                min_stock,
                max_stock,
                unit_price,
                location: None,
                supplier: None,
                notes: None,
                item_group_id: None,
                stock_location_id: None,
                registered_on: None,
                last_valuation_price: None,
                last_purchase_price: None,
            },
        )
        .await
        .with_context(|| format!("Failed to create demo part {code}"))?;
    }
    Ok(())
}

async fn seed_tires(conn: &mut PgConnection) -> anyhow::Result<()> {
    let tires = [
        ("PN-0001", "F-001", "Michelin", "XZY3", tire::TYPE_NEW, 16.0),
        ("PN-0002", "F-002", "Bridgestone", "M840", tire::TYPE_RETREADED, 12.5),
    ];

    for (serial, fire_number, brand, model, tire_type, tread) in tires {
        TireRepo::create_in(
            &mut *conn,
            &CreateTire {
                serial_number: serial.to_string(),
                fire_number: Some(fire_number.to_string()),
                brand: brand.to_string(),
                model: model.to_string(),
                size: "295/80R22.5".to_string(),
                tire_type: tire_type.to_string(),
                purchased_on: demo_date(2024, 1, 10)?,
                purchase_value: None,
                recommended_pressure: Some(110.0),
                estimated_life_km: Some(80_000.0),
                tread_depth_mm: Some(tread),
                supplier: None,
                notes: None,
            },
        )
        .await
        .with_context(|| format!("Failed to create demo tire {serial}"))?;
    }
    Ok(())
}

async fn seed_work_orders(
    conn: &mut PgConnection,
    maintenance_types: &[MaintenanceType],
    created_by: DbId,
    equipment_ids: &[DbId],
    mechanic_ids: &[DbId],
) -> anyhow::Result<()> {
    let maintenance_type = |code: &str| {
        maintenance_types
            .iter()
            .find(|t| t.code == code)
            .map(|t| t.id)
    };

    let now = Utc::now();
    let orders = [
        (0, Some(0), work_order::TYPE_PREVENTIVE, work_order::PRIORITY_MEDIUM, "PREV", "250 h service", 5),
        (1, Some(1), work_order::TYPE_CORRECTIVE, work_order::PRIORITY_HIGH, "CORR", "Hydraulic leak at the tipping cylinder", 1),
        (2, None, work_order::TYPE_CORRECTIVE, work_order::PRIORITY_CRITICAL, "CORR", "Engine does not start", -2),
    ];

    for (equipment, mechanic, order_type, priority, kind, problem, due_in_days) in orders {
        let equipment_id = *equipment_ids
            .get(equipment)
            .ok_or_else(|| anyhow!("Missing demo equipment"))?;
        WorkOrderRepo::create_in(
            &mut *conn,
            &CreateWorkOrder {
                equipment_id,
                mechanic_id: mechanic.and_then(|i| mechanic_ids.get(i).copied()),
                maintenance_type_id: maintenance_type(kind),
                order_type: order_type.to_string(),
                priority: priority.to_string(),
                origin: work_order::ORIGIN_MANUAL.to_string(),
                problem_description: problem.to_string(),
                due_at: Some(now + Duration::days(due_in_days)),
                notes: None,
                created_by: Some(created_by),
            },
        )
        .await
        .context("Failed to create demo work order")?;
    }
    Ok(())
}

fn demo_date(year: i32, month: u32, day: u32) -> anyhow::Result<Date> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| anyhow!("Invalid demo date"))
}
