//! Integration tests for work-order numbering and completion.

use assert_matches::assert_matches;
use chrono::{Datelike, NaiveDate, Utc};
use cmms_core::error::CoreError;
use cmms_db::error::TxError;
use cmms_db::models::catalog::CreateEquipmentType;
use cmms_db::models::equipment::CreateEquipment;
use cmms_db::models::part::CreatePart;
use cmms_db::models::stock_movement::MovementFilter;
use cmms_db::models::user::CreateUser;
use cmms_db::models::work_order::{CompleteWorkOrder, CreateWorkOrder, PartUsage};
use cmms_db::repositories::{
    EquipmentRepo, EquipmentTypeRepo, PartRepo, StockMovementRepo, UserRepo, WorkOrderRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Fixture {
    equipment_id: i64,
    user_id: i64,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let type_id = EquipmentTypeRepo::create(
        pool,
        &CreateEquipmentType {
            name: "Dozer".to_string(),
            description: None,
            is_active: true,
        },
    )
    .await
    .unwrap()
    .id;
    let equipment = EquipmentRepo::create(
        pool,
        &CreateEquipment {
            internal_code: "DZ-01".to_string(),
            name: "Dozer 01".to_string(),
            equipment_type_id: type_id,
            model: "D6".to_string(),
            manufacturer: "Cat".to_string(),
            serial_number: "CAT-D6-1".to_string(),
            location: "Pit".to_string(),
            acquired_on: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            status: "active".to_string(),
            hour_meter: 500.0,
            acquisition_value: None,
            notes: None,
        },
    )
    .await
    .unwrap();
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: "planner".to_string(),
            email: "planner@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Pat Planner".to_string(),
            job_title: "Planner".to_string(),
            access_level: "planner".to_string(),
        },
    )
    .await
    .unwrap();
    Fixture {
        equipment_id: equipment.id,
        user_id: user.id,
    }
}

fn order_for(equipment_id: i64) -> CreateWorkOrder {
    CreateWorkOrder {
        equipment_id,
        mechanic_id: None,
        maintenance_type_id: None,
        order_type: "corrective".to_string(),
        priority: "high".to_string(),
        origin: "manual".to_string(),
        problem_description: "Hydraulic leak".to_string(),
        due_at: None,
        notes: None,
        created_by: None,
    }
}

async fn stocked_part(pool: &PgPool, code: &str, quantity: i32, unit_price: f64) -> i64 {
    PartRepo::create(
        pool,
        &CreatePart {
            code: code.to_string(),
            name: format!("Part {code}"),
            unit: "UN".to_string(),
            quantity,
            max_stock: 100,
            unit_price,
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .id
}

fn completion(user_id: i64, parts_used: Vec<PartUsage>) -> CompleteWorkOrder {
    CompleteWorkOrder {
        solution_description: "Replaced seal".to_string(),
        labor_cost: 100.0,
        notes: None,
        parts_used,
        user_id,
        closed_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// Numbering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_numbers_are_sequential(pool: PgPool) {
    let fx = fixture(&pool).await;
    let first = WorkOrderRepo::create(&pool, &order_for(fx.equipment_id))
        .await
        .unwrap();
    let second = WorkOrderRepo::create(&pool, &order_for(fx.equipment_id))
        .await
        .unwrap();

    let year = Utc::now().year();
    assert_eq!(first.number, format!("OS-{year}-001"));
    assert_eq!(second.number, format!("OS-{year}-002"));
    assert_eq!(first.status, "open");
    assert_eq!(first.equipment_name.as_deref(), Some("Dozer 01"));
    assert_eq!(first.equipment_code.as_deref(), Some("DZ-01"));
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_completion_consumes_parts(pool: PgPool) {
    let fx = fixture(&pool).await;
    let part_id = stocked_part(&pool, "SEAL-1", 10, 12.5).await;
    let order = WorkOrderRepo::create(&pool, &order_for(fx.equipment_id))
        .await
        .unwrap();

    let completed = WorkOrderRepo::complete(
        &pool,
        order.id,
        &completion(
            fx.user_id,
            vec![
                PartUsage { part_id, quantity: 4 },
                PartUsage { part_id, quantity: 0 },
            ],
        ),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(completed.status, "completed");
    assert_eq!(completed.parts_cost, 50.0);
    assert_eq!(completed.total_cost, 150.0);
    assert!(completed.closed_at.is_some());
    // Never started, so no execution time is recorded.
    assert!(completed.execution_hours.is_none());

    let part = PartRepo::find_by_id(&pool, part_id).await.unwrap().unwrap();
    assert_eq!(part.quantity, 6);

    let lines = WorkOrderRepo::parts(&pool, order.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].part_code, "SEAL-1");
    assert_eq!(lines[0].unit_cost, 12.5);

    let movements = StockMovementRepo::list(
        &pool,
        &MovementFilter {
            part_id: Some(part_id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, "out");
    assert_eq!(movements[0].quantity_before, 10);
    assert_eq!(movements[0].quantity_after, 6);
    assert_eq!(
        movements[0].reason.as_deref(),
        Some(format!("Used in work order {}", order.number).as_str())
    );
    assert_eq!(movements[0].user_name.as_deref(), Some("Pat Planner"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_insufficient_stock_rolls_back(pool: PgPool) {
    let fx = fixture(&pool).await;
    let plenty = stocked_part(&pool, "OK-1", 10, 1.0).await;
    let scarce = stocked_part(&pool, "LOW-1", 1, 1.0).await;
    let order = WorkOrderRepo::create(&pool, &order_for(fx.equipment_id))
        .await
        .unwrap();

    let err = WorkOrderRepo::complete(
        &pool,
        order.id,
        &completion(
            fx.user_id,
            vec![
                PartUsage { part_id: plenty, quantity: 2 },
                PartUsage { part_id: scarce, quantity: 5 },
            ],
        ),
    )
    .await
    .unwrap_err();
    assert_matches!(err, TxError::Core(CoreError::Validation(_)));

    let part = PartRepo::find_by_id(&pool, plenty).await.unwrap().unwrap();
    assert_eq!(part.quantity, 10);
    let reloaded = WorkOrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, "open");
    assert!(WorkOrderRepo::parts(&pool, order.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_part_is_not_found(pool: PgPool) {
    let fx = fixture(&pool).await;
    let order = WorkOrderRepo::create(&pool, &order_for(fx.equipment_id))
        .await
        .unwrap();
    let err = WorkOrderRepo::complete(
        &pool,
        order.id,
        &completion(fx.user_id, vec![PartUsage { part_id: 424242, quantity: 1 }]),
    )
    .await
    .unwrap_err();
    assert_matches!(
        err,
        TxError::Core(CoreError::NotFound { entity: "Part", id: 424242 })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_completed_order_cannot_complete_again(pool: PgPool) {
    let fx = fixture(&pool).await;
    let order = WorkOrderRepo::create(&pool, &order_for(fx.equipment_id))
        .await
        .unwrap();
    WorkOrderRepo::complete(&pool, order.id, &completion(fx.user_id, vec![]))
        .await
        .unwrap();
    let err = WorkOrderRepo::complete(&pool, order.id, &completion(fx.user_id, vec![]))
        .await
        .unwrap_err();
    assert_matches!(err, TxError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_start_assigns_missing_mechanic(pool: PgPool) {
    let fx = fixture(&pool).await;
    let order = WorkOrderRepo::create(&pool, &order_for(fx.equipment_id))
        .await
        .unwrap();
    let started = WorkOrderRepo::start(&pool, order.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(started.status, "in_progress");
    assert!(started.started_at.is_some());
    assert!(started.mechanic_id.is_none());
}
