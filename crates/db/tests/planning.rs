//! Integration tests for preventive plans and the maintenance backlog.

use chrono::{Duration, NaiveDate, Utc};
use cmms_core::backlog::priority_score;
use cmms_core::preventive::{work_order_description, Schedule, DEFAULT_LEAD_DAYS};
use cmms_db::models::backlog::{BacklogFilter, CreateBacklogItem};
use cmms_db::models::catalog::{CatalogFilter, CreateEquipmentType};
use cmms_db::models::equipment::CreateEquipment;
use cmms_db::models::preventive_plan::{CreatePreventivePlan, PreventivePlanFilter};
use cmms_db::models::work_order::CreateWorkOrder;
use cmms_db::repositories::{
    BacklogGrouping, BacklogOrder, BacklogRepo, EquipmentRepo, EquipmentTypeRepo,
    MaintenanceTypeRepo, PreventivePlanRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn equipment(pool: &PgPool, code: &str) -> i64 {
    let type_id = EquipmentTypeRepo::create(
        pool,
        &CreateEquipmentType {
            name: format!("Type {code}"),
            description: None,
            is_active: true,
        },
    )
    .await
    .unwrap()
    .id;
    EquipmentRepo::create(
        pool,
        &CreateEquipment {
            internal_code: code.to_string(),
            name: format!("Loader {code}"),
            equipment_type_id: type_id,
            model: "L90".to_string(),
            manufacturer: "Volvo".to_string(),
            serial_number: format!("SN-{code}"),
            location: "Plant".to_string(),
            acquired_on: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            status: "active".to_string(),
            hour_meter: 1200.0,
            acquisition_value: None,
            notes: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn preventive_type(pool: &PgPool) -> i64 {
    MaintenanceTypeRepo::list(pool, &CatalogFilter::default())
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.code == "PREV")
        .unwrap()
        .id
}

fn preventive_order(equipment_id: i64, maintenance_type_id: i64) -> CreateWorkOrder {
    CreateWorkOrder {
        equipment_id,
        mechanic_id: None,
        maintenance_type_id: Some(maintenance_type_id),
        order_type: "preventive".to_string(),
        priority: "medium".to_string(),
        origin: "preventive_auto".to_string(),
        problem_description: work_order_description("250h service"),
        due_at: None,
        notes: None,
        created_by: None,
    }
}

fn backlog_item(title: &str, priority: &str, urgency: &str) -> CreateBacklogItem {
    let identified_at = Utc::now();
    let score = priority_score(
        &cmms_core::backlog::ScoreInput {
            priority,
            urgency,
            impact: "medium",
            category: "maintenance",
            identified_at,
        },
        identified_at,
    );
    CreateBacklogItem {
        title: title.to_string(),
        description: None,
        category: "maintenance".to_string(),
        item_type: "repair".to_string(),
        priority: priority.to_string(),
        urgency: urgency.to_string(),
        impact: "medium".to_string(),
        equipment_id: None,
        work_order_id: None,
        preventive_plan_id: None,
        estimated_effort_hours: Some(4.0),
        estimated_cost: Some(250.0),
        identified_at,
        due_at: None,
        responsible: Some("Night shift".to_string()),
        notes: None,
        priority_score: score,
        created_by: None,
    }
}

fn by_score() -> BacklogOrder {
    BacklogOrder {
        column: "priority_score",
        direction: "DESC",
        limit: 20,
        offset: 0,
    }
}

// ---------------------------------------------------------------------------
// Preventive plans
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_plan_execution_opens_work_order(pool: PgPool) {
    let equipment_id = equipment(&pool, "LD-01").await;
    let type_id = preventive_type(&pool).await;
    let now = Utc::now();

    let mut schedule = Schedule {
        is_active: true,
        interval_days: Some(30),
        interval_hours: Some(250),
        lead_days: DEFAULT_LEAD_DAYS,
        ..Default::default()
    };
    schedule.compute_next_due(now, Some(1200.0)).unwrap();

    let plan = PreventivePlanRepo::create(
        &pool,
        &CreatePreventivePlan {
            name: "250h service".to_string(),
            description: None,
            equipment_id,
            maintenance_type_id: type_id,
            priority: "medium".to_string(),
            schedule,
        },
    )
    .await
    .unwrap();
    assert_eq!(plan.equipment_name.as_deref(), Some("Loader LD-01"));
    assert_eq!(plan.maintenance_type_name.as_deref(), Some("Preventive"));
    assert_eq!(plan.next_hour_meter, Some(1450.0));
    assert!(!plan.is_due(now));

    let mut executed = plan.schedule();
    executed
        .record_execution(now, plan.equipment_hour_meter, None)
        .unwrap();
    let (saved, order) = PreventivePlanRepo::execute(
        &pool,
        plan.id,
        &executed,
        Some(&preventive_order(equipment_id, type_id)),
    )
    .await
    .unwrap();

    assert!(saved.last_executed_at.is_some());
    assert_eq!(saved.last_hour_meter, Some(1200.0));
    let order = order.unwrap();
    assert_eq!(order.origin, "preventive_auto");
    assert_eq!(order.order_type, "preventive");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generation_skips_equipment_with_open_preventive(pool: PgPool) {
    let first = equipment(&pool, "LD-02").await;
    let second = equipment(&pool, "LD-03").await;
    let type_id = preventive_type(&pool).await;

    let created = PreventivePlanRepo::generate_work_orders(
        &pool,
        &[
            preventive_order(first, type_id),
            preventive_order(first, type_id),
            preventive_order(second, type_id),
        ],
    )
    .await
    .unwrap();

    let equipment_ids: Vec<i64> = created.iter().map(|o| o.equipment_id).collect();
    assert_eq!(equipment_ids, vec![first, second]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_plan_filters(pool: PgPool) {
    let equipment_id = equipment(&pool, "LD-04").await;
    let type_id = preventive_type(&pool).await;
    for (name, active) in [("Active plan", true), ("Paused plan", false)] {
        PreventivePlanRepo::create(
            &pool,
            &CreatePreventivePlan {
                name: name.to_string(),
                description: None,
                equipment_id,
                maintenance_type_id: type_id,
                priority: "low".to_string(),
                schedule: Schedule {
                    is_active: active,
                    interval_days: Some(10),
                    lead_days: DEFAULT_LEAD_DAYS,
                    next_due_at: Some(Utc::now() + Duration::days(10)),
                    ..Default::default()
                },
            },
        )
        .await
        .unwrap();
    }

    let active = PreventivePlanRepo::list(
        &pool,
        &PreventivePlanFilter {
            is_active: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Active plan");
}

// ---------------------------------------------------------------------------
// Backlog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_backlog_paging_and_order(pool: PgPool) {
    BacklogRepo::create(&pool, &backlog_item("Fix ramp", "low", "low"))
        .await
        .unwrap();
    BacklogRepo::create(&pool, &backlog_item("Replace hose", "critical", "high"))
        .await
        .unwrap();
    BacklogRepo::create(&pool, &backlog_item("Paint cab", "medium", "low"))
        .await
        .unwrap();

    let (items, total) = BacklogRepo::list(
        &pool,
        &BacklogFilter::default(),
        BacklogOrder {
            limit: 2,
            ..by_score()
        },
    )
    .await
    .unwrap();
    assert_eq!(total, 3);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Replace hose");

    let (found, total) = BacklogRepo::list(
        &pool,
        &BacklogFilter {
            search: Some("ramp".to_string()),
            ..Default::default()
        },
        by_score(),
    )
    .await
    .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].title, "Fix ramp");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_backlog_totals_and_grouping(pool: PgPool) {
    let urgent = BacklogRepo::create(&pool, &backlog_item("Brake leak", "critical", "critical"))
        .await
        .unwrap();
    let done = BacklogRepo::create(&pool, &backlog_item("Mirror", "low", "low"))
        .await
        .unwrap();
    BacklogRepo::transition(&pool, done.id, "completed", None, Some(Utc::now()), None)
        .await
        .unwrap()
        .unwrap();

    let totals = BacklogRepo::totals(&pool, Utc::now()).await.unwrap();
    assert_eq!(totals.total, 2);
    assert_eq!(totals.critical, 1);
    assert_eq!(totals.overdue, 0);
    assert_eq!(totals.open_effort_hours, 4.0);
    assert_eq!(totals.open_cost, 250.0);

    let by_status = BacklogRepo::count_by(&pool, BacklogGrouping::Status)
        .await
        .unwrap();
    let labels: Vec<(&str, i64)> = by_status
        .iter()
        .map(|c| (c.label.as_str(), c.count))
        .collect();
    assert_eq!(labels, vec![("completed", 1), ("identified", 1)]);

    let open = BacklogRepo::list_open(&pool).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, urgent.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_backlog_transition_stamps_start(pool: PgPool) {
    let item = BacklogRepo::create(&pool, &backlog_item("Weld bucket", "high", "medium"))
        .await
        .unwrap();
    let started = BacklogRepo::transition(
        &pool,
        item.id,
        "in_progress",
        Some(Utc::now()),
        None,
        Some("Crew assigned"),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(started.status, "in_progress");
    assert!(started.started_at.is_some());
    assert_eq!(started.notes.as_deref(), Some("Crew assigned"));
    assert!(BacklogRepo::transition(&pool, 9999, "completed", None, None, None)
        .await
        .unwrap()
        .is_none());
}
