//! HTTP-level tests for the work order lifecycle: open, start, complete
//! with parts, and the guards around it.

mod common;

use axum::http::StatusCode;
use axum::Router;
use chrono::{Duration, Utc};
use cmms_db::models::catalog::CatalogFilter;
use cmms_db::repositories::EquipmentTypeRepo;
use common::{body_json, delete_auth, get_auth, post_json_auth, put_json_auth, token_for};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Tokens {
    supervisor: String,
    planner: String,
    storekeeper: String,
    mechanic: String,
}

async fn tokens(pool: &PgPool, app: &Router) -> Tokens {
    Tokens {
        supervisor: token_for(pool, app, "sup", "supervisor").await,
        planner: token_for(pool, app, "pcm", "planner").await,
        storekeeper: token_for(pool, app, "store", "storekeeper").await,
        mechanic: token_for(pool, app, "mech", "mechanic").await,
    }
}

async fn create_equipment(pool: &PgPool, app: &Router, token: &str) -> i64 {
    let type_id = EquipmentTypeRepo::list(pool, &CatalogFilter::default())
        .await
        .unwrap()[0]
        .id;
    let body = serde_json::json!({
        "internal_code": "EXC-100",
        "name": "Excavator 100",
        "equipment_type_id": type_id,
        "model": "320",
        "manufacturer": "Caterpillar",
        "serial_number": "SN-100",
        "location": "Pit B",
        "acquired_on": "2023-05-10",
        "hour_meter": 1200.0
    });
    let response = post_json_auth(app.clone(), "/api/v1/equipment", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn create_part(app: &Router, token: &str, code: &str, quantity: i32, price: f64) -> i64 {
    let body = serde_json::json!({
        "code": code,
        "name": format!("Part {code}"),
        "unit": "UN",
        "quantity": quantity,
        "min_stock": 2,
        "unit_price": price
    });
    let response = post_json_auth(app.clone(), "/api/v1/inventory/parts", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn open_order(app: &Router, token: &str, equipment_id: i64) -> serde_json::Value {
    let body = serde_json::json!({
        "equipment_id": equipment_id,
        "order_type": "corrective",
        "priority": "high",
        "problem_description": "Hydraulic leak"
    });
    let response = post_json_auth(app.clone(), "/api/v1/work-orders", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn full_lifecycle_consumes_stock_and_totals_costs(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;
    let part_id = create_part(&app, &t.storekeeper, "FLT-1", 10, 25.0).await;

    let order = open_order(&app, &t.planner, equipment_id).await;
    let id = order["id"].as_i64().unwrap();
    assert_eq!(order["status"], "open");
    assert_eq!(order["origin"], "manual");
    assert!(order["number"].as_str().unwrap().starts_with("OS-"));

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/work-orders/{id}/start"),
        serde_json::json!({}),
        &t.mechanic,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let started = body_json(response).await;
    assert_eq!(started["data"]["status"], "in_progress");
    assert!(started["data"]["started_at"].is_string());

    let body = serde_json::json!({
        "solution_description": "Replaced hose and filter",
        "labor_cost": 150.0,
        "parts_used": [{ "part_id": part_id, "quantity": 3 }]
    });
    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/work-orders/{id}/complete"),
        body,
        &t.mechanic,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let completed = body_json(response).await["data"].clone();
    assert_eq!(completed["status"], "completed");
    assert_eq!(completed["parts_cost"], 75.0);
    assert_eq!(completed["total_cost"], 225.0);

    let response = get_auth(app.clone(), &format!("/api/v1/inventory/parts/{part_id}"), &t.mechanic).await;
    let part = body_json(response).await;
    assert_eq!(part["data"]["quantity"], 7);

    let response = get_auth(app.clone(), &format!("/api/v1/work-orders/{id}/parts"), &t.mechanic).await;
    let parts = body_json(response).await;
    assert_eq!(parts["data"]["parts"].as_array().unwrap().len(), 1);
    assert_eq!(parts["data"]["total_cost"], 75.0);

    let response = put_json_auth(
        app,
        &format!("/api/v1/work-orders/{id}/complete"),
        serde_json::json!({ "solution_description": "again" }),
        &t.mechanic,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completion_with_insufficient_stock_rolls_back(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;
    let part_id = create_part(&app, &t.storekeeper, "BRG-1", 2, 10.0).await;
    let id = open_order(&app, &t.planner, equipment_id).await["id"].as_i64().unwrap();

    let body = serde_json::json!({
        "solution_description": "Bearing swap",
        "parts_used": [{ "part_id": part_id, "quantity": 5 }]
    });
    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/work-orders/{id}/complete"),
        body,
        &t.planner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let order = body_json(get_auth(app.clone(), &format!("/api/v1/work-orders/{id}"), &t.planner).await).await;
    assert_eq!(order["data"]["status"], "open");
    let part = body_json(get_auth(app, &format!("/api/v1/inventory/parts/{part_id}"), &t.planner).await).await;
    assert_eq!(part["data"]["quantity"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completion_requires_solution_text(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;
    let id = open_order(&app, &t.planner, equipment_id).await["id"].as_i64().unwrap();

    let response = put_json_auth(
        app,
        &format!("/api/v1/work-orders/{id}/complete"),
        serde_json::json!({ "solution_description": "   " }),
        &t.mechanic,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn completion_through_update_is_refused(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;
    let id = open_order(&app, &t.planner, equipment_id).await["id"].as_i64().unwrap();

    let response = put_json_auth(
        app,
        &format!("/api/v1/work-orders/{id}"),
        serde_json::json!({ "status": "completed" }),
        &t.planner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn in_progress_order_cannot_be_deleted(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;
    let id = open_order(&app, &t.planner, equipment_id).await["id"].as_i64().unwrap();

    put_json_auth(
        app.clone(),
        &format!("/api/v1/work-orders/{id}/start"),
        serde_json::json!({}),
        &t.mechanic,
    )
    .await;

    let response = delete_auth(app.clone(), &format!("/api/v1/work-orders/{id}"), &t.supervisor).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app,
        &format!("/api/v1/work-orders/{id}/start"),
        serde_json::json!({}),
        &t.mechanic,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn mechanic_start_assigns_matching_mechanic(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;

    let body = serde_json::json!({
        "full_name": "Mechanic Test",
        "national_id": "123.456.789-00",
        "email": "mech@test.local",
        "hired_on": "2022-01-15"
    });
    let response = post_json_auth(app.clone(), "/api/v1/mechanics", body, &t.supervisor).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let mechanic_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let id = open_order(&app, &t.planner, equipment_id).await["id"].as_i64().unwrap();
    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/work-orders/{id}/start"),
        serde_json::json!({}),
        &t.mechanic,
    )
    .await;
    let started = body_json(response).await;
    assert_eq!(started["data"]["mechanic_id"], mechanic_id);

    let response = get_auth(app, "/api/v1/work-orders/mechanic-alerts", &t.mechanic).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["mechanic"]["id"], mechanic_id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn overdue_order_raises_alert(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;

    let body = serde_json::json!({
        "equipment_id": equipment_id,
        "order_type": "preventive",
        "priority": "medium",
        "problem_description": "Lubrication route",
        "due_at": Utc::now() - Duration::days(10)
    });
    let response = post_json_auth(app.clone(), "/api/v1/work-orders", body, &t.planner).await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = get_auth(app, &format!("/api/v1/work-orders/{id}/alerts"), &t.mechanic).await;
    let json = body_json(response).await;
    assert!(json["data"]["total"].as_u64().unwrap() >= 1);
    assert_eq!(json["data"]["alerts"][0]["severity"], "high");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn print_sheet_bundles_order_context(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;
    let id = open_order(&app, &t.planner, equipment_id).await["id"].as_i64().unwrap();

    let response = get_auth(app, &format!("/api/v1/work-orders/{id}/print"), &t.mechanic).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["order"]["id"], id);
    assert_eq!(json["data"]["equipment"]["internal_code"], "EXC-100");
    assert_eq!(json["data"]["signatures"].as_array().unwrap().len(), 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn storekeeper_cannot_open_or_execute_orders(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let t = tokens(&pool, &app).await;
    let equipment_id = create_equipment(&pool, &app, &t.supervisor).await;

    let body = serde_json::json!({
        "equipment_id": equipment_id,
        "order_type": "corrective",
        "priority": "low",
        "problem_description": "Noise"
    });
    let response = post_json_auth(app.clone(), "/api/v1/work-orders", body, &t.storekeeper).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let id = open_order(&app, &t.planner, equipment_id).await["id"].as_i64().unwrap();
    let response = put_json_auth(
        app,
        &format!("/api/v1/work-orders/{id}/start"),
        serde_json::json!({}),
        &t.storekeeper,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
