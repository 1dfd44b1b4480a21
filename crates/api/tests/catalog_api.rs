//! HTTP-level tests for catalog deletes, which are refused while another
//! record still references the entry.

mod common;

use axum::http::StatusCode;
use axum::Router;
use cmms_db::models::catalog::CatalogFilter;
use cmms_db::repositories::{EquipmentTypeRepo, ItemGroupRepo};
use common::{
    body_json, create_equipment, delete_auth, get_auth, maintenance_type_id, post_file_auth,
    post_json_auth, token_for,
};
use sqlx::PgPool;

async fn delete(app: &Router, token: &str, uri: String) -> (StatusCode, serde_json::Value) {
    let response = delete_auth(app.clone(), &uri, token).await;
    let status = response.status();
    (status, body_json(response).await)
}

#[sqlx::test(migrations = "../db/migrations")]
async fn equipment_type_in_use_is_kept(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = token_for(&pool, &app, "sup", "supervisor").await;
    create_equipment(&pool, &app, &token, "EXC-400").await;
    let used = EquipmentTypeRepo::list(&pool, &CatalogFilter::default())
        .await
        .unwrap()[0]
        .id;

    let (status, json) = delete(&app, &token, format!("/api/v1/equipment-types/{used}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("1 equipment"));
    let uri = format!("/api/v1/equipment-types/{used}");
    assert_eq!(get_auth(app.clone(), &uri, &token).await.status(), StatusCode::OK);

    let body = serde_json::json!({ "name": "Drill rig" });
    let response = post_json_auth(app.clone(), "/api/v1/equipment-types", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let unused = body_json(response).await["data"]["id"].as_i64().unwrap();
    let (status, _) = delete(&app, &token, format!("/api/v1/equipment-types/{unused}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn maintenance_type_in_use_is_kept(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = token_for(&pool, &app, "sup", "supervisor").await;
    let equipment_id = create_equipment(&pool, &app, &token, "EXC-401").await;
    let type_id = maintenance_type_id(&pool, "CORR").await;

    let body = serde_json::json!({
        "equipment_id": equipment_id,
        "maintenance_type_id": type_id,
        "order_type": "corrective",
        "priority": "high",
        "problem_description": "Hydraulic leak"
    });
    let response = post_json_auth(app.clone(), "/api/v1/work-orders", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let (status, json) = delete(&app, &token, format!("/api/v1/maintenance-types/{type_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("work orders"));

    let unused = maintenance_type_id(&pool, "PREV").await;
    let (status, _) = delete(&app, &token, format!("/api/v1/maintenance-types/{unused}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn item_group_in_use_is_kept(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = token_for(&pool, &app, "sup", "supervisor").await;
    let sheet = "item_number,item_description,item_group,stock_unit\nFLT-1,Air filter,Filters,UN\n";
    let response =
        post_file_auth(app.clone(), "/api/v1/imports/parts", "parts.csv", sheet.as_bytes(), &token)
            .await;
    assert_eq!(response.status(), StatusCode::OK);

    let groups = ItemGroupRepo::list(&pool, &CatalogFilter::default()).await.unwrap();
    let filters = groups.iter().find(|g| g.name == "Filters").unwrap().id;
    let bearings = groups.iter().find(|g| g.name == "Bearings").unwrap().id;

    let (status, json) = delete(&app, &token, format!("/api/v1/item-groups/{filters}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("parts"));

    let (status, _) = delete(&app, &token, format!("/api/v1/item-groups/{bearings}")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = delete(&app, &token, format!("/api/v1/item-groups/{bearings}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
