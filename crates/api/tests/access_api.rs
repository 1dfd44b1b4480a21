//! Access-level enforcement across resources, plus user administration.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, delete_auth, get_auth, login, post_json_auth, put_json_auth, token_for,
};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn user_management_is_admin_only(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let admin = token_for(&pool, &app, "root", "admin").await;
    let supervisor = token_for(&pool, &app, "sup", "supervisor").await;

    let response = get_auth(app.clone(), "/api/v1/users", &supervisor).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = serde_json::json!({
        "username": "newbie",
        "email": "newbie@test.local",
        "password": "secret123",
        "full_name": "New Person",
        "job_title": "Mechanic",
        "access_level": "mechanic"
    });
    let response = post_json_auth(app.clone(), "/api/v1/users", body.clone(), &admin).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["access_level"], "mechanic");

    let response = post_json_auth(app.clone(), "/api/v1/users", body, &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get_auth(app, "/api/v1/users?access_level=mechanic", &admin).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_access_level_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let admin = token_for(&pool, &app, "root", "admin").await;

    let body = serde_json::json!({
        "username": "weird",
        "email": "weird@test.local",
        "password": "secret123",
        "full_name": "Weird Level",
        "job_title": "?",
        "access_level": "overlord"
    });
    let response = post_json_auth(app, "/api/v1/users", body, &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn admin_cannot_delete_own_account(pool: PgPool) {
    let admin = create_user(&pool, "root", "admin").await;
    let app = common::build_test_app(pool);
    let token = login(&app, "root").await;

    let response = delete_auth(app, &format!("/api/v1/users/{}", admin.id), &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn any_user_can_edit_own_profile(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = token_for(&pool, &app, "mech", "mechanic").await;

    let body = serde_json::json!({ "full_name": "Renamed Mechanic", "job_title": "Lead" });
    let response = put_json_auth(app.clone(), "/api/v1/users/profile", body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["full_name"], "Renamed Mechanic");

    let response = get_auth(app, "/api/v1/users/access-levels", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 5);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn equipment_writes_need_supervisor(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let planner = token_for(&pool, &app, "pcm", "planner").await;

    let body = serde_json::json!({ "name": "Crane" });
    let response = post_json_auth(app.clone(), "/api/v1/equipment-types", body, &planner).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/v1/equipment-types", &planner).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn tire_writes_need_supervisor(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let mechanic = token_for(&pool, &app, "mech", "mechanic").await;
    let supervisor = token_for(&pool, &app, "sup", "supervisor").await;

    let body = serde_json::json!({
        "serial_number": "TR-1",
        "brand": "Michelin",
        "model": "X",
        "size": "295/80R22.5",
        "tire_type": "new",
        "purchased_on": "2024-02-01"
    });
    let response = post_json_auth(app.clone(), "/api/v1/tires", body.clone(), &mechanic).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(app.clone(), "/api/v1/tires", body.clone(), &supervisor).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "stock");

    let response = post_json_auth(app, "/api/v1/tires", body, &supervisor).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn dashboard_is_available_to_every_level(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = token_for(&pool, &app, "store", "storekeeper").await;

    let response = get_auth(app, "/api/v1/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
}
