#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use cmms_api::auth::jwt::JwtConfig;
use cmms_api::auth::password::hash_password;
use cmms_api::config::ServerConfig;
use cmms_api::router::build_app_router;
use cmms_api::state::AppState;
use cmms_db::models::catalog::CatalogFilter;
use cmms_db::models::user::{CreateUser, User};
use cmms_db::repositories::{EquipmentTypeRepo, MaintenanceTypeRepo, UserRepo};

/// Password shared by every user created through [`create_user`].
pub const TEST_PASSWORD: &str = "test_password_123";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        seed_demo_data: false,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Build the full application router (same middleware stack as production).
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with the given access level directly through the repository.
pub async fn create_user(pool: &PgPool, username: &str, access_level: &str) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@test.local"),
            password_hash,
            full_name: format!("Test {username}"),
            job_title: "Tester".to_string(),
            access_level: access_level.to_string(),
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Log in through the API and return the bearer token.
pub async fn login(app: &Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": TEST_PASSWORD });
    let response = post_json(app.clone(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");
    let json = body_json(response).await;
    json["token"]
        .as_str()
        .expect("login response must carry a token")
        .to_string()
}

/// Create a user with `access_level` and return a token for it.
pub async fn token_for(pool: &PgPool, app: &Router, username: &str, access_level: &str) -> String {
    create_user(pool, username, access_level).await;
    login(app, username).await
}

/// Register a piece of equipment through the API and return its id.
pub async fn create_equipment(pool: &PgPool, app: &Router, token: &str, code: &str) -> i64 {
    let type_id = EquipmentTypeRepo::list(pool, &CatalogFilter::default())
        .await
        .expect("equipment types should load")[0]
        .id;
    let body = serde_json::json!({
        "internal_code": code,
        "name": format!("Equipment {code}"),
        "equipment_type_id": type_id,
        "model": "320",
        "manufacturer": "Caterpillar",
        "serial_number": format!("SN-{code}"),
        "location": "Pit B",
        "acquired_on": "2023-05-10",
        "hour_meter": 1200.0
    });
    let response = post_json_auth(app.clone(), "/api/v1/equipment", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED, "equipment should be created");
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("equipment id")
}

/// Id of a seeded maintenance type by code (`PREV`, `CORR`, ...).
pub async fn maintenance_type_id(pool: &PgPool, code: &str) -> i64 {
    MaintenanceTypeRepo::list(pool, &CatalogFilter::default())
        .await
        .expect("maintenance types should load")
        .into_iter()
        .find(|t| t.code == code)
        .expect("maintenance type should be seeded")
        .id
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// POST a multipart form with a single `file` field.
pub async fn post_file_auth(
    app: Router,
    uri: &str,
    filename: &str,
    contents: &[u8],
    token: &str,
) -> Response {
    const BOUNDARY: &str = "cmms-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}
