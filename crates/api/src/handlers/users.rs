//! Handlers for the `/users` resource: admin user management plus the
//! caller's own profile.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::access::{access_level_catalog, validate_new_password, AccessLevel};
use cmms_core::error::CoreError;
use cmms_core::types::DbId;
use cmms_core::validation::{optional_text, require_text, validate_email};
use cmms_db::models::user::{CreateUser, UpdateUser, UserFilter, UserResponse};
use cmms_db::repositories::UserRepo;
use serde::Deserialize;

use crate::error::{not_found, AppError, AppResult};
use crate::handlers::hash_new_password;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub access_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub job_title: Option<String>,
    pub access_level: Option<String>,
    pub is_active: Option<bool>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// GET /api/v1/users
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<UserFilter>,
) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(&state.pool, &filter).await?;
    let data: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/users
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let username = require_text("username", input.username.as_deref())?;
    let email = require_text("email", input.email.as_deref())?;
    let password = require_text("password", input.password.as_deref())?;
    let full_name = require_text("full_name", input.full_name.as_deref())?;
    let job_title = require_text("job_title", input.job_title.as_deref())?;
    let access_level = require_text("access_level", input.access_level.as_deref())?;

    let level = AccessLevel::from_str(&access_level)?;
    validate_email(&email)?;
    validate_new_password(&password)?;

    if UserRepo::find_by_username(&state.pool, &username).await?.is_some() {
        return Err(AppError::BadRequest("Username is already in use".into()));
    }
    if UserRepo::email_taken(&state.pool, &email, None).await? {
        return Err(AppError::BadRequest("Email is already in use".into()));
    }

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            password_hash: hash_new_password(&password)?,
            full_name,
            job_title,
            access_level: level.as_str().to_string(),
        },
    )
    .await?;

    tracing::info!(user_id = user.id, created_by = admin.user_id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(&user),
        }),
    ))
}

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("User", id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// PUT /api/v1/users/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    if let Some(level) = input.access_level.as_deref() {
        AccessLevel::from_str(level)?;
    }
    let email = optional_text(input.email.as_deref());
    if let Some(email) = email.as_deref() {
        validate_email(email)?;
        if UserRepo::email_taken(&state.pool, email, Some(id)).await? {
            return Err(AppError::BadRequest("Email is already in use".into()));
        }
    }
    let password_hash = match input.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_new_password(password)?;
            Some(hash_new_password(password)?)
        }
        None => None,
    };

    let update = UpdateUser {
        email,
        full_name: optional_text(input.full_name.as_deref()),
        job_title: optional_text(input.job_title.as_deref()),
        access_level: input.access_level,
        is_active: input.is_active,
        password_hash,
    };
    let user = UserRepo::update(&state.pool, id, &update)
        .await?
        .ok_or_else(|| not_found("User", id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// DELETE /api/v1/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if id == admin.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }
    if !UserRepo::delete(&state.pool, id).await? {
        return Err(not_found("User", id));
    }
    tracing::info!(user_id = id, deleted_by = admin.user_id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted")))
}

// ---------------------------------------------------------------------------
// Any authenticated user
// ---------------------------------------------------------------------------

/// GET /api/v1/users/profile
pub async fn profile(auth: AuthUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse {
        data: UserResponse::from(&auth.user),
    })
}

/// PUT /api/v1/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    let email = optional_text(input.email.as_deref());
    if let Some(email) = email.as_deref() {
        validate_email(email)?;
        if UserRepo::email_taken(&state.pool, email, Some(auth.user_id)).await? {
            return Err(AppError::BadRequest("Email is already in use".into()));
        }
    }
    let update = UpdateUser {
        email,
        full_name: optional_text(input.full_name.as_deref()),
        job_title: optional_text(input.job_title.as_deref()),
        ..Default::default()
    };
    let user = UserRepo::update(&state.pool, auth.user_id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::Unauthorized(
            "User no longer exists".into(),
        )))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

/// GET /api/v1/users/access-levels
pub async fn access_levels(_auth: AuthUser) -> impl IntoResponse {
    Json(DataResponse {
        data: access_level_catalog(),
    })
}
