//! Handlers for the `/auth` resource (login, token validation, password change).

use axum::extract::State;
use axum::Json;
use cmms_core::access::validate_new_password;
use cmms_core::error::CoreError;
use cmms_core::validation::require;
use cmms_db::models::user::UserResponse;
use cmms_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::handlers::hash_new_password;
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`. Either `email` or `username` identifies the user.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let password = require("password", input.password.filter(|p| !p.is_empty()))?;
    let email = input.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let username = input.username.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let user = match (email, username) {
        (Some(email), _) => UserRepo::find_by_email(&state.pool, email).await?,
        (None, Some(username)) => UserRepo::find_by_username(&state.pool, username).await?,
        (None, None) => {
            return Err(AppError::BadRequest(
                "Email or username is required".into(),
            ))
        }
    };
    let user = user.ok_or_else(invalid_credentials)?;

    let password_valid = verify_password(&password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid_credentials());
    }

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "User is inactive".into(),
        )));
    }

    UserRepo::record_login(&state.pool, user.id).await?;

    let token = generate_access_token(user.id, &user.access_level, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    tracing::info!(user_id = user.id, access_level = %user.access_level, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// GET /api/v1/auth/validate
pub async fn validate(auth: AuthUser) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: true,
        user: UserResponse::from(&auth.user),
    })
}

/// GET /api/v1/auth/me
pub async fn me(auth: AuthUser) -> Json<DataResponse<UserResponse>> {
    Json(DataResponse {
        data: UserResponse::from(&auth.user),
    })
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout(auth: AuthUser) -> Json<MessageResponse> {
    tracing::info!(user_id = auth.user_id, "User logged out");
    Json(MessageResponse::new("Logged out"))
}

/// POST /api/v1/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let current = require(
        "current_password",
        input.current_password.filter(|p| !p.is_empty()),
    )?;
    let new_password = require("new_password", input.new_password.filter(|p| !p.is_empty()))?;

    let matches = verify_password(&current, &auth.user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !matches {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }
    validate_new_password(&new_password)?;

    let hash = hash_new_password(&new_password)?;
    UserRepo::update_password(&state.pool, auth.user_id, &hash).await?;

    tracing::info!(user_id = auth.user_id, "Password changed");
    Ok(Json(MessageResponse::new("Password changed")))
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid credentials".into()))
}
