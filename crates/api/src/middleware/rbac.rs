//! Access-level guards.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose access level
//! does not pass the guard, so authorization is enforced at the type level:
//!
//! ```ignore
//! async fn delete(RequireSupervisor(user): RequireSupervisor) -> AppResult<StatusCode> {
//!     Ok(StatusCode::NO_CONTENT)
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cmms_core::access::AccessLevel;
use cmms_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

async fn guarded(
    parts: &mut Parts,
    state: &AppState,
    allows: fn(&AccessLevel) -> bool,
    message: &str,
) -> Result<AuthUser, AppError> {
    let user = AuthUser::from_request_parts(parts, state).await?;
    if !allows(&user.level) {
        return Err(AppError::Core(CoreError::Forbidden(message.into())));
    }
    Ok(user)
}

/// Requires the `admin` level.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guarded(parts, state, AccessLevel::allows_admin, "Administrator access required")
            .await
            .map(RequireAdmin)
    }
}

/// Requires `admin` or `supervisor`.
pub struct RequireSupervisor(pub AuthUser);

impl FromRequestParts<AppState> for RequireSupervisor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guarded(parts, state, AccessLevel::allows_supervisor, "Supervisor access required")
            .await
            .map(RequireSupervisor)
    }
}

/// Requires `admin`, `supervisor` or `planner`.
pub struct RequirePlanner(pub AuthUser);

impl FromRequestParts<AppState> for RequirePlanner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guarded(parts, state, AccessLevel::allows_planner, "Planner access required")
            .await
            .map(RequirePlanner)
    }
}

/// Requires `admin`, `supervisor` or `storekeeper`.
pub struct RequireStorekeeper(pub AuthUser);

impl FromRequestParts<AppState> for RequireStorekeeper {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guarded(parts, state, AccessLevel::allows_storekeeper, "Storekeeper access required")
            .await
            .map(RequireStorekeeper)
    }
}

/// Requires any level that executes work orders (everyone but storekeepers).
pub struct RequireMechanic(pub AuthUser);

impl FromRequestParts<AppState> for RequireMechanic {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        guarded(parts, state, AccessLevel::allows_mechanic, "Mechanic access required")
            .await
            .map(RequireMechanic)
    }
}
