//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cmms_core::access::AccessLevel;
use cmms_core::error::CoreError;
use cmms_core::types::DbId;
use cmms_db::models::user::User;
use cmms_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user resolved from a JWT Bearer token.
///
/// The user row is re-loaded on every request, so deactivation and
/// access-level changes take effect without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub level: AccessLevel,
    pub user: User,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

        let claims = validate_token(token, &state.config.jwt)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let user = UserRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| unauthorized("User no longer exists"))?;
        if !user.is_active {
            return Err(unauthorized("User is inactive"));
        }

        Ok(AuthUser {
            user_id: user.id,
            level: user.level(),
            user,
        })
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}
