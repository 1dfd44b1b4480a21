use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Authentication routes mounted at `/auth`.
///
/// ```text
/// POST /login            -> login (public)
/// GET  /validate         -> validate
/// GET  /me               -> me
/// POST /logout           -> logout
/// POST /change-password  -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/change-password", post(auth::change_password))
}
