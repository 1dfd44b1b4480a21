use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::imports;
use crate::state::AppState;

/// Upper bound for spreadsheet uploads.
const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

/// Bulk import routes mounted at `/imports`.
///
/// ```text
/// POST /parts           -> import_parts (multipart, storekeeper)
/// GET  /parts/template  -> parts_template
/// GET  /groups          -> groups
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/parts",
            post(imports::import_parts).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
        .route("/parts/template", get(imports::parts_template))
        .route("/groups", get(imports::groups))
}
