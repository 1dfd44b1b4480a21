//! Handlers for the `/imports` resource: spreadsheet import of parts.

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::import::{check_required_columns, read_rows, template_csv, SpreadsheetFormat};
use cmms_db::models::catalog::CatalogFilter;
use cmms_db::repositories::{ItemGroupRepo, PartRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStorekeeper;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/imports/parts
///
/// Accepts a multipart form with a required `file` field holding a `.csv` or
/// `.xlsx` sheet. Missing columns are rejected before anything is written.
pub async fn import_parts(
    State(state): State<AppState>,
    RequireStorekeeper(user): RequireStorekeeper,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        file_data = Some((filename, data.to_vec()));
    }

    let (filename, data) =
        file_data.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    if filename.trim().is_empty() {
        return Err(AppError::BadRequest("No file selected".into()));
    }

    let format = SpreadsheetFormat::from_filename(&filename)?;
    let (headers, rows) = read_rows(format, &data)?;
    check_required_columns(&headers)?;

    let report = PartRepo::import_rows(&state.pool, &rows).await?;

    tracing::info!(
        filename = %filename,
        total_rows = report.total_rows,
        added = report.added,
        updated = report.updated,
        skipped = report.skipped,
        errors = report.error_count,
        user_id = user.user_id,
        "Parts spreadsheet imported",
    );
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/imports/parts/template
pub async fn parts_template(_auth: AuthUser) -> AppResult<impl IntoResponse> {
    let csv = template_csv()?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"parts_import_template.csv\"",
            ),
        ],
        csv,
    ))
}

/// GET /api/v1/imports/groups
pub async fn groups(State(state): State<AppState>, _auth: AuthUser) -> AppResult<impl IntoResponse> {
    let filter = CatalogFilter {
        is_active: Some(true),
        search: None,
    };
    let data = ItemGroupRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}
