//! Handlers for the report endpoints.
//!
//! Handlers always act with `admin = false`; the admin bypass stays an
//! engine capability for operational tooling.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use tabula_core::report::Report;
use tabula_db::models::{ListArgs, SortOrder};

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Recognized list parameters (`?limit=&offset=&order=&search=`).
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// `field:asc|desc`
    pub order: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    fn into_args(self) -> AppResult<ListArgs> {
        let order = self
            .order
            .as_deref()
            .map(SortOrder::parse)
            .transpose()
            .map_err(crate::error::AppError::from)?;
        Ok(ListArgs {
            limit: self.limit,
            offset: self.offset,
            order,
            search: self.search,
        })
    }
}

// ---------------------------------------------------------------------------
// POST /report/create
// ---------------------------------------------------------------------------

/// Render a report file now, implicitly storing the model if it is unknown.
pub async fn create_report_file(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<Report>,
) -> AppResult<impl IntoResponse> {
    let (report, file_id) = state.engine.create_report_file(request, &auth.token).await?;
    tracing::info!(id = %report.id, file_id = %file_id, "Report file created");
    Ok(Json(json!({ "id": report.id })))
}

// ---------------------------------------------------------------------------
// POST /report
// ---------------------------------------------------------------------------

/// Store a report model without rendering.
pub async fn save_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<Report>,
) -> AppResult<StatusCode> {
    state.engine.save_report_model(request, &auth.token).await?;
    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// PUT /report
// ---------------------------------------------------------------------------

/// Update a stored report model.
pub async fn update_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<Report>,
) -> AppResult<StatusCode> {
    state.engine.update_report_model(request, &auth.token).await?;
    Ok(StatusCode::OK)
}

// ---------------------------------------------------------------------------
// GET /report
// ---------------------------------------------------------------------------

/// List the caller's reports.
pub async fn list_reports(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let args = params.into_args()?;
    let reports = state
        .engine
        .list_report_models(&auth.token, &args, false)
        .await?;
    tracing::debug!(count = reports.len(), "Listed reports");
    Ok(Json(DataResponse { data: reports }))
}

// ---------------------------------------------------------------------------
// GET /report/{id}
// ---------------------------------------------------------------------------

/// Get one of the caller's reports.
pub async fn get_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let report = state.engine.get_report_model(&id, &auth.token).await?;
    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// DELETE /report/{id}
// ---------------------------------------------------------------------------

/// Delete a report and every rendered artifact it references.
pub async fn delete_report(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.engine.delete_report(&id, &auth.token, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /report/file/{report_id}/{file_id}
// ---------------------------------------------------------------------------

/// Download a rendered artifact.
pub async fn get_report_file(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((report_id, file_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let content = state
        .engine
        .download_report_file(&report_id, &file_id, &auth.token)
        .await?;
    Ok(([(header::CONTENT_TYPE, content.content_type)], content.content))
}

// ---------------------------------------------------------------------------
// DELETE /report/file/{report_id}/{file_id}
// ---------------------------------------------------------------------------

/// Delete one rendered artifact from a report.
pub async fn delete_report_file(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((report_id, file_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state
        .engine
        .delete_created_report_file(&report_id, &file_id, &auth.token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
