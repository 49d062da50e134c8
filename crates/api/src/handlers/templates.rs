//! Handlers for the template endpoints.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /templates
// ---------------------------------------------------------------------------

/// List the templates available at the rendering engine.
pub async fn list_templates(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let templates = state.engine.get_templates(&auth.token).await?;
    tracing::debug!(count = templates.len(), "Listed templates");
    Ok(Json(DataResponse { data: templates }))
}

// ---------------------------------------------------------------------------
// GET /templates/{id}
// ---------------------------------------------------------------------------

/// Get a template with its inferred data structure.
pub async fn get_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let template = state.engine.get_template_by_id(&id, &auth.token).await?;
    Ok(Json(DataResponse { data: template }))
}

// ---------------------------------------------------------------------------
// GET /templates/preview/{id}
// ---------------------------------------------------------------------------

/// Render a template preview and return the raw document bytes.
pub async fn get_template_preview(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let preview = state.engine.get_template_preview(&id, &auth.token).await?;
    Ok(([(header::CONTENT_TYPE, preview.content_type)], preview.content))
}
