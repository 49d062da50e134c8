use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tabula_apis::ApiError;
use tabula_core::CoreError;
use tabula_engine::EngineError;
use tabula_render::RenderError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`EngineError`] for the materialize/render/persist/email path and
/// adds HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Engine(EngineError::Core(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Engine(engine) => classify_engine_error(engine),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

fn classify_engine_error(err: &EngineError) -> (StatusCode, &'static str, String) {
    match err {
        EngineError::Core(core) => match core {
            CoreError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            CoreError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            CoreError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal core error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        },

        EngineError::Database(sqlx::Error::RowNotFound) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        EngineError::Database(db) => {
            tracing::error!(error = %db, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }

        EngineError::Render(RenderError::Unauthorized) => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Rendering engine rejected the credentials".to_string(),
        ),
        EngineError::Render(render) => {
            tracing::error!(error = %render, "Rendering engine error");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", render.to_string())
        }

        EngineError::Upstream(ApiError::InvalidQuery(msg)) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        EngineError::Upstream(upstream) => {
            tracing::error!(error = %upstream, "Upstream service error");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                upstream.to_string(),
            )
        }
    }
}
