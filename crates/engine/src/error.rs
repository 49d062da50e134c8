use tabula_apis::ApiError;
use tabula_core::CoreError;
use tabula_render::RenderError;

/// Error type spanning the whole materialize/render/persist/email path.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Upstream(#[from] ApiError),
}
