//! Template routes.
//!
//! ```text
//! GET /templates               list_templates
//! GET /templates/{id}          get_template
//! GET /templates/preview/{id}  get_template_preview
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::templates;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/templates", get(templates::list_templates))
        .route("/templates/{id}", get(templates::get_template))
        .route(
            "/templates/preview/{id}",
            get(templates::get_template_preview),
        )
}
