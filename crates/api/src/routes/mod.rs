pub mod health;
pub mod reports;
pub mod templates;

use axum::Router;

use crate::state::AppState;

/// All API routes that live under the configurable URL prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::ping_router())
        .merge(templates::router())
        .merge(reports::router())
}
