use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    db_healthy: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = tabula_db::health_check(&state.pool).await.is_ok();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "pong" }))
}

/// Liveness route, mounted at the root regardless of the URL prefix.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Connectivity probe, mounted under the URL prefix with the API.
pub fn ping_router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}
