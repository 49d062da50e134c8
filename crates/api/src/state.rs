use std::sync::Arc;

use crate::config::ServerConfig;
use tabula_db::DbPool;
use tabula_engine::ReportEngine;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`. Cheaply cloneable; inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The report engine: templates, lifecycle, materialization, email.
    pub engine: Arc<ReportEngine>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Database connection pool (used directly by the health check).
    pub pool: DbPool,
}
