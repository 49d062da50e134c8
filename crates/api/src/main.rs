use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabula_api::config::ServerConfig;
use tabula_api::router::build_app_router;
use tabula_api::state::AppState;
use tabula_apis::{DevicesClient, KeycloakClient, MailClient, TimeseriesClient};
use tabula_core::duration::parse_duration;
use tabula_engine::{MailDefaults, ReportEngine, Scheduler};
use tabula_render::JsReportClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.logger_level)
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    tracing::info!(port = config.server_port, debug = config.debug, "Loaded configuration");

    // --- Database ---
    let pool = tabula_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tabula_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tabula_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Engine ---
    let driver = Arc::new(JsReportClient::new(&config.jsreport.url, config.jsreport.port));
    let engine = Arc::new(ReportEngine::new(
        driver,
        pool.clone(),
        TimeseriesClient::new(&config.snrgy.url, config.snrgy.port),
        DevicesClient::new(&config.snrgy.url, config.snrgy.port),
        MailClient::new(config.mail.mailpit_url.clone()),
        MailDefaults {
            from: config.mail.from.clone(),
            subject: config.mail.subject.clone(),
            text: config.mail.text.clone(),
        },
    ));

    // --- Scheduler ---
    let tick = parse_duration(&config.scheduler_ticker_duration)
        .expect("SCHEDULER_TICKER_DURATION must be a valid duration");
    let keycloak = KeycloakClient::new(
        config.keycloak.url.clone(),
        config.keycloak.client_id.clone(),
        config.keycloak.client_secret.clone(),
    );
    let scheduler = Scheduler::new(Arc::clone(&engine), keycloak, tick);
    let scheduler_cancel = tokio_util::sync::CancellationToken::new();
    let cancel = scheduler_cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(cancel).await {
            // A scheduler failure is fatal for the whole process.
            tracing::error!(error = %e, "Scheduler failed");
            std::process::exit(1);
        }
    });
    tracing::info!("Scheduler started");

    // --- App state & router ---
    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
        pool: pool.clone(),
    };
    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    scheduler_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), scheduler_handle).await;
    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
