//! The scheduler: a single periodic loop that renders due reports.
//!
//! Each tick scans the store for reports whose `scheduledFor` has elapsed
//! and processes them sequentially: exchange the service account for a token
//! delegated to the report's owner, render and register a new artifact
//! (which also advances the schedule), then dispatch email if the report
//! names receivers.
//!
//! Any error terminates the loop; supervision treats that as fatal for the
//! process. Cancellation is coarse -- a tick already in progress completes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use tabula_apis::KeycloakClient;
use tabula_db::repositories::ReportRepo;

use crate::error::EngineError;
use crate::service::ReportEngine;

pub struct Scheduler {
    engine: Arc<ReportEngine>,
    keycloak: KeycloakClient,
    tick: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<ReportEngine>, keycloak: KeycloakClient, tick: Duration) -> Self {
        Self {
            engine,
            keycloak,
            tick,
        }
    }

    /// Run the scheduler loop until `cancel` fires or an error occurs.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), EngineError> {
        tracing::info!(tick_secs = self.tick.as_secs(), "Scheduler started");
        let mut interval = tokio::time::interval(self.tick);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler cancelled");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.process_due(Utc::now()).await?;
                }
            }
        }
    }

    /// One tick: render, persist, and email every due report. Returns the
    /// number of reports processed.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let due = ReportRepo::find_due(self.engine.pool(), now).await?;
        let count = due.len();
        for report in due {
            tracing::info!(id = %report.id, user_id = %report.user_id, "Creating scheduled report file");
            let token = self.keycloak.exchange_user_token(&report.user_id).await?;
            // Renders the artifact and advances the schedule in one step.
            let (report, file_id) = self.engine.create_report_file(report, &token).await?;
            self.engine.email_report(&file_id, &report, &token).await?;
        }
        if count > 0 {
            tracing::info!(count, "Processed scheduled reports");
        }
        Ok(count)
    }
}
