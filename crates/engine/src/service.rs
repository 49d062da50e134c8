//! Report lifecycle service.
//!
//! [`ReportEngine`] ties the store, the rendering driver, the upstream
//! clients, and the mail relay together: it owns every operation the HTTP
//! surface and the scheduler perform on reports. The rendering driver is
//! injected as a trait object so tests can substitute an in-memory engine.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use uuid::Uuid;

use tabula_apis::{Address, Attachment, DevicesClient, MailClient, SendRequest, TimeseriesClient};
use tabula_core::auth::Claims;
use tabula_core::report::{Report, ReportFile};
use tabula_core::schedule::next_fire;
use tabula_core::template::Template;
use tabula_core::CoreError;
use tabula_db::models::ListArgs;
use tabula_db::repositories::ReportRepo;
use tabula_db::DbPool;
use tabula_render::{RenderedContent, RenderingDriver};

use crate::error::EngineError;
use crate::materializer::Materializer;
use crate::metrics::DatapointCounter;

/// Fallback subject/text used when a report carries no mail settings of its
/// own, plus the relay sender address.
#[derive(Debug, Clone)]
pub struct MailDefaults {
    pub from: String,
    pub subject: String,
    pub text: String,
}

pub struct ReportEngine {
    driver: Arc<dyn RenderingDriver>,
    pool: DbPool,
    timeseries: TimeseriesClient,
    devices: DevicesClient,
    mail: MailClient,
    mail_defaults: MailDefaults,
    metrics: DatapointCounter,
}

impl ReportEngine {
    pub fn new(
        driver: Arc<dyn RenderingDriver>,
        pool: DbPool,
        timeseries: TimeseriesClient,
        devices: DevicesClient,
        mail: MailClient,
        mail_defaults: MailDefaults,
    ) -> Self {
        Self {
            driver,
            pool,
            timeseries,
            devices,
            mail,
            mail_defaults,
            metrics: DatapointCounter::default(),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn metrics(&self) -> &DatapointCounter {
        &self.metrics
    }

    // -- templates ----------------------------------------------------------

    pub async fn get_templates(&self, auth: &str) -> Result<Vec<Template>, EngineError> {
        Ok(self.driver.get_templates(auth).await?)
    }

    pub async fn get_template_by_id(&self, id: &str, auth: &str) -> Result<Template, EngineError> {
        Ok(self.driver.get_template_by_id(id, auth).await?)
    }

    pub async fn get_template_preview(
        &self,
        id: &str,
        auth: &str,
    ) -> Result<RenderedContent, EngineError> {
        Ok(self.driver.get_template_preview(id, auth).await?)
    }

    // -- report models ------------------------------------------------------

    /// Store a new report: fresh id, owner from the token, schedule computed
    /// from the cron expression.
    pub async fn save_report_model(
        &self,
        mut report: Report,
        auth: &str,
    ) -> Result<Report, EngineError> {
        let claims = Claims::parse(auth)?;
        let now = Utc::now();
        report.id = Uuid::new_v4().to_string();
        report.user_id = claims.sub;
        report.scheduled_for = next_fire(&report.cron, now)?;
        report.created_at = Some(now);
        report.updated_at = Some(now);
        ReportRepo::insert(&self.pool, &report).await?;
        tracing::info!(id = %report.id, user_id = %report.user_id, "Report saved");
        Ok(report)
    }

    /// Update a stored report. The owner always comes from the token and the
    /// schedule is recomputed. A request without `reportFiles` preserves the
    /// stored artifact list and creation time (partial update).
    pub async fn update_report_model(
        &self,
        mut report: Report,
        auth: &str,
    ) -> Result<(), EngineError> {
        let claims = Claims::parse(auth)?;
        let now = Utc::now();
        report.user_id = claims.sub.clone();
        report.scheduled_for = next_fire(&report.cron, now)?;
        report.updated_at = Some(now);

        if report.report_files.is_none() {
            let stored = ReportRepo::find_by_id(&self.pool, &report.id, Some(&claims.sub))
                .await?
                .ok_or_else(|| CoreError::NotFound {
                    entity: "Report",
                    id: report.id.clone(),
                })?;
            report.report_files = stored.report_files;
            report.created_at = stored.created_at;
        }

        ReportRepo::upsert(&self.pool, &report).await?;
        tracing::info!(id = %report.id, "Report updated");
        Ok(())
    }

    /// Fetch a report owned by the caller. Foreign and missing records are
    /// indistinguishable by design.
    pub async fn get_report_model(&self, id: &str, auth: &str) -> Result<Report, EngineError> {
        let claims = Claims::parse(auth)?;
        ReportRepo::find_by_id(&self.pool, id, Some(&claims.sub))
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "Report",
                    id: id.to_string(),
                }
                .into()
            })
    }

    pub async fn list_report_models(
        &self,
        auth: &str,
        args: &ListArgs,
        admin: bool,
    ) -> Result<Vec<Report>, EngineError> {
        let claims = Claims::parse(auth)?;
        let owner = if admin { None } else { Some(claims.sub.as_str()) };
        Ok(ReportRepo::list(&self.pool, owner, args).await?)
    }

    /// Delete a report and every artifact it references. Artifacts are
    /// removed at the rendering engine first, in creation order; only then
    /// is the model dropped.
    pub async fn delete_report(&self, id: &str, auth: &str, admin: bool) -> Result<(), EngineError> {
        let claims = Claims::parse(auth)?;
        let owner = if admin { None } else { Some(claims.sub.as_str()) };

        let report = ReportRepo::find_by_id(&self.pool, id, owner)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Report",
                id: id.to_string(),
            })?;
        for file in report.report_files.as_deref().unwrap_or_default() {
            self.driver.delete_created_report_file(&file.id, auth).await?;
        }

        let deleted = ReportRepo::delete(&self.pool, id, owner).await?;
        if !deleted {
            return Err(CoreError::NotFound {
                entity: "Report",
                id: id.to_string(),
            }
            .into());
        }
        tracing::info!(id, "Report deleted");
        Ok(())
    }

    // -- report files -------------------------------------------------------

    /// Materialize and render one artifact for a report, then register it on
    /// the model. A request for an unknown report id implicitly saves the
    /// request as a new report first.
    pub async fn create_report_file(
        &self,
        report_request: Report,
        auth: &str,
    ) -> Result<(Report, String), EngineError> {
        let claims = Claims::parse(auth)?;

        let existing =
            ReportRepo::find_by_id(&self.pool, &report_request.id, Some(&claims.sub)).await?;
        let mut report = match existing {
            Some(stored) => {
                let mut merged = report_request;
                // The request body never carries the authoritative artifact
                // list; carry it over from the stored record.
                merged.report_files = stored.report_files;
                merged.created_at = stored.created_at;
                merged
            }
            None => self.save_report_model(report_request, auth).await?,
        };

        let materializer = Materializer::new(&self.timeseries, &self.devices, &self.metrics);
        let data = materializer
            .materialize(&report.data, auth, &report.id, Utc::now())
            .await?;

        let created = self
            .driver
            .create_report(&report.name, &report.template_name, &data, auth)
            .await?;
        tracing::info!(
            report_id = %report.id,
            file_id = %created.file_id,
            "Report file rendered"
        );

        report
            .report_files
            .get_or_insert_with(Vec::new)
            .push(ReportFile {
                id: created.file_id.clone(),
                link: created.link,
                file_type: created.content_type,
                created_at: Some(Utc::now()),
            });
        self.update_report_model(report.clone(), auth).await?;

        Ok((report, created.file_id))
    }

    /// Download an artifact; the report lookup enforces ownership before the
    /// renderer is consulted.
    pub async fn download_report_file(
        &self,
        report_id: &str,
        file_id: &str,
        auth: &str,
    ) -> Result<RenderedContent, EngineError> {
        self.get_report_model(report_id, auth).await?;
        Ok(self.driver.get_report_content(file_id, auth).await?)
    }

    /// Remove one artifact from a report. Deleting an artifact the renderer
    /// no longer has is not an error, so the operation is idempotent.
    pub async fn delete_created_report_file(
        &self,
        report_id: &str,
        file_id: &str,
        auth: &str,
    ) -> Result<(), EngineError> {
        let mut report = self.get_report_model(report_id, auth).await?;
        self.driver.delete_created_report_file(file_id, auth).await?;
        if let Some(files) = report.report_files.as_mut() {
            files.retain(|file| file.id != file_id);
        }
        self.update_report_model(report, auth).await?;
        Ok(())
    }

    // -- email --------------------------------------------------------------

    /// Send a rendered artifact to the report's receivers. Reports without
    /// receivers are skipped silently. Returns whether a mail went out.
    pub async fn email_report(
        &self,
        file_id: &str,
        report: &Report,
        auth: &str,
    ) -> Result<bool, EngineError> {
        if report.email_receivers.is_empty() {
            return Ok(false);
        }

        let content = self.download_report_file(&report.id, file_id, auth).await?;
        let subject = if report.email_subject.is_empty() {
            self.mail_defaults.subject.clone()
        } else {
            report.email_subject.clone()
        };
        let text = if report.email_text.is_empty() {
            self.mail_defaults.text.clone()
        } else {
            report.email_text.clone()
        };

        let request = SendRequest {
            from: Address {
                email: self.mail_defaults.from.clone(),
                ..Address::default()
            },
            bcc: report.email_receivers.clone(),
            subject,
            text,
            html: report.email_html.clone(),
            attachments: vec![Attachment {
                content: BASE64.encode(&content.content),
                filename: format!("{file_id}.{}", content.extension),
                content_type: content.content_type,
                ..Attachment::default()
            }],
            ..SendRequest::default()
        };
        self.mail.send(&request).await?;
        tracing::info!(
            report_id = %report.id,
            file_id,
            receivers = report.email_receivers.len(),
            "Report emailed"
        );
        Ok(true)
    }
}
