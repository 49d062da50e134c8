//! The rendering-engine capability set.

use async_trait::async_trait;
use serde_json::{Map, Value};

use tabula_core::template::Template;

use crate::error::RenderError;

/// A rendered artifact registered at the engine.
#[derive(Debug, Clone)]
pub struct CreatedReport {
    /// Engine-assigned artifact id.
    pub file_id: String,
    /// Content type of the rendered document.
    pub content_type: String,
    /// Opaque permanent link to the artifact.
    pub link: String,
}

/// Downloaded bytes of an artifact or preview.
#[derive(Debug, Clone)]
pub struct RenderedContent {
    pub content: Vec<u8>,
    pub content_type: String,
    /// File extension matching the content type, e.g. `pdf`.
    pub extension: String,
}

/// Capability set of a rendering engine.
///
/// All calls surface the upstream status verbatim as an error, except that
/// HTTP 401 maps to [`RenderError::Unauthorized`] and a missing artifact on
/// delete is swallowed (deletes are idempotent).
#[async_trait]
pub trait RenderingDriver: Send + Sync {
    async fn get_templates(&self, auth: &str) -> Result<Vec<Template>, RenderError>;

    /// Fetch one template, including its inferred `dataStructured` schema.
    async fn get_template_by_id(&self, id: &str, auth: &str) -> Result<Template, RenderError>;

    /// Render the template against its own sample data, without saving.
    async fn get_template_preview(
        &self,
        id: &str,
        auth: &str,
    ) -> Result<RenderedContent, RenderError>;

    /// Render and persist a report document from materialized data.
    async fn create_report(
        &self,
        report_name: &str,
        template_name: &str,
        data: &Map<String, Value>,
        auth: &str,
    ) -> Result<CreatedReport, RenderError>;

    async fn get_report_content(
        &self,
        file_id: &str,
        auth: &str,
    ) -> Result<RenderedContent, RenderError>;

    async fn delete_created_report_file(&self, file_id: &str, auth: &str)
        -> Result<(), RenderError>;
}
