//! HTTP driver for a jsreport rendering engine.
//!
//! Speaks the OData template/data surface plus the `/api/report` rendering
//! endpoint. Artifacts rendered through [`create_report`] are saved at the
//! engine; the engine-assigned id, content type, and permanent link identify
//! them from then on.
//!
//! [`create_report`]: JsReportClient::create_report

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

use tabula_core::template::{infer_structure, Template, TemplateData};

use crate::driver::{CreatedReport, RenderedContent, RenderingDriver};
use crate::entities::{DataListResponse, ErrorResponse, JsTemplate, TemplateListResponse};
use crate::error::RenderError;

const DEFAULT_REPORT_NAME: &str = "report";

/// Map a jsreport recipe to the rendering format shown to clients.
fn recipe_type(recipe: &str) -> &'static str {
    match recipe {
        "chrome-pdf" => "PDF",
        "xlsx" => "Excel",
        _ => "",
    }
}

/// File extension matching a rendered artifact's content type.
fn extension_for(content_type: &str) -> &'static str {
    if content_type.starts_with("application/pdf") {
        "pdf"
    } else if content_type.contains("spreadsheetml") {
        "xlsx"
    } else if content_type.starts_with("text/html") {
        "html"
    } else {
        "bin"
    }
}

/// HTTP client for a single jsreport instance.
pub struct JsReportClient {
    client: reqwest::Client,
    base_url: String,
}

impl JsReportClient {
    /// Create a client for the engine at `url:port`.
    pub fn new(url: &str, port: i64) -> Self {
        Self::with_base_url(format!("{url}:{port}"))
    }

    /// Create a client with a fully-formed base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Map 401 to the distinguished unauthorized error and any other non-2xx
    /// status to an [`RenderError::Api`] carrying the engine's message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RenderError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RenderError::Unauthorized);
        }
        if !status.is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response)
    }

    async fn api_error(response: reqwest::Response) -> RenderError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body);
        RenderError::Api { status, message }
    }

    fn header_value(response: &reqwest::Response, name: &str) -> String {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn fetch_template(&self, id: &str, auth: &str) -> Result<JsTemplate, RenderError> {
        let response = self
            .client
            .get(format!("{}/odata/templates('{id}')", self.base_url))
            .header(AUTHORIZATION, auth)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<JsTemplate>().await?)
    }

    async fn fetch_data_by_short_id(
        &self,
        short_id: &str,
        auth: &str,
    ) -> Result<crate::entities::JsData, RenderError> {
        let response = self
            .client
            .get(format!("{}/odata/data", self.base_url))
            .query(&[("$filter", format!("shortid eq '{short_id}'"))])
            .header(AUTHORIZATION, auth)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let parsed = response.json::<DataListResponse>().await?;
        parsed
            .entries
            .into_iter()
            .next()
            .ok_or_else(|| RenderError::MissingData(format!("no data entry for shortid {short_id}")))
    }

    async fn render(
        &self,
        template_name: &str,
        report_name: Option<&str>,
        save: bool,
        data: &Value,
        auth: &str,
    ) -> Result<reqwest::Response, RenderError> {
        let mut options = json!({"reports": {"save": save, "async": false}});
        if let Some(name) = report_name {
            options["reportName"] = json!(name);
        }
        let body = json!({
            "template": {"name": template_name},
            "options": options,
            "data": data,
        });
        let response = self
            .client
            .post(format!("{}/api/report", self.base_url))
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(response).await
    }
}

#[async_trait]
impl RenderingDriver for JsReportClient {
    async fn get_templates(&self, auth: &str) -> Result<Vec<Template>, RenderError> {
        let response = self
            .client
            .get(format!("{}/odata/templates", self.base_url))
            .query(&[("$select", "name,recipe")])
            .header(AUTHORIZATION, auth)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let parsed = response.json::<TemplateListResponse>().await?;

        Ok(parsed
            .templates
            .into_iter()
            .map(|t| Template {
                id: t.id,
                name: t.name,
                template_type: recipe_type(&t.recipe).to_string(),
                data: TemplateData::default(),
            })
            .collect())
    }

    async fn get_template_by_id(&self, id: &str, auth: &str) -> Result<Template, RenderError> {
        let js_template = self.fetch_template(id, auth).await?;
        let short_id = js_template
            .data
            .as_ref()
            .map(|d| d.shortid.clone())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RenderError::MissingData(format!("template {id} has no data reference")))?;
        let js_data = self.fetch_data_by_short_id(&short_id, auth).await?;

        let sample: Map<String, Value> = serde_json::from_str(&js_data.data_json)?;
        Ok(Template {
            id: js_template.id,
            name: js_template.name,
            template_type: recipe_type(&js_template.recipe).to_string(),
            data: TemplateData {
                id: js_data.id,
                name: js_data.name,
                data_structured: infer_structure(&sample),
                data_json_string: js_data.data_json,
            },
        })
    }

    async fn get_template_preview(
        &self,
        id: &str,
        auth: &str,
    ) -> Result<RenderedContent, RenderError> {
        let template = self.get_template_by_id(id, auth).await?;
        let sample: Value = serde_json::from_str(&template.data.data_json_string)?;
        let response = self
            .render(&template.name, None, false, &sample, auth)
            .await?;

        let content_type = Self::header_value(&response, "Content-Type");
        let content = response.bytes().await?.to_vec();
        Ok(RenderedContent {
            extension: extension_for(&content_type).to_string(),
            content_type,
            content,
        })
    }

    async fn create_report(
        &self,
        report_name: &str,
        template_name: &str,
        data: &Map<String, Value>,
        auth: &str,
    ) -> Result<CreatedReport, RenderError> {
        let report_name = if report_name.is_empty() {
            DEFAULT_REPORT_NAME
        } else {
            report_name
        };
        let response = self
            .render(
                template_name,
                Some(report_name),
                true,
                &Value::Object(data.clone()),
                auth,
            )
            .await?;

        Ok(CreatedReport {
            file_id: Self::header_value(&response, "Report-Id"),
            content_type: Self::header_value(&response, "Content-Type"),
            link: Self::header_value(&response, "Permanent-Link"),
        })
    }

    async fn get_report_content(
        &self,
        file_id: &str,
        auth: &str,
    ) -> Result<RenderedContent, RenderError> {
        let response = self
            .client
            .get(format!("{}/reports/{file_id}/content", self.base_url))
            .header(AUTHORIZATION, auth)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let content_type = Self::header_value(&response, "Content-Type");
        let content = response.bytes().await?.to_vec();
        Ok(RenderedContent {
            extension: extension_for(&content_type).to_string(),
            content_type,
            content,
        })
    }

    async fn delete_created_report_file(
        &self,
        file_id: &str,
        auth: &str,
    ) -> Result<(), RenderError> {
        let response = self
            .client
            .delete(format!("{}/odata/reports('{file_id}')", self.base_url))
            .header(AUTHORIZATION, auth)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(RenderError::Unauthorized);
        }
        // Deletes are idempotent: an artifact already gone is not an error.
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(file_id, "Artifact already absent at the rendering engine");
            return Ok(());
        }
        match Self::api_error(response).await {
            RenderError::Api { message, .. } if message == format!("Report {file_id} not found") => {
                tracing::debug!(file_id, "Artifact already absent at the rendering engine");
                Ok(())
            }
            err => Err(err),
        }
    }
}
