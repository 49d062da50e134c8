// Shared test helpers; not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{Map, Value};

use tabula_apis::{DevicesClient, MailClient, TimeseriesClient};
use tabula_core::auth::{Claims, RealmAccess};
use tabula_core::template::{infer_structure, Template, TemplateData};
use tabula_db::DbPool;
use tabula_engine::{MailDefaults, ReportEngine};
use tabula_render::{CreatedReport, RenderError, RenderedContent, RenderingDriver};

pub const SAMPLE_DATA_JSON: &str = r#"{"total": 1.5, "title": "Monthly"}"#;
pub const FAKE_PDF: &[u8] = b"%PDF-1.4 test-artifact";

/// Placeholder base URL for clients a test never exercises.
pub const UNUSED_URL: &str = "http://127.0.0.1:9";

/// In-memory rendering engine that records every call.
#[derive(Default)]
pub struct MockDriver {
    /// `(report_name, template_name, data)` per render call.
    pub created: Mutex<Vec<(String, String, Map<String, Value>)>>,
    /// File ids in deletion order.
    pub deleted: Mutex<Vec<String>>,
    counter: AtomicUsize,
}

#[async_trait]
impl RenderingDriver for MockDriver {
    async fn get_templates(&self, _auth: &str) -> Result<Vec<Template>, RenderError> {
        Ok(vec![Template {
            id: "t1".into(),
            name: "monthly".into(),
            template_type: "PDF".into(),
            data: TemplateData::default(),
        }])
    }

    async fn get_template_by_id(&self, id: &str, _auth: &str) -> Result<Template, RenderError> {
        let sample: Map<String, Value> =
            serde_json::from_str(SAMPLE_DATA_JSON).expect("sample data parses");
        Ok(Template {
            id: id.to_string(),
            name: "monthly".into(),
            template_type: "PDF".into(),
            data: TemplateData {
                id: "d1".into(),
                name: "monthly-data".into(),
                data_json_string: SAMPLE_DATA_JSON.into(),
                data_structured: infer_structure(&sample),
            },
        })
    }

    async fn get_template_preview(
        &self,
        _id: &str,
        _auth: &str,
    ) -> Result<RenderedContent, RenderError> {
        Ok(RenderedContent {
            content: FAKE_PDF.to_vec(),
            content_type: "application/pdf".into(),
            extension: "pdf".into(),
        })
    }

    async fn create_report(
        &self,
        report_name: &str,
        template_name: &str,
        data: &Map<String, Value>,
        _auth: &str,
    ) -> Result<CreatedReport, RenderError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.created.lock().expect("lock").push((
            report_name.to_string(),
            template_name.to_string(),
            data.clone(),
        ));
        Ok(CreatedReport {
            file_id: format!("file-{n}"),
            content_type: "application/pdf".into(),
            link: format!("http://renderer.internal/reports/file-{n}"),
        })
    }

    async fn get_report_content(
        &self,
        _file_id: &str,
        _auth: &str,
    ) -> Result<RenderedContent, RenderError> {
        Ok(RenderedContent {
            content: FAKE_PDF.to_vec(),
            content_type: "application/pdf".into(),
            extension: "pdf".into(),
        })
    }

    async fn delete_created_report_file(
        &self,
        file_id: &str,
        _auth: &str,
    ) -> Result<(), RenderError> {
        self.deleted.lock().expect("lock").push(file_id.to_string());
        Ok(())
    }
}

/// Encode a bearer token for `user_id`. Signature content is irrelevant;
/// only the claims are read.
pub fn raw_token_for(user_id: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        realm_access: RealmAccess::default(),
        email: None,
        email_verified: false,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("token encoding should succeed")
}

pub fn token_for(user_id: &str) -> String {
    format!("Bearer {}", raw_token_for(user_id))
}

pub async fn test_pool() -> DbPool {
    let pool = tabula_db::create_pool("sqlite::memory:")
        .await
        .expect("pool creation should succeed");
    tabula_db::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    pool
}

pub fn mail_defaults() -> MailDefaults {
    MailDefaults {
        from: "reports@example.org".into(),
        subject: "Report".into(),
        text: "Report attached to this email".into(),
    }
}

/// Build an engine over an in-memory store and the mock driver, with the
/// upstream clients pointed at the given base URLs.
pub async fn test_engine_with(
    driver: Arc<MockDriver>,
    timeseries_url: &str,
    devices_url: &str,
    mail_url: &str,
) -> (Arc<ReportEngine>, DbPool) {
    let pool = test_pool().await;
    let engine = ReportEngine::new(
        driver,
        pool.clone(),
        TimeseriesClient::with_base_url(timeseries_url.to_string()),
        DevicesClient::with_base_url(devices_url.to_string()),
        MailClient::new(mail_url.to_string()),
        mail_defaults(),
    );
    (Arc::new(engine), pool)
}

/// Engine whose upstream clients are never exercised.
pub async fn test_engine(driver: Arc<MockDriver>) -> (Arc<ReportEngine>, DbPool) {
    test_engine_with(driver, UNUSED_URL, UNUSED_URL, UNUSED_URL).await
}
