// All functions in this module are shared test helpers. Not every test binary
// uses every helper, so we suppress dead_code warnings at the module level.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{Map, Value};
use tower::ServiceExt;

use tabula_api::config::{EndpointConfig, KeycloakConfig, MailConfig, ServerConfig};
use tabula_api::router::build_app_router;
use tabula_api::state::AppState;
use tabula_apis::{DevicesClient, MailClient, TimeseriesClient};
use tabula_core::auth::{Claims, RealmAccess};
use tabula_core::template::{Template, TemplateData};
use tabula_engine::{MailDefaults, ReportEngine};
use tabula_render::{CreatedReport, RenderError, RenderedContent, RenderingDriver};

/// Placeholder base URL for upstreams these tests never reach.
const UNUSED_URL: &str = "http://127.0.0.1:9";

/// In-memory rendering engine recording every call.
#[derive(Default)]
pub struct MockDriver {
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
        Ok(Template {
            id: id.to_string(),
            name: "monthly".into(),
            template_type: "PDF".into(),
            data: TemplateData::default(),
        })
    }

    async fn get_template_preview(
        &self,
        _id: &str,
        _auth: &str,
    ) -> Result<RenderedContent, RenderError> {
        Ok(RenderedContent {
            content: b"%PDF-1.4 preview".to_vec(),
            content_type: "application/pdf".into(),
            extension: "pdf".into(),
        })
    }

    async fn create_report(
        &self,
        _report_name: &str,
        _template_name: &str,
        _data: &Map<String, Value>,
        _auth: &str,
    ) -> Result<CreatedReport, RenderError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
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
            content: b"%PDF-1.4 artifact".to_vec(),
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

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(url_prefix: &str) -> ServerConfig {
    ServerConfig {
        logger_level: "info".into(),
        url_prefix: url_prefix.into(),
        server_port: 0,
        debug: false,
        jsreport: EndpointConfig {
            url: UNUSED_URL.into(),
            port: 9,
        },
        snrgy: EndpointConfig {
            url: UNUSED_URL.into(),
            port: 9,
        },
        keycloak: KeycloakConfig {
            url: UNUSED_URL.into(),
            client_id: "test".into(),
            client_secret: "test".into(),
        },
        mail: MailConfig {
            mailpit_url: UNUSED_URL.into(),
            from: "reports@example.org".into(),
            subject: "Report".into(),
            text: "Report attached to this email".into(),
        },
        scheduler_ticker_duration: "1m".into(),
        database_url: "sqlite::memory:".into(),
    }
}

/// Build the full application router over an in-memory store and the mock
/// rendering driver, so tests exercise the production middleware stack.
pub async fn build_test_app(url_prefix: &str) -> Router {
    let pool = tabula_db::create_pool("sqlite::memory:")
        .await
        .expect("pool creation should succeed");
    tabula_db::run_migrations(&pool)
        .await
        .expect("migrations should apply");

    let config = test_config(url_prefix);
    let engine = Arc::new(ReportEngine::new(
        Arc::new(MockDriver::default()),
        pool.clone(),
        TimeseriesClient::with_base_url(UNUSED_URL.into()),
        DevicesClient::with_base_url(UNUSED_URL.into()),
        MailClient::new(UNUSED_URL.into()),
        MailDefaults {
            from: config.mail.from.clone(),
            subject: config.mail.subject.clone(),
            text: config.mail.text.clone(),
        },
    ));

    let state = AppState {
        engine,
        config: Arc::new(config),
        pool,
    };
    build_app_router(state)
}

/// Encode a bearer token for `user_id`; only the claims matter.
pub fn token_for(user_id: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        realm_access: RealmAccess::default(),
        email: None,
        email_verified: false,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("token encoding should succeed");
    format!("Bearer {token}")
}

// ---------------------------------------------------------------------------
// Shared HTTP test helpers
// ---------------------------------------------------------------------------

/// Collect the response body into a `serde_json::Value`.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect the raw response body bytes.
pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Send a request with optional JSON body and Bearer token.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", token);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: &str) -> axum::response::Response {
    send(app, Method::GET, uri, None, Some(token)).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: Value,
    token: &str,
) -> axum::response::Response {
    send(app, Method::POST, uri, Some(body), Some(token)).await
}

pub async fn put_json(
    app: Router,
    uri: &str,
    body: Value,
    token: &str,
) -> axum::response::Response {
    send(app, Method::PUT, uri, Some(body), Some(token)).await
}

pub async fn delete(app: Router, uri: &str, token: &str) -> axum::response::Response {
    send(app, Method::DELETE, uri, None, Some(token)).await
}
