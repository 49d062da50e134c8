//! Client for the device-inventory aggregator.

use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use crate::error::ApiError;

/// Inventory page size; the aggregator caps result sets anyway.
const PAGE_LIMIT: i64 = 1000;

/// HTTP client for the device inventory.
pub struct DevicesClient {
    client: reqwest::Client,
    base_url: String,
}

impl DevicesClient {
    pub fn new(url: &str, port: i64) -> Self {
        Self::with_base_url(format!("{url}:{port}"))
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// List devices, annotated with their activity log over the `last`
    /// window (e.g. `"24h"`).
    pub async fn query(&self, auth: &str, last: &str) -> Result<Vec<Value>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api-aggregator/devices", self.base_url))
            .query(&[
                ("offset", "0".to_string()),
                ("limit", PAGE_LIMIT.to_string()),
                ("log", last.to_string()),
            ])
            .header(AUTHORIZATION, auth)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        Ok(response.json::<Vec<Value>>().await?)
    }
}
