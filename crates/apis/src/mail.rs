//! Client for the outbound mail relay.
//!
//! The relay is a Mailpit-style HTTP API: one JSON POST per message, with
//! attachments carried inline as base64. The relay's field names are
//! capitalized, hence the explicit renames.

use serde::Serialize;

use crate::error::ApiError;

/// A message for the relay's `/api/v1/send` endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendRequest {
    #[serde(rename = "From")]
    pub from: Address,
    #[serde(rename = "To", skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Address>,
    #[serde(rename = "Bcc", skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "HTML", skip_serializing_if = "String::is_empty")]
    pub html: String,
    #[serde(rename = "Attachments", skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Address {
    #[serde(rename = "Name", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Attachment {
    /// Base64-encoded file content.
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "ContentType", skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(rename = "ContentID", skip_serializing_if = "String::is_empty")]
    pub content_id: String,
}

/// HTTP client for the mail relay.
pub struct MailClient {
    client: reqwest::Client,
    base_url: String,
}

impl MailClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Send one message. Returns the relay's message id.
    pub async fn send(&self, request: &SendRequest) -> Result<String, ApiError> {
        let response = self
            .client
            .post(format!("{}/api/v1/send", self.base_url))
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        Ok(response.text().await?)
    }
}
