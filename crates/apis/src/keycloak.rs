//! Token exchange at the identity provider.
//!
//! The scheduler runs on behalf of report owners. It holds only a service
//! account; before each scheduled run it exchanges those credentials for a
//! short-lived token impersonating the owning user, so every downstream call
//! happens with that user's permissions.

use serde::Deserialize;

use crate::error::ApiError;

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the identity provider's token endpoint.
pub struct KeycloakClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl KeycloakClient {
    pub fn new(base_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            client_id,
            client_secret,
        }
    }

    /// Exchange the service-account credentials for a bearer token bound to
    /// `user_id`. Returns a ready-to-send `Authorization` header value.
    pub async fn exchange_user_token(&self, user_id: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(format!(
                "{}/auth/realms/master/protocol/openid-connect/token",
                self.base_url
            ))
            .form(&[
                ("grant_type", TOKEN_EXCHANGE_GRANT),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("requested_subject", user_id),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        let token = response.json::<TokenResponse>().await?;
        Ok(format!("Bearer {}", token.access_token))
    }
}
