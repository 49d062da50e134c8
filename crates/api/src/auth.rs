//! Bearer-token extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tabula_core::auth::Claims;
use tabula_core::CoreError;

use crate::error::AppError;

/// Authenticated caller extracted from the `Authorization` header.
///
/// Keeps the raw header value so handlers can pass the caller's credentials
/// through to the engine, which forwards them to every upstream service.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The caller's user id (`sub` claim).
    pub user_id: String,
    /// The decoded token claims.
    pub claims: Claims,
    /// The raw `Authorization` header value, forwarded downstream.
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::from(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let claims = Claims::parse(header)?;
        Ok(AuthUser {
            user_id: claims.sub.clone(),
            claims,
            token: header.to_string(),
        })
    }
}
