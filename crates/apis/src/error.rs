/// Errors from the upstream service clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The upstream returned a non-2xx status code.
    #[error("upstream error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A response body could not be decoded.
    #[error("upstream response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request was rejected locally before dispatch.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The upstream answered 2xx but with an unusable payload.
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub(crate) async fn from_response(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        ApiError::Api { status, body }
    }
}
