/// Errors from the rendering-engine layer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("rendering engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine rejected the caller's credentials (HTTP 401).
    #[error("rendering engine unauthorized")]
    Unauthorized,

    /// The engine returned a non-2xx status code.
    #[error("rendering engine error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Engine error message, or the raw body when unparseable.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("rendering engine response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The engine's response was missing expected content.
    #[error("rendering engine data missing: {0}")]
    MissingData(String),
}
