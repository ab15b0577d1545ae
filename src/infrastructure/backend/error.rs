use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Body was not JSON, or JSON of an unexpected shape.
    #[error("{message}. Preview: {preview}")]
    UpstreamProtocol { message: String, preview: String },
}

impl BackendError {
    pub fn protocol(message: impl Into<String>, body: &str) -> Self {
        Self::UpstreamProtocol {
            message: message.into(),
            preview: super::preview(body, super::PREVIEW_LIMIT),
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, BackendError::UpstreamProtocol { .. })
    }
}
