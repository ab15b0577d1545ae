use super::{BackendError, build_http_client};
use crate::application::landscape::CockpitSource;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Client for the cockpit data provider, keyed by object id and system type.
#[derive(Clone)]
pub struct CockpitClient {
    client: Client,
    base_url: String,
}

impl CockpitClient {
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        accept_invalid_certs: bool,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_http_client(timeout_secs, accept_invalid_certs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the raw cockpit document. Any JSON value is returned; callers
    /// decide whether its shape is usable.
    pub async fn payload(&self, objectid: &str, systype: &str) -> Result<Value, BackendError> {
        debug!(url = %self.base_url, objectid, systype, "fetching cockpit payload");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("systype", systype), ("objectid", objectid)])
            .send()
            .await
            .map_err(|source| BackendError::Request {
                url: self.base_url.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| BackendError::Request {
                url: self.base_url.clone(),
                source,
            })?;
        if !status.is_success() {
            return Err(BackendError::Status {
                url: self.base_url.clone(),
                status: status.as_u16(),
                message: super::preview(&text, super::PREVIEW_LIMIT),
            });
        }

        serde_json::from_str(&text).map_err(|_| {
            BackendError::protocol(
                format!(
                    "Cockpit API returned non-JSON response for objectid={objectid}, systype={systype}"
                ),
                &text,
            )
        })
    }
}

#[async_trait]
impl CockpitSource for CockpitClient {
    async fn fetch(&self, objectid: &str, systype: &str) -> Result<Value, BackendError> {
        self.payload(objectid, systype).await
    }
}
