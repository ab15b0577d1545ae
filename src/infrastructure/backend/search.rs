use super::{BackendError, build_http_client, join_url};
use crate::application::landscape::{InventorySearch, OutputFormat, SearchResponse};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

const FLEXI_PATH: &str = "report/flexi";

/// Client for the Flexi report (inventory search) endpoint.
#[derive(Clone)]
pub struct FlexiClient {
    client: Client,
    base_url: String,
}

impl FlexiClient {
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

    /// Runs a raw Flexi query. JSON bodies are parsed, other formats are
    /// returned as text.
    pub async fn query(
        &self,
        query: &str,
        format: OutputFormat,
    ) -> Result<SearchResponse, BackendError> {
        let url = join_url(&self.base_url, FLEXI_PATH);
        debug!(%url, query, otype = %format, "calling flexi report");

        let response = self
            .client
            .get(&url)
            .query(&[("sw", "f"), ("otype", format.as_str()), ("query", query)])
            .send()
            .await
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;
        if !status.is_success() {
            return Err(BackendError::Status {
                url,
                status: status.as_u16(),
                message: super::preview(&text, super::PREVIEW_LIMIT),
            });
        }

        if format != OutputFormat::Json {
            return Ok(SearchResponse::Text(text));
        }
        serde_json::from_str(&text)
            .map(SearchResponse::Json)
            .map_err(|_| BackendError::protocol("Flexi API returned non-JSON response", &text))
    }
}

#[async_trait]
impl InventorySearch for FlexiClient {
    async fn search(
        &self,
        query: &str,
        format: OutputFormat,
    ) -> Result<SearchResponse, BackendError> {
        self.query(query, format).await
    }
}
