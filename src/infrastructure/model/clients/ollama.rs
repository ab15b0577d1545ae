//! Ollama client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelProviderConfig;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::{ModelError, ModelRequest, ModelResponse, ToolCall};

/// Ollama client for local LLM
#[derive(Clone)]
pub struct OllamaClient {
    base: HttpClientBase,
    api_path: String,
}

impl OllamaClient {
    /// Creates client from provider config.
    pub fn from_config(config: &ModelProviderConfig) -> Self {
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), None),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| "/api/chat".to_string()),
        }
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url(&self.api_path);

        let payload = OllamaRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_ollama_format(&request.messages),
            tools: (!request.tools.is_empty()).then(|| request.tools.clone()),
            format: request.response_schema.as_ref().map(|s| s.schema.clone()),
            stream: false,
        };

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to Ollama"
        );

        let response: OllamaResponse = self.base.post_no_auth(&url, &payload).await?;
        debug!("Received response from Ollama");

        let message = response
            .message
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))?;

        // Ollama does not assign call ids; the orchestrator generates them.
        let calls = message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: None,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();
        Ok(ModelResponse::with_tool_calls(Some(message.content), calls))
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Deserialize)]
struct OllamaToolCall {
    function: OllamaFunction,
}

#[derive(Deserialize)]
struct OllamaFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}
