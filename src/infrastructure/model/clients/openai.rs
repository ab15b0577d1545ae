//! OpenAI-compatible client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelProviderConfig;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::ModelClient;
use crate::infrastructure::model::types::{
    ModelError, ModelRequest, ModelResponse, ToolCall, parse_arguments,
};

/// OpenAI-compatible chat-completions client
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
}

impl OpenAIClient {
    pub fn from_config(config: &ModelProviderConfig) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), api_key),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| "/v1/chat/completions".to_string()),
        }
    }

    fn build_payload(request: &ModelRequest) -> OpenAIRequest {
        let tools = (!request.tools.is_empty()).then(|| request.tools.clone());
        let response_format = request.response_schema.as_ref().map(|schema| {
            json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                }
            })
        });
        OpenAIRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_openai_format(&request.messages),
            tool_choice: tools.as_ref().map(|_| "auto"),
            tools,
            response_format,
            stream: false,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let payload = Self::build_payload(&request);

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            structured = request.response_schema.is_some(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: OpenAIResponse = self.base.post_with_bearer(&url, &payload).await?;
        debug!("Received response from OpenAI-compatible provider");

        let message = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))?;

        Ok(message.into_response())
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAIToolCall>,
}

#[derive(Deserialize)]
struct OpenAIToolCall {
    #[serde(default)]
    id: Option<String>,
    function: OpenAIFunction,
}

#[derive(Deserialize)]
struct OpenAIFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl OpenAIMessage {
    fn into_response(self) -> ModelResponse {
        let calls = self
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id.filter(|id| !id.is_empty()),
                name: call.function.name,
                arguments: parse_arguments(&call.function.arguments),
            })
            .collect();
        ModelResponse::with_tool_calls(self.content, calls)
    }
}
