//! Model types - Request, Response, and Error types

use crate::domain::ChatMessage;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// JSON schema the response content must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

/// Model request for LLM chat
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub provider: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Function-tool schemas offered for this turn.
    pub tools: Vec<Value>,
    pub response_schema: Option<ResponseSchema>,
}

impl ModelRequest {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            messages,
            tools: Vec::new(),
            response_schema: None,
        }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// A tool call as reported by the provider, before it becomes an invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Providers without call ids leave this empty.
    pub id: Option<String>,
    pub name: String,
    pub arguments: Value,
}

/// Model response from LLM
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content,
            tool_calls,
        }
    }

    /// Content with surrounding whitespace removed; `None` when blank.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Parses function-call arguments. Unparseable text is kept as a string so
/// validation can reject it; blank text means no arguments.
pub fn parse_arguments(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Model errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("provider '{provider}' is not configured")]
    ProviderNotFound { provider: String },
    #[error("model '{model}' is not available for provider '{provider}'")]
    ModelNotFound { provider: String, model: String },
    #[error("provider '{provider}' requires an API key")]
    MissingApiKey { provider: String },
    #[error("network error calling provider '{provider}': {source}")]
    Network {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("provider '{provider}' returned invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },
    #[error("provider '{provider}' did not answer within {secs}s")]
    Timeout { provider: String, secs: u64 },
}

impl ModelError {
    pub fn provider_not_found(provider: impl Into<String>) -> Self {
        Self::ProviderNotFound {
            provider: provider.into(),
        }
    }

    pub fn model_not_found(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn network(provider: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            provider: provider.into(),
            source,
        }
    }

    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            provider: provider.into(),
            secs,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ModelError::ProviderNotFound { provider } => {
                format!("Model provider '{provider}' is not configured. Check agent.toml.")
            }
            ModelError::ModelNotFound { provider, model } => {
                format!("Model '{model}' is not available on provider '{provider}'.")
            }
            ModelError::MissingApiKey { provider } => {
                format!("Provider '{provider}' requires an API key.")
            }
            ModelError::Network { provider, source } => {
                if source.is_connect() {
                    format!("Could not connect to model provider '{provider}'.")
                } else if source.is_timeout() {
                    format!("Request to '{provider}' timed out.")
                } else if let Some(status) = source.status() {
                    match status {
                        StatusCode::NOT_FOUND => format!("Endpoint of '{provider}' not found."),
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                            format!("Provider '{provider}' is currently unavailable.")
                        }
                        _ => format!("Request to '{provider}' failed: {}", status.as_u16()),
                    }
                } else {
                    format!("Network error talking to '{provider}'.")
                }
            }
            ModelError::InvalidResponse { provider, .. } => {
                format!("Provider '{provider}' returned an invalid response.")
            }
            ModelError::Timeout { provider, secs } => {
                format!("Provider '{provider}' did not answer within {secs} seconds.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arguments_parse_or_stay_raw() {
        assert_eq!(parse_arguments("{\"sid\":\"ERX\"}"), json!({"sid": "ERX"}));
        assert_eq!(parse_arguments("  "), Value::Null);
        assert_eq!(parse_arguments("sid=ERX"), json!("sid=ERX"));
    }

    #[test]
    fn blank_content_has_no_text() {
        assert_eq!(ModelResponse::new("  ").text(), None);
        assert_eq!(ModelResponse::new(" hi ").text(), Some("hi"));
    }
}
