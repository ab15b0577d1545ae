use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolInvokeError;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerToolInfo {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<Value>,
}

/// One content entry of a tool call result.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallOutput {
    pub parts: Vec<ContentPart>,
    pub is_error: bool,
}

impl ToolCallOutput {
    pub fn json(value: Value, is_error: bool) -> Self {
        Self {
            parts: vec![ContentPart::Json(value)],
            is_error,
        }
    }
}

/// A remote tool session held open for one user request.
#[async_trait]
pub trait ToolSession: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ServerToolInfo>, ToolInvokeError>;

    async fn call_tool(&self, name: &str, arguments: Value)
    -> Result<ToolCallOutput, ToolInvokeError>;

    async fn close(&self);
}
