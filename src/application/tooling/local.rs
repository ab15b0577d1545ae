use super::error::ToolInvokeError;
use super::interface::{ServerToolInfo, ToolCallOutput, ToolSession};
use crate::application::landscape::LandscapeToolHost;
use crate::domain::ToolPayload;
use async_trait::async_trait;
use serde_json::Value;

/// Tool session served by the in-crate tool host, without a child process.
#[derive(Clone)]
pub struct InProcessToolSession {
    host: LandscapeToolHost,
}

impl InProcessToolSession {
    pub fn new(host: LandscapeToolHost) -> Self {
        Self { host }
    }
}

#[async_trait]
impl ToolSession for InProcessToolSession {
    async fn list_tools(&self) -> Result<Vec<ServerToolInfo>, ToolInvokeError> {
        Ok(self
            .host
            .catalog()
            .tools()
            .iter()
            .map(|tool| ServerToolInfo {
                name: tool.name.to_string(),
                description: Some(tool.description.to_string()),
                input_schema: Some(tool.input_schema()),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallOutput, ToolInvokeError> {
        let payload = match self.host.call(name, arguments).await {
            Ok(value) => ToolPayload::Value(value),
            Err(failure) => ToolPayload::Error(failure),
        };
        Ok(ToolCallOutput::json(payload.to_value(), payload.is_error()))
    }

    async fn close(&self) {}
}
