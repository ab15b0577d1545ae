use super::types::{INVALID_PARAMS, JSONRPC_VERSION, RpcRequest, RpcResponse};
use crate::application::landscape::LandscapeToolHost;
use crate::application::tooling::PROTOCOL_VERSION;
use crate::domain::ToolPayload;
use serde_json::{Map, Value, json};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

const SERVER_NAME: &str = "landscape-tool-server";

/// Serves the landscape catalog over newline-delimited JSON-RPC.
#[derive(Clone)]
pub struct ToolServer {
    host: LandscapeToolHost,
}

impl ToolServer {
    pub fn new(host: LandscapeToolHost) -> Self {
        Self { host }
    }

    /// Reads requests until EOF. Each reply is written as a single line.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut encoded = match serde_json::to_string(&response) {
                    Ok(encoded) => encoded,
                    Err(err) => {
                        error!(%err, "failed to encode response");
                        continue;
                    }
                };
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!("input closed, tool server stopping");
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle(request).await,
            Err(err) => {
                warn!(%err, "unparseable request");
                Some(RpcResponse::parse_error(format!("Parse error: {err}")))
            }
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(method = %request.method, "received request");

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(RpcResponse::invalid_request(
                request.id,
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }
        if request.is_notification() {
            debug!(method = %request.method, "notification");
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => RpcResponse::success(id, initialize_result()),
            "ping" => RpcResponse::success(id, json!({})),
            "tools/list" => RpcResponse::success(id, self.tool_list()),
            "tools/call" => self.call(id, request.params).await,
            other => {
                warn!(method = other, "unknown method");
                RpcResponse::method_not_found(id, other)
            }
        };
        Some(response)
    }

    fn tool_list(&self) -> Value {
        let tools: Vec<Value> = self
            .host
            .catalog()
            .tools()
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn call(&self, id: Option<Value>, params: Option<Value>) -> RpcResponse {
        let Some(Value::Object(mut params)) = params else {
            return RpcResponse::error(id, INVALID_PARAMS, "params must be an object with name");
        };
        let name = match params.remove("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => name,
            _ => {
                return RpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    "params.name must be a non-empty string",
                );
            }
        };
        let arguments = match params.remove("arguments") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(arguments) => arguments,
        };

        info!(tool = name.as_str(), "tools/call");
        let payload = match self.host.call(&name, arguments).await {
            Ok(value) => ToolPayload::Value(value),
            Err(failure) => ToolPayload::Error(failure),
        };
        RpcResponse::success(id, call_result(&payload))
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}

/// The text part carries the same JSON for clients that ignore
/// `structuredContent`.
fn call_result(payload: &ToolPayload) -> Value {
    let value = payload.to_value();
    json!({
        "content": [{ "type": "text", "text": value.to_string() }],
        "structuredContent": value,
        "isError": payload.is_error(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::landscape::{
        CockpitSource, InventorySearch, OutputFormat, SearchResponse,
    };
    use crate::application::tooling::{ContentPart, ToolCallOutput, unwrap_content};
    use crate::infrastructure::backend::BackendError;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Search;

    #[async_trait]
    impl InventorySearch for Search {
        async fn search(
            &self,
            _query: &str,
            _format: OutputFormat,
        ) -> Result<SearchResponse, BackendError> {
            Ok(SearchResponse::Json(json!([{"id": "7", "sid": "ERX", "status": "Live"}])))
        }
    }

    struct Cockpit;

    #[async_trait]
    impl CockpitSource for Cockpit {
        async fn fetch(&self, _objectid: &str, _systype: &str) -> Result<Value, BackendError> {
            Ok(json!({"SID": "ERX"}))
        }
    }

    fn server() -> ToolServer {
        ToolServer::new(LandscapeToolHost::new(Arc::new(Search), Arc::new(Cockpit)))
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let reply = server()
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn garbage_is_a_parse_error() {
        let reply = server().handle_line("not json").await.unwrap();
        assert_eq!(reply.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_as_tool_error() {
        let reply = server()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_weather"}}"#,
            )
            .await
            .unwrap();
        let result = reply.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["structuredContent"]["kind"], json!("tool_execution"));
    }

    #[tokio::test]
    async fn call_result_text_mirrors_structured_content() {
        let reply = server()
            .handle_line(
                r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"cockpit_get_view_by_sid","arguments":{"sid":"ERX","sections":["system_details"]}}}"#,
            )
            .await
            .unwrap();
        assert_eq!(reply.id, Some(json!("a")));
        let result = reply.result.unwrap();
        assert_eq!(result["isError"], json!(false));
        assert_eq!(result["structuredContent"]["_resolved"]["objectid"], json!("7"));

        // A client reading only the text part gets the same view.
        let text = result["content"][0]["text"].as_str().unwrap().to_string();
        let output = ToolCallOutput {
            parts: vec![ContentPart::Text(text)],
            is_error: false,
        };
        assert_eq!(unwrap_content(&output), result["structuredContent"]);
    }
}
