use super::error::ToolInvokeError;
use super::interface::{ContentPart, ServerToolInfo, ToolCallOutput, ToolSession};
use crate::config::ServerConfig;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2025-06-18";
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tool session backed by a spawned tool server speaking newline-delimited
/// JSON-RPC on stdio. The reader task only holds a weak handle, so dropping
/// the last session handle drops the child and kills the server.
#[derive(Clone)]
pub struct StdioToolSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    server: ServerConfig,
    child: AsyncMutex<Option<Child>>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    pending: AsyncMutex<HashMap<String, oneshot::Sender<Result<Value, ToolInvokeError>>>>,
    id_counter: AtomicU64,
}

impl StdioToolSession {
    /// Spawns the server and performs the initialize handshake.
    pub async fn connect(server: ServerConfig) -> Result<Self, ToolInvokeError> {
        Self::connect_within(server, HANDSHAKE_TIMEOUT).await
    }

    /// Like [`connect`](Self::connect) with an explicit handshake limit.
    pub async fn connect_within(
        server: ServerConfig,
        handshake: Duration,
    ) -> Result<Self, ToolInvokeError> {
        let session = Self {
            inner: Arc::new(SessionInner {
                server,
                child: AsyncMutex::new(None),
                writer: AsyncMutex::new(None),
                pending: AsyncMutex::new(HashMap::new()),
                id_counter: AtomicU64::new(1),
            }),
        };
        session.inner.start(handshake).await?;
        Ok(session)
    }
}

#[async_trait]
impl ToolSession for StdioToolSession {
    async fn list_tools(&self) -> Result<Vec<ServerToolInfo>, ToolInvokeError> {
        let result = self.inner.send_request("tools/list", json!({})).await?;
        Ok(parse_tool_list(&result))
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallOutput, ToolInvokeError> {
        let params = json!({
            "name": name,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        let result = self.inner.send_request("tools/call", params).await?;
        Ok(parse_call_result(&result))
    }

    async fn close(&self) {
        self.inner.reset().await;
    }
}

impl SessionInner {
    async fn start(self: &Arc<Self>, handshake: Duration) -> Result<(), ToolInvokeError> {
        let mut command = Command::new(&self.server.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.server.workdir {
            command.current_dir(dir);
        }
        if !self.server.args.is_empty() {
            command.args(&self.server.args);
        }
        for (key, value) in &self.server.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: self.server.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdout"))?;

        *self.writer.lock().await = Some(BufWriter::new(stdin));
        *self.child.lock().await = Some(child);

        tokio::spawn(reader_loop(Arc::downgrade(self), stdout));

        let outcome = match tokio::time::timeout(handshake, self.initialize()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::HandshakeTimeout {
                server: self.server.name.clone(),
                secs: handshake.as_secs(),
            }),
        };
        if let Err(err) = outcome {
            warn!(server = %self.server.name, %err, "tool session handshake failed");
            self.reset().await;
            return Err(err);
        }
        Ok(())
    }

    async fn initialize(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let result = self.send_request("initialize", params).await?;
        info!(
            server = %self.server.name,
            server_info = ?result.get("serverInfo"),
            "tool session initialized"
        );
        self.send_notification("notifications/initialized", json!({}))
            .await
    }

    async fn process_inbound_message(&self, value: Value) -> Result<(), ToolInvokeError> {
        match (value.get("id").cloned(), value.get("method").and_then(Value::as_str)) {
            (Some(id), Some(method)) => self.handle_server_request(id, method).await,
            (Some(id), None) => {
                self.handle_response(id, value).await;
                Ok(())
            }
            (None, Some(method)) => {
                debug!(server = %self.server.name, method, "received notification from server");
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    async fn handle_response(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };
        let Some(sender) = self.pending.lock().await.remove(&key) else {
            debug!(
                server = %self.server.name,
                response_id = key,
                "received response for unknown request"
            );
            return;
        };

        let outcome = match value.get("error") {
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
            Some(error) => match error.as_object() {
                Some(err) => Err(ToolInvokeError::Rpc {
                    server: self.server.name.clone(),
                    code: err.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                    message: err
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                }),
                None => Err(self.transport_error("missing error payload in response")),
            },
        };
        let _ = sender.send(outcome);
    }

    async fn handle_server_request(&self, id: Value, method: &str) -> Result<(), ToolInvokeError> {
        if method == "ping" {
            return self
                .write_message(&json!({ "jsonrpc": "2.0", "id": id, "result": {} }))
                .await;
        }
        warn!(
            server = %self.server.name,
            method,
            "server sent unsupported request"
        );
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": -32601,
                "message": format!("client does not implement method '{method}'"),
            }
        }))
        .await
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        if let Err(err) = self.write_message(&payload).await {
            self.pending.lock().await.remove(&id);
            return Err(err);
        }

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.name.clone(),
            }),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        }))
        .await
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let mut encoded =
            serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.name.clone(),
                source,
            })?;
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let stream = writer
            .as_mut()
            .ok_or_else(|| self.transport_error("writer not initialised"))?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|source| self.transport_error(source.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|source| self.transport_error(source.to_string()))
    }

    async fn reset(&self) {
        self.writer.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(err) = child.kill().await {
                debug!(
                    server = %self.server.name,
                    %err,
                    "failed to kill tool server process (may have already exited)"
                );
            }
        }

        let mut pending = self.pending.lock().await;
        for (_, sender) in pending.drain() {
            let _ = sender.send(Err(ToolInvokeError::Terminated {
                server: self.server.name.clone(),
            }));
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.name.clone(),
            message: message.into(),
        }
    }
}

async fn reader_loop(session: Weak<SessionInner>, stdout: ChildStdout) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(raw)) = lines.next_line().await {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(inner) = session.upgrade() else {
            return;
        };
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => {
                if let Err(err) = inner.process_inbound_message(value).await {
                    warn!(
                        server = %inner.server.name,
                        %err,
                        "failed to process message from tool server"
                    );
                }
            }
            Err(source) => {
                warn!(
                    server = %inner.server.name,
                    line = trimmed,
                    %source,
                    "received invalid JSON from tool server"
                );
            }
        }
    }

    if let Some(inner) = session.upgrade() {
        inner.reset().await;
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

pub(crate) fn parse_tool_list(result: &Value) -> Vec<ServerToolInfo> {
    result
        .get("tools")
        .and_then(Value::as_array)
        .map(|tools| {
            tools
                .iter()
                .filter_map(|tool| {
                    let name = tool.get("name").and_then(Value::as_str)?;
                    Some(ServerToolInfo {
                        name: name.to_string(),
                        description: tool
                            .get("description")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        input_schema: tool.get("inputSchema").cloned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Maps a `tools/call` result to tagged parts; `structuredContent` comes
/// first so it is preferred when unwrapping.
pub(crate) fn parse_call_result(result: &Value) -> ToolCallOutput {
    let mut parts = Vec::new();
    if let Some(structured) = result.get("structuredContent").filter(|v| !v.is_null()) {
        parts.push(ContentPart::Json(structured.clone()));
    }
    for item in result
        .get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        match item.get("type").and_then(Value::as_str) {
            Some("text") => {
                if let Some(text) = item.get("text").and_then(Value::as_str) {
                    parts.push(ContentPart::Text(text.to_string()));
                }
            }
            Some("json") => {
                if let Some(value) = item.get("json").or_else(|| item.get("data")) {
                    parts.push(ContentPart::Json(value.clone()));
                }
            }
            other => debug!(content_type = ?other, "ignoring unsupported content part"),
        }
    }
    ToolCallOutput {
        parts,
        is_error: result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_result_prefers_structured_content() {
        let output = parse_call_result(&json!({
            "content": [
                {"type": "text", "text": "{\"sid\":\"ERX\"}"},
                {"type": "image", "data": "..."}
            ],
            "structuredContent": {"sid": "ERX"},
            "isError": false
        }));
        assert_eq!(
            output.parts,
            vec![
                ContentPart::Json(json!({"sid": "ERX"})),
                ContentPart::Text("{\"sid\":\"ERX\"}".into()),
            ]
        );
        assert!(!output.is_error);
    }

    #[test]
    fn call_result_reads_json_parts_and_error_flag() {
        let output = parse_call_result(&json!({
            "content": [{"type": "json", "json": [1, 2]}],
            "isError": true
        }));
        assert_eq!(output.parts, vec![ContentPart::Json(json!([1, 2]))]);
        assert!(output.is_error);
    }

    #[test]
    fn tool_list_skips_nameless_entries() {
        let tools = parse_tool_list(&json!({
            "tools": [
                {"name": "search_system_flexi", "description": "search", "inputSchema": {"type": "object"}},
                {"description": "no name"}
            ]
        }));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "search_system_flexi");
    }

    fn sleeper(pid_file: &std::path::Path) -> ServerConfig {
        ServerConfig {
            name: "mute".into(),
            command: "/bin/sh".into(),
            args: vec![
                "-c".into(),
                format!("echo $$ > '{}'; exec sleep 30", pid_file.display()),
            ],
            env: Default::default(),
            workdir: None,
        }
    }

    async fn read_pid(pid_file: &std::path::Path) -> u32 {
        for _ in 0..100 {
            if let Ok(text) = std::fs::read_to_string(pid_file) {
                if let Ok(pid) = text.trim().parse() {
                    return pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("server never wrote its pid");
    }

    /// Running means present in /proc and not a zombie.
    fn is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .and_then(|rest| rest.split_whitespace().next())
                .is_some_and(|state| state != "Z" && state != "X"),
            Err(_) => false,
        }
    }

    async fn wait_until_stopped(pid: u32) -> bool {
        for _ in 0..100 {
            if !is_running(pid) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn silent_server_times_out_and_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("server.pid");

        let err = StdioToolSession::connect_within(sleeper(&pid_file), Duration::from_millis(300))
            .await
            .err()
            .expect("handshake times out");
        assert!(matches!(err, ToolInvokeError::HandshakeTimeout { .. }));

        let pid = read_pid(&pid_file).await;
        assert!(wait_until_stopped(pid).await, "server {pid} still running");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn abandoned_connect_kills_the_server() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("server.pid");

        let attempt = tokio::time::timeout(
            Duration::from_millis(300),
            StdioToolSession::connect(sleeper(&pid_file)),
        )
        .await;
        assert!(attempt.is_err());

        let pid = read_pid(&pid_file).await;
        assert!(wait_until_stopped(pid).await, "server {pid} still running");
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let server = ServerConfig {
            name: "ghost".into(),
            command: "/nonexistent/landscape-tool-server".into(),
            args: vec![],
            env: Default::default(),
            workdir: None,
        };
        let err = StdioToolSession::connect(server).await.err().expect("spawn fails");
        assert!(matches!(err, ToolInvokeError::Spawn { .. }));
        assert!(!err.is_tool_level());
    }
}
