use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("tool server '{server}' is not configured")]
    NotConfigured { server: String },
    #[error("failed to spawn tool server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool server '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool server '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool server '{server}' did not finish the handshake within {secs}s")]
    HandshakeTimeout { server: String, secs: u64 },
    #[error("tool server '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("tool server '{server}' request cancelled")]
    Cancelled { server: String },
}

impl ToolInvokeError {
    /// A JSON-RPC error answers one call; every other variant means the
    /// session itself is unusable.
    pub fn is_tool_level(&self) -> bool {
        matches!(self, ToolInvokeError::Rpc { .. })
    }
}
