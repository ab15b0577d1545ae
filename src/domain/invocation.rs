use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A tool call decided by the model. Consumed exactly once by dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub tool: String,
    pub arguments: Value,
    /// Model turn (1-based) that produced the invocation.
    pub issued_by: u32,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, tool: impl Into<String>, arguments: Value, issued_by: u32) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            arguments,
            issued_by,
        }
    }

    /// Generates a correlation id for providers that do not supply one.
    pub fn generated_id() -> String {
        format!("call_{}", uuid::Uuid::new_v4().simple())
    }
}

/// Error taxonomy surfaced to the model inside tool results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AllCanceled,
    UpstreamProtocol,
    ToolExecution,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::AllCanceled => "all_canceled",
            ErrorKind::UpstreamProtocol => "upstream_protocol",
            ErrorKind::ToolExecution => "tool_execution",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ToolFailure {
    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ToolExecution,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    Value(Value),
    Error(ToolFailure),
}

impl ToolPayload {
    pub fn is_error(&self) -> bool {
        match self {
            ToolPayload::Error(_) => true,
            // Adapters report failures as an envelope carrying `error`.
            ToolPayload::Value(value) => value.get("error").is_some(),
        }
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            ToolPayload::Error(failure) => Some(failure.kind),
            ToolPayload::Value(value) => value
                .get("kind")
                .filter(|_| value.get("error").is_some())
                .and_then(|kind| serde_json::from_value(kind.clone()).ok()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ToolPayload::Value(value) => value.clone(),
            ToolPayload::Error(failure) => json!({
                "error": failure.message,
                "kind": failure.kind,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolResult {
    pub invocation_id: String,
    pub tool: String,
    pub payload: ToolPayload,
    pub produced_at: DateTime<Utc>,
}

impl ToolResult {
    pub fn success(invocation: &ToolInvocation, value: Value) -> Self {
        Self::with_payload(invocation, ToolPayload::Value(value))
    }

    pub fn failure(invocation: &ToolInvocation, failure: ToolFailure) -> Self {
        Self::with_payload(invocation, ToolPayload::Error(failure))
    }

    fn with_payload(invocation: &ToolInvocation, payload: ToolPayload) -> Self {
        Self {
            invocation_id: invocation.id.clone(),
            tool: invocation.tool.clone(),
            payload,
            produced_at: Utc::now(),
        }
    }

    /// Serialized form placed into the model context.
    pub fn content(&self) -> String {
        self.payload.to_value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_payload_serializes_kind() {
        let invocation = ToolInvocation::new("c1", "missing", json!({}), 1);
        let result = ToolResult::failure(&invocation, ToolFailure::execution("unknown tool 'missing'"));
        let value: Value = serde_json::from_str(&result.content()).expect("json");
        assert_eq!(value["kind"], "tool_execution");
        assert_eq!(value["error"], "unknown tool 'missing'");
        assert!(result.payload.is_error());
    }

    #[test]
    fn envelope_with_error_key_counts_as_error() {
        let payload = ToolPayload::Value(json!({"error": "boom", "step": "resolve"}));
        assert!(payload.is_error());
        assert!(!ToolPayload::Value(json!({"system_details": {}})).is_error());
    }

    #[test]
    fn failure_kind_reads_envelopes_and_failures() {
        let envelope = ToolPayload::Value(json!({"error": "gone", "kind": "all_canceled"}));
        assert_eq!(envelope.failure_kind(), Some(ErrorKind::AllCanceled));
        assert_eq!(
            envelope.failure_kind().map(ErrorKind::as_str),
            Some("all_canceled")
        );
        let failure = ToolPayload::Error(ToolFailure::execution("boom"));
        assert_eq!(failure.failure_kind(), Some(ErrorKind::ToolExecution));
        assert_eq!(ToolPayload::Value(json!({"kind": "not_found"})).failure_kind(), None);
    }
}
