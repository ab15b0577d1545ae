//! Message adapters - convert transcripts to provider wire formats

use crate::domain::{ChatMessage, MessageRole};
use serde_json::{Map, Value, json};

/// Adapter for converting messages to different API formats
pub struct MessageAdapter;

impl MessageAdapter {
    /// OpenAI chat-completions messages. Tool calls carry their arguments as
    /// a JSON-encoded string.
    pub fn to_openai_format(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::Assistant if !msg.tool_calls.is_empty() => {
                    let calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.tool,
                                    "arguments": encode_arguments(&call.arguments),
                                }
                            })
                        })
                        .collect();
                    json!({
                        "role": "assistant",
                        "content": non_empty(&msg.content),
                        "tool_calls": calls,
                    })
                }
                MessageRole::Tool => json!({
                    "role": "tool",
                    "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
                    "content": msg.content,
                }),
                role => json!({
                    "role": role.as_str(),
                    "content": msg.content,
                }),
            })
            .collect()
    }

    /// Ollama `/api/chat` messages. Tool call arguments stay JSON objects and
    /// tool results are labelled with the tool name.
    pub fn to_ollama_format(messages: &[ChatMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::Assistant if !msg.tool_calls.is_empty() => {
                    let calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "function": {
                                    "name": call.tool,
                                    "arguments": object_arguments(&call.arguments),
                                }
                            })
                        })
                        .collect();
                    json!({
                        "role": "assistant",
                        "content": msg.content,
                        "tool_calls": calls,
                    })
                }
                MessageRole::Tool => json!({
                    "role": "tool",
                    "tool_name": msg.name.clone().unwrap_or_default(),
                    "content": msg.content,
                }),
                role => json!({
                    "role": role.as_str(),
                    "content": msg.content,
                }),
            })
            .collect()
    }
}

fn non_empty(content: &str) -> Value {
    if content.trim().is_empty() {
        Value::Null
    } else {
        Value::String(content.to_string())
    }
}

fn encode_arguments(arguments: &Value) -> String {
    match arguments {
        Value::String(raw) => raw.clone(),
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

fn object_arguments(arguments: &Value) -> Value {
    match arguments {
        Value::Object(_) => arguments.clone(),
        _ => Value::Object(Map::new()),
    }
}
