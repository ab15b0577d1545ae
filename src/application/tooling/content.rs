use super::interface::{ContentPart, ToolCallOutput};
use crate::domain::{ToolFailure, ToolPayload};
use serde_json::{Value, json};

/// Reduces the content parts of a call to one value: a json part wins,
/// otherwise the first text part is parsed as JSON or wrapped as `{"text"}`.
pub fn unwrap_content(output: &ToolCallOutput) -> Value {
    if let Some(value) = output.parts.iter().find_map(|part| match part {
        ContentPart::Json(value) => Some(value.clone()),
        ContentPart::Text(_) => None,
    }) {
        return value;
    }

    let text = output.parts.iter().find_map(|part| match part {
        ContentPart::Text(text) => Some(text.as_str()),
        ContentPart::Json(_) => None,
    });
    match text {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| json!({ "text": text })),
        None => json!({ "warning": "tool returned no usable content" }),
    }
}

/// Converts a call result into a transcript payload. Results flagged as
/// errors keep their envelope when they have one.
pub fn into_payload(output: &ToolCallOutput) -> ToolPayload {
    let value = unwrap_content(output);
    if !output.is_error || value.get("error").is_some() {
        return ToolPayload::Value(value);
    }
    let message = match &value {
        Value::String(text) => text.clone(),
        Value::Object(map) if map.contains_key("text") => {
            map["text"].as_str().unwrap_or_default().to_string()
        }
        other => other.to_string(),
    };
    ToolPayload::Error(ToolFailure::execution(message))
}
