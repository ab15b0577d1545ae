use crate::application::catalog::{COCKPIT_VIEW_TOOL, FLEXI_SEARCH_TOOL, ToolCatalog};
use crate::infrastructure::model::ResponseSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::LazyLock;

/// Default system prompt steering tool choice.
pub static ROUTING_PROMPT: LazyLock<String> = LazyLock::new(|| {
    format!(
        "You answer questions about the system landscape inventory. \
         For a question about one system identified by its SID, call `{COCKPIT_VIEW_TOOL}` \
         and request only the sections you need. \
         For listing or filtering systems by attributes, call `{FLEXI_SEARCH_TOOL}` \
         with the fields to return and `field|value` filters. \
         Prefer exactly one tool per question. \
         Answer directly without tools when the question is not about the inventory."
    )
});

/// Appended before the final turn.
pub const FALLBACK_POLICY: &str = "Answer the user's question using the tool results above \
when they are sufficient. If the results are empty, vague, incomplete or report an error \
or uncertainty, say so briefly and fall back on your general knowledge. \
Do not request further tools.";

pub const STRUCTURED_SCHEMA_NAME: &str = "tool_decision";

pub fn structured_decision_schema() -> ResponseSchema {
    ResponseSchema {
        name: STRUCTURED_SCHEMA_NAME.to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "tool_calls": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "decision": { "type": "string", "enum": ["tool", "no_tool"] },
                            "reason": { "type": "string" },
                            "function": { "type": "string" },
                            "parameters": { "type": "object" }
                        },
                        "required": ["decision", "reason", "function", "parameters"]
                    }
                },
                "answer": { "type": "string" }
            },
            "required": ["tool_calls", "answer"]
        }),
    }
}

pub fn structured_instructions(catalog: &ToolCatalog) -> String {
    format!(
        "Decide whether tools are needed. Reply only with a JSON document \
         {{\"tool_calls\": [{{\"decision\": \"tool\", \"reason\": \"...\", \"function\": \"<tool name>\", \
         \"parameters\": {{...}}}}], \"answer\": \"...\"}}. \
         Leave `tool_calls` empty and put the reply in `answer` when no tool is needed.\n\
         Available tools:\n{}",
        catalog.describe()
    )
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DecisionEntry {
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub parameters: Value,
}

impl DecisionEntry {
    pub fn wants_tool(&self) -> bool {
        self.decision.trim().eq_ignore_ascii_case("tool") && !self.function.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructuredDecision {
    #[serde(default)]
    pub tool_calls: Vec<DecisionEntry>,
    #[serde(default)]
    pub answer: String,
}

impl StructuredDecision {
    /// Accepts the document with or without a surrounding code fence.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let trimmed = content.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .unwrap_or(trimmed);
        serde_json::from_str(body.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_decision() {
        let decision = StructuredDecision::parse(
            "```json\n{\"tool_calls\":[{\"decision\":\"tool\",\"reason\":\"sid\",\"function\":\"cockpit_get_view_by_sid\",\"parameters\":{\"sid\":\"ERX\"}}],\"answer\":\"\"}\n```",
        )
        .unwrap();
        assert_eq!(decision.tool_calls.len(), 1);
        assert!(decision.tool_calls[0].wants_tool());
        assert_eq!(decision.tool_calls[0].parameters, json!({"sid": "ERX"}));
    }

    #[test]
    fn no_tool_entries_are_not_dispatched() {
        let entry = DecisionEntry {
            decision: "no_tool".into(),
            function: "cockpit_get_view_by_sid".into(),
            ..Default::default()
        };
        assert!(!entry.wants_tool());
    }

    #[test]
    fn routing_prompt_names_both_tools() {
        assert!(ROUTING_PROMPT.contains(COCKPIT_VIEW_TOOL));
        assert!(ROUTING_PROMPT.contains(FLEXI_SEARCH_TOOL));
    }
}
