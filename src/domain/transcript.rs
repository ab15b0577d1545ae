use super::invocation::{ToolInvocation, ToolResult};
use super::types::ChatMessage;

/// Ordered conversation state for a single user request.
///
/// Messages are only ever appended; the transcript is dropped once the final
/// answer has been produced.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    results: Vec<ToolResult>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn push_invocations(&mut self, content: impl Into<String>, calls: Vec<ToolInvocation>) {
        self.messages
            .push(ChatMessage::assistant_with_calls(content, calls));
    }

    pub fn push_result(&mut self, result: ToolResult) {
        self.messages.push(ChatMessage::tool(
            result.invocation_id.clone(),
            result.tool.clone(),
            result.content(),
        ));
        self.results.push(result);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn results(&self) -> &[ToolResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
