pub mod invocation;
pub mod transcript;
pub mod types;

pub use invocation::{ErrorKind, ToolFailure, ToolInvocation, ToolPayload, ToolResult};
pub use transcript::Transcript;
pub use types::{ChatMessage, MessageRole};
