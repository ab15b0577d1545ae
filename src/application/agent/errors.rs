use crate::application::tooling::ToolInvokeError;
use crate::infrastructure::model::ModelError;
use thiserror::Error;

/// Failures that abort a whole request. Individual tool failures never end
/// up here; they are recorded as tool results.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("tool session failed: {0}")]
    Session(#[from] ToolInvokeError),
    #[error("request cancelled")]
    Cancelled,
    #[error("request did not finish within {secs}s")]
    TimedOut { secs: u64 },
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::Session(err) => {
                format!("The landscape tools are unavailable right now ({err}).")
            }
            AgentError::Cancelled => "Request cancelled.".to_string(),
            AgentError::TimedOut { secs } => {
                format!("No answer within {secs} seconds. Try a narrower question.")
            }
            AgentError::InvalidResponse(_) => {
                "The model returned a response that could not be understood. Please try again."
                    .to_string()
            }
        }
    }
}
