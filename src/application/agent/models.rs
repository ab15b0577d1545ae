use crate::config::{AppConfig, DecisionMode};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Orchestrator state. Every request starts at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Deciding,
    Dispatching,
    Finalizing,
    Done,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Deciding => "deciding",
            Phase::Dispatching => "dispatching",
            Phase::Finalizing => "finalizing",
            Phase::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dispatched tool invocation as seen by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub invocation_id: String,
    pub tool: String,
    pub input: Value,
    pub success: bool,
    pub output: Value,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub response: String,
    pub steps: Vec<AgentStep>,
    /// Number of completion calls made; never more than two.
    pub model_calls: usize,
}

/// Per-request overrides.
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub decision_mode: Option<DecisionMode>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub decision_mode: DecisionMode,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
    pub request_timeout: Duration,
}

impl OrchestratorSettings {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        let timeouts = crate::config::TimeoutConfig::default();
        Self {
            provider: provider.into(),
            model: model.into(),
            system_prompt: None,
            decision_mode: DecisionMode::default(),
            model_timeout: timeouts.model(),
            tool_timeout: timeouts.tool(),
            request_timeout: timeouts.request(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            provider: config.default_provider.clone(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            decision_mode: config.decision_mode,
            model_timeout: config.timeouts.model(),
            tool_timeout: config.timeouts.tool(),
            request_timeout: config.timeouts.request(),
        }
    }

    pub fn with_decision_mode(mut self, mode: DecisionMode) -> Self {
        self.decision_mode = mode;
        self
    }
}
