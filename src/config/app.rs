use super::backend::BackendConfig;
use super::error::ConfigError;
use super::provider::ModelProviderConfig;
use super::server::ServerConfig;
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// How the model reports its tool decision in the first turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    /// Provider-native function calling.
    #[default]
    Native,
    /// Schema-constrained JSON decision document.
    Structured,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// Spawn the configured tool server and talk JSON-RPC over stdio.
    Stdio,
    /// Host the tools inside the agent process.
    #[default]
    InProcess,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub transport: Transport,
    pub server: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub model_secs: u64,
    pub tool_secs: u64,
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            model_secs: DEFAULT_MODEL_TIMEOUT_SECS,
            tool_secs: DEFAULT_TOOL_TIMEOUT_SECS,
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl TimeoutConfig {
    pub fn model(&self) -> Duration {
        Duration::from_secs(self.model_secs)
    }

    pub fn tool(&self) -> Duration {
        Duration::from_secs(self.tool_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Application configuration loaded from agent.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub decision_mode: DecisionMode,
    pub providers: Vec<ModelProviderConfig>,
    pub backend: BackendConfig,
    pub timeouts: TimeoutConfig,
    pub session: SessionConfig,
    pub servers: Vec<ServerConfig>,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|server| server.name == name)
    }

    /// Server backing the stdio session, if that transport is selected.
    pub fn session_server(&self) -> Option<&ServerConfig> {
        match self.session.transport {
            Transport::Stdio => self.session.server.as_deref().and_then(|name| self.server(name)),
            Transport::InProcess => None,
        }
    }
}
