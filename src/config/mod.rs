pub mod app;
pub mod backend;
pub mod error;
pub mod loader;
pub mod provider;
pub mod server;

/// Default config file path - can be overridden via CLI argument
pub const CONFIG_PATH: &str = "config/agent.toml";

pub use app::{AppConfig, DecisionMode, SessionConfig, TimeoutConfig, Transport};
pub use backend::BackendConfig;
pub use error::ConfigError;
pub use loader::{ensure_env_loaded, load_config, parse_config};
pub use provider::{ModelInfo, ModelProviderConfig};
pub use server::ServerConfig;
