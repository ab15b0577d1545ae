//! Provider factory - creates clients from config

use super::clients::{OllamaClient, OpenAIClient};
use super::traits::ModelClient;
use crate::config::ModelProviderConfig;
use std::env;
use tracing::warn;

/// Resolve API key from the environment variable named in config
pub fn resolve_api_key(provider: &str, spec: Option<&str>) -> Option<String> {
    let raw = spec.map(str::trim).filter(|raw| !raw.is_empty())?;
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating model clients from provider config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// `ollama` gets the Ollama client; everything else speaks the
    /// OpenAI-compatible format.
    pub fn create(config: &ModelProviderConfig) -> Box<dyn ModelClient> {
        if config.is_ollama() {
            Box::new(OllamaClient::from_config(config))
        } else {
            Box::new(OpenAIClient::from_config(config))
        }
    }
}
