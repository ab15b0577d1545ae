//! # Provider Configuration
//!
//! Configuration types for the completion API providers.
//!
//! | Type | Description | API Key Required |
//! |------|-------------|-----------------|
//! | `openai` | OpenAI-compatible chat completions | Yes |
//! | `ollama` | Local Ollama server | No |

use serde::{Deserialize, Serialize};

/// Information about an available model from a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier used in API calls (e.g., "gpt-4o-mini")
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Configuration for a completion API provider.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "openai"
/// type = "openai"
/// endpoint = "https://api.openai.com"
/// api_key = "OPENAI_API_KEY"
/// models = ["gpt-4o-mini"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelProviderConfig {
    pub id: String,
    /// API format: "openai" or "ollama"
    #[serde(rename = "type")]
    pub provider_type: String,
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Custom API path override (e.g., "v1/chat/completions")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    #[serde(rename = "type", default)]
    pub(super) provider_type: String,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default)]
    pub(super) models: Vec<RawModelInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum RawModelInfo {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        display_name: Option<String>,
    },
}

impl From<RawModelInfo> for ModelInfo {
    fn from(value: RawModelInfo) -> Self {
        match value {
            RawModelInfo::Name(name) => Self {
                name,
                display_name: None,
            },
            RawModelInfo::Detailed { name, display_name } => Self { name, display_name },
        }
    }
}

impl From<RawProviderConfig> for ModelProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        Self {
            id: raw.id,
            provider_type: raw.provider_type,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw.api_path,
            models: raw.models.into_iter().map(ModelInfo::from).collect(),
        }
    }
}

impl ModelProviderConfig {
    /// Ensure a model exists in this provider's model list
    pub fn ensure_model(&mut self, model: &str) {
        if self.models.iter().all(|info| info.name != model) {
            self.models.push(ModelInfo {
                name: model.to_string(),
                display_name: None,
            });
        }
    }

    /// Check if this is an Ollama provider (case-insensitive).
    ///
    /// ```
    /// use landscape_agent::config::ModelProviderConfig;
    ///
    /// let provider = ModelProviderConfig {
    ///     id: "local".to_string(),
    ///     provider_type: "Ollama".to_string(),
    ///     endpoint: "http://localhost:11434".to_string(),
    ///     api_key: None,
    ///     api_path: None,
    ///     models: vec![],
    /// };
    /// assert!(provider.is_ollama());
    /// assert!(!provider.is_openai());
    /// ```
    pub fn is_ollama(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("ollama")
    }

    pub fn is_openai(&self) -> bool {
        self.provider_type.eq_ignore_ascii_case("openai")
    }

    pub fn is_supported(&self) -> bool {
        self.is_openai() || self.is_ollama()
    }
}
