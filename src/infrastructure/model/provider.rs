//! Dynamic model provider with multiple backends

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use super::factory::ProviderFactory;
use super::traits::{ModelClient, ModelProvider};
use super::types::{ModelError, ModelRequest, ModelResponse};
use crate::config::ModelProviderConfig;

struct ProviderRuntime {
    models: HashSet<String>,
    client: Box<dyn ModelClient>,
}

impl ProviderRuntime {
    fn supports(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.contains(model)
    }
}

/// Routes requests to the backend named by `ModelRequest::provider`
#[derive(Default)]
pub struct DynamicModelProvider {
    backends: HashMap<String, ProviderRuntime>,
}

impl DynamicModelProvider {
    pub fn from_configs(configs: &[ModelProviderConfig]) -> Self {
        let backends = configs
            .iter()
            .map(|config| {
                let runtime = ProviderRuntime {
                    models: config.models.iter().map(|m| m.name.clone()).collect(),
                    client: ProviderFactory::create(config),
                };
                (config.id.clone(), runtime)
            })
            .collect();
        Self { backends }
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.backends.contains_key(provider)
    }
}

#[async_trait]
impl ModelProvider for DynamicModelProvider {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let provider_id = &request.provider;

        let runtime = self
            .backends
            .get(provider_id)
            .ok_or_else(|| ModelError::provider_not_found(provider_id))?;

        if !runtime.supports(&request.model) {
            return Err(ModelError::model_not_found(provider_id, &request.model));
        }

        runtime.client.chat(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelInfo;
    use crate::domain::ChatMessage;

    fn provider() -> DynamicModelProvider {
        DynamicModelProvider::from_configs(&[ModelProviderConfig {
            id: "local".into(),
            provider_type: "ollama".into(),
            endpoint: "http://127.0.0.1:1".into(),
            api_key: None,
            api_path: None,
            models: vec![ModelInfo {
                name: "llama3.1".into(),
                display_name: None,
            }],
        }])
    }

    #[tokio::test]
    async fn rejects_unknown_provider_and_model() {
        let provider = provider();
        assert!(provider.contains("local"));

        let err = provider
            .chat(ModelRequest::new("remote", "llama3.1", vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ProviderNotFound { .. }));

        let err = provider
            .chat(ModelRequest::new("local", "mistral", vec![ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::ModelNotFound { .. }));
    }
}
