use super::CONFIG_PATH;
use super::app::{AppConfig, DecisionMode, SessionConfig, TimeoutConfig, Transport};
use super::backend::{BackendConfig, RawBackend};
use super::error::ConfigError;
use super::provider::{ModelProviderConfig, RawProviderConfig};
use super::server::{RawServer, ServerConfig};
use dotenvy::from_filename;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub model: Option<String>,
    pub default_provider: Option<String>,
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub decision_mode: DecisionMode,
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,
    #[serde(default)]
    pub backend: RawBackend,
    #[serde(default)]
    pub timeouts: RawTimeouts,
    #[serde(default)]
    pub session: RawSession,
    #[serde(default)]
    pub servers: Vec<RawServer>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawTimeouts {
    model_secs: Option<u64>,
    tool_secs: Option<u64>,
    request_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawSession {
    #[serde(default)]
    transport: Transport,
    server: Option<String>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename("config/.env");
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

/// Parses and validates configuration text; `path` is only used in errors.
pub fn parse_config(content: &str, path: &Path) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_and_build(parsed)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading agent configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let model = parsed.model.ok_or(ConfigError::MissingModel)?;
    let default_provider = parsed
        .default_provider
        .ok_or(ConfigError::MissingDefaultProvider)?;

    if parsed.providers.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }

    let mut providers: Vec<ModelProviderConfig> = Vec::new();
    for raw_provider in parsed.providers {
        if raw_provider.endpoint.is_none() {
            return Err(ConfigError::MissingEndpoint {
                provider: raw_provider.id.clone(),
            });
        }
        let provider = ModelProviderConfig::from(raw_provider);
        if !provider.is_supported() {
            return Err(ConfigError::UnsupportedProviderType {
                provider: provider.id,
                provider_type: provider.provider_type,
            });
        }
        providers.push(provider);
    }
    if !providers.iter().any(|p| p.id == default_provider) {
        return Err(ConfigError::ProviderNotFound {
            provider: default_provider,
        });
    }
    if let Some(provider) = providers.iter_mut().find(|p| p.id == default_provider) {
        provider.ensure_model(&model);
    }

    let defaults = TimeoutConfig::default();
    let timeouts = TimeoutConfig {
        model_secs: parsed.timeouts.model_secs.unwrap_or(defaults.model_secs),
        tool_secs: parsed.timeouts.tool_secs.unwrap_or(defaults.tool_secs),
        request_secs: parsed.timeouts.request_secs.unwrap_or(defaults.request_secs),
    };
    for (field, value) in [
        ("timeouts.model_secs", timeouts.model_secs),
        ("timeouts.tool_secs", timeouts.tool_secs),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidTimeout { field });
        }
    }

    let servers: Vec<ServerConfig> = parsed.servers.into_iter().map(ServerConfig::from).collect();
    let session = SessionConfig {
        transport: parsed.session.transport,
        server: parsed.session.server,
    };
    let backend = BackendConfig::from(parsed.backend);
    match session.transport {
        Transport::Stdio => {
            let name = session
                .server
                .as_deref()
                .ok_or(ConfigError::MissingSessionServer)?;
            if !servers.iter().any(|server| server.name == name) {
                return Err(ConfigError::UnknownServer {
                    server: name.to_string(),
                });
            }
        }
        Transport::InProcess => backend.validate()?,
    }

    Ok(AppConfig {
        default_provider,
        model,
        system_prompt: parsed.system_prompt.filter(|prompt| !prompt.trim().is_empty()),
        decision_mode: parsed.decision_mode,
        providers,
        backend,
        timeouts,
        session,
        servers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        default_provider = "local"
        model = "llama3.1"

        [[providers]]
        id = "local"
        type = "ollama"
        endpoint = "http://127.0.0.1:11434"

        [backend]
        search_base_url = "https://inventory.example/slim"
        cockpit_base_url = "https://inventory.example/slim/API/cockpit"
    "#;

    fn parse(content: &str) -> Result<AppConfig, ConfigError> {
        parse_config(content, Path::new("agent.toml"))
    }

    #[test]
    fn applies_defaults() {
        let config = parse(MINIMAL).expect("valid config");
        assert_eq!(config.decision_mode, DecisionMode::Native);
        assert_eq!(config.session.transport, Transport::InProcess);
        assert_eq!(config.timeouts, TimeoutConfig::default());
        assert_eq!(config.backend.search_timeout_secs, 20);
        assert_eq!(config.backend.cockpit_timeout_secs, 30);
        assert_eq!(config.providers[0].models[0].name, "llama3.1");
    }

    #[test]
    fn in_process_transport_requires_backend_urls() {
        let content = MINIMAL.replace("search_base_url", "unused_key");
        let err = parse(&content).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingBackendUrl {
                field: "search_base_url"
            }
        ));
    }

    #[test]
    fn stdio_transport_must_name_known_server() {
        let content = format!("{MINIMAL}\n[session]\ntransport = \"stdio\"\nserver = \"landscape\"\n");
        let err = parse(&content).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownServer { ref server } if server == "landscape"));
    }

    #[test]
    fn rejects_unsupported_provider_type() {
        let content = MINIMAL.replace("type = \"ollama\"", "type = \"gemini\"");
        let err = parse(&content).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProviderType { .. }));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let content = format!("{MINIMAL}\n[timeouts]\ntool_secs = 0\n");
        let err = parse(&content).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTimeout {
                field: "timeouts.tool_secs"
            }
        ));
    }
}
