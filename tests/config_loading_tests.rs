// Config loading tests - AppConfig::load against files on disk

use landscape_agent::config::{AppConfig, ConfigError, DecisionMode, Transport};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("agent.toml");
    fs::write(&path, content).expect("Failed to write config");
    path
}

const PROVIDERS: &str = r#"
[[providers]]
id = "ollama"
type = "ollama"
endpoint = "http://127.0.0.1:11434"
models = ["llama3.1"]

[[providers]]
id = "openai"
type = "openai"
endpoint = "https://api.openai.com"
api_key = "OPENAI_API_KEY"
models = [{ name = "gpt-4o-mini", display_name = "GPT-4o mini" }]
"#;

const BACKEND: &str = r#"
[backend]
search_base_url = "https://inventory.example.com"
cockpit_base_url = "https://cockpit.example.com/api/view"
"#;

#[test]
fn returns_error_when_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/agent.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn returns_parse_error_with_path() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "model = [unterminated");
    match AppConfig::load(Some(&path)) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn returns_error_when_model_missing() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        &format!("default_provider = \"ollama\"\n{PROVIDERS}{BACKEND}"),
    );
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::MissingModel)
    ));
}

#[test]
fn returns_error_when_default_provider_not_configured() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        &format!("default_provider = \"gemini\"\nmodel = \"llama3.1\"\n{PROVIDERS}{BACKEND}"),
    );
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::ProviderNotFound { provider }) if provider == "gemini"
    ));
}

#[test]
fn loads_full_stdio_configuration() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        &format!(
            r#"
default_provider = "openai"
model = "gpt-4o-mini"
decision_mode = "structured"
system_prompt = "Only talk about SIDs."
{PROVIDERS}
[timeouts]
tool_secs = 15

[session]
transport = "stdio"
server = "landscape"

[[servers]]
name = "landscape"
command = "/opt/landscape/bin/landscape-tool-server"
args = ["--config", "/etc/landscape/agent.toml"]
env = {{ RUST_LOG = "debug" }}
"#
        ),
    );

    let config = AppConfig::load(Some(&path)).expect("config loads");

    assert_eq!(config.default_provider, "openai");
    assert_eq!(config.decision_mode, DecisionMode::Structured);
    assert_eq!(config.system_prompt.as_deref(), Some("Only talk about SIDs."));
    assert_eq!(config.providers.len(), 2);
    assert_eq!(config.timeouts.tool_secs, 15);
    assert_eq!(config.timeouts.model_secs, 60);
    assert_eq!(config.session.transport, Transport::Stdio);

    let server = config.session_server().expect("session server");
    assert_eq!(
        server.command,
        PathBuf::from("/opt/landscape/bin/landscape-tool-server")
    );
    assert_eq!(server.args, ["--config", "/etc/landscape/agent.toml"]);
    assert_eq!(server.env.get("RUST_LOG").map(String::as_str), Some("debug"));
}

#[test]
fn in_process_transport_loads_backend() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        &format!(
            r#"
default_provider = "ollama"
model = "llama3.1"
{PROVIDERS}
[backend]
search_base_url = "https://inventory.example.com"
cockpit_base_url = "https://cockpit.example.com/api/view"
accept_invalid_certs = true
debug_dump_dir = "/tmp/landscape-dumps"
"#
        ),
    );

    let config = AppConfig::load(Some(&path)).expect("config loads");

    assert_eq!(config.session.transport, Transport::InProcess);
    assert!(config.session_server().is_none());
    assert_eq!(config.backend.search_timeout_secs, 20);
    assert_eq!(config.backend.cockpit_timeout_secs, 30);
    assert!(config.backend.accept_invalid_certs);
    assert_eq!(
        config.backend.debug_dump_dir,
        Some(PathBuf::from("/tmp/landscape-dumps"))
    );
}
