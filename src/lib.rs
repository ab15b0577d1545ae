pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, catalog, landscape, stdio, tooling};
pub use cli::{Cli, RunMode};
pub use config::{AppConfig, ModelProviderConfig};
pub use domain::types;
pub use infrastructure::{backend, model, rpc};

use agent::{AgentOptions, Orchestrator, OrchestratorSettings};
use catalog::ToolCatalog;
use config::{ConfigError, Transport};
use landscape::LandscapeToolHost;
use model::DynamicModelProvider;
use rpc::ToolServer;
use serde_json::json;
use std::error::Error;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tooling::SessionLauncher;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Log destination. The tool server keeps stdout for the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
}

pub fn init_tracing(target: LogTarget) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true);
        match target {
            LogTarget::Stdout => builder.init(),
            LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        }
    });
}

pub async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    init_tracing(LogTarget::Stdout);
    info!("Starting landscape-agent");
    debug!(mode = ?cli.mode, config = ?cli.config, "CLI arguments parsed");

    let config = AppConfig::load(cli.config.as_deref())?;
    info!(
        provider = config.default_provider.as_str(),
        model = config.model.as_str(),
        transport = ?config.session.transport,
        "Loaded configuration"
    );

    let provider = DynamicModelProvider::from_configs(&config.providers);
    if let Some(id) = cli.provider.as_deref() {
        if !provider.contains(id) {
            return Err(ConfigError::ProviderNotFound {
                provider: id.to_string(),
            }
            .into());
        }
    }
    let agent = Orchestrator::new(
        Arc::new(provider),
        ToolCatalog::landscape(),
        OrchestratorSettings::from_config(&config),
    );
    let launcher = session_launcher(&config)?;
    info!(session = launcher.describe().as_str(), "Tool session configured");

    let options = AgentOptions {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        system_prompt: cli.system.clone(),
        decision_mode: cli.decision_mode,
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    match cli.mode {
        RunMode::Once => {
            let prompt = load_prompt(&cli)?;
            let outcome = agent.respond(&prompt, &launcher, options, &cancel).await?;
            if cli.json {
                let output = json!({
                    "content": outcome.response,
                    "tool_steps": outcome.steps,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", outcome.response.trim());
            }
        }
        RunMode::Interactive => {
            let reader = BufReader::new(tokio::io::stdin());
            let mut writer = tokio::io::stdout();
            stdio::run(&agent, &launcher, &options, &cancel, reader, &mut writer).await?;
        }
    }
    info!("landscape-agent finished");
    Ok(())
}

/// Hosts the landscape tools on stdin/stdout until the client closes the pipe.
pub async fn serve_tools(config_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    init_tracing(LogTarget::Stderr);
    let config = AppConfig::load(config_path)?;
    config.backend.validate()?;
    let host = LandscapeToolHost::from_config(&config.backend)?;
    info!(
        search = config.backend.search_base_url.as_str(),
        cockpit = config.backend.cockpit_base_url.as_str(),
        "Tool server ready"
    );

    let reader = BufReader::new(tokio::io::stdin());
    ToolServer::new(host)
        .serve(reader, tokio::io::stdout())
        .await?;
    Ok(())
}

fn session_launcher(config: &AppConfig) -> Result<SessionLauncher, Box<dyn Error>> {
    Ok(match config.session.transport {
        Transport::Stdio => {
            let server = config
                .session_server()
                .ok_or(ConfigError::MissingSessionServer)?;
            SessionLauncher::Stdio(server.clone())
        }
        Transport::InProcess => {
            SessionLauncher::InProcess(LandscapeToolHost::from_config(&config.backend)?)
        }
    })
}

fn load_prompt(cli: &Cli) -> Result<String, Box<dyn Error>> {
    if let Some(path) = &cli.prompt_file {
        info!(path = %path.display(), "Loading prompt from file");
        return non_empty(std::fs::read_to_string(path)?);
    }
    if !cli.prompt.is_empty() {
        return non_empty(cli.prompt.join(" "));
    }
    if !std::io::stdin().is_terminal() {
        info!("Reading prompt from standard input");
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return non_empty(buffer);
    }
    Err("prompt required via arguments, --prompt-file, or stdin".into())
}

fn non_empty(prompt: String) -> Result<String, Box<dyn Error>> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err("prompt cannot be empty".into());
    }
    Ok(prompt.to_string())
}
