use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// A tool server process the agent can spawn as its remote tool session.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    name: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
}

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        let command = PathBuf::from(expand(&raw.command));
        let workdir = raw.workdir.map(|d| PathBuf::from(expand(&d)));
        let args = raw.args.into_iter().map(|arg| expand(&arg)).collect();
        let env = raw
            .env
            .into_iter()
            .map(|(key, value)| (key, expand(&value)))
            .collect();

        Self {
            name: raw.name,
            command,
            args,
            env,
            workdir,
        }
    }
}
