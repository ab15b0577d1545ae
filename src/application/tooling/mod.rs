mod content;
mod error;
mod interface;
mod local;
mod process;

pub use content::{into_payload, unwrap_content};
pub use error::ToolInvokeError;
pub use interface::{ContentPart, ServerToolInfo, ToolCallOutput, ToolSession};
pub use local::InProcessToolSession;
pub use process::{HANDSHAKE_TIMEOUT, PROTOCOL_VERSION, StdioToolSession};

use crate::application::landscape::LandscapeToolHost;
use crate::config::ServerConfig;

/// Opens one tool session per user request.
#[derive(Clone)]
pub enum SessionLauncher {
    Stdio(ServerConfig),
    InProcess(LandscapeToolHost),
}

impl SessionLauncher {
    pub async fn open(&self) -> Result<Box<dyn ToolSession>, ToolInvokeError> {
        match self {
            SessionLauncher::Stdio(server) => {
                Ok(Box::new(StdioToolSession::connect(server.clone()).await?))
            }
            SessionLauncher::InProcess(host) => {
                Ok(Box::new(InProcessToolSession::new(host.clone())))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SessionLauncher::Stdio(server) => format!("stdio:{}", server.name),
            SessionLauncher::InProcess(_) => "in_process".to_string(),
        }
    }
}
