use crate::agent::{AgentOptions, Orchestrator};
use crate::tooling::SessionLauncher;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const EXIT_WORDS: &[&str] = &["quit", "exit", "q"];
const PROMPT: &str = "> ";

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interactive console loop. Every line is an independent request with its
/// own tool session; a failed request is reported and the loop continues.
pub async fn run<R, W>(
    agent: &Orchestrator,
    launcher: &SessionLauncher,
    options: &AgentOptions,
    cancel: &CancellationToken,
    reader: R,
    writer: &mut W,
) -> Result<(), StdioError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    writer
        .write_all(b"Ask about a system or the landscape. Empty line or 'quit' leaves.\n")
        .await?;

    loop {
        if cancel.is_cancelled() {
            break;
        }
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let prompt = line.trim();
        if prompt.is_empty() || EXIT_WORDS.contains(&prompt.to_lowercase().as_str()) {
            break;
        }
        debug!("console prompt received");

        let request_cancel = cancel.child_token();
        match agent
            .respond(prompt, launcher, options.clone(), &request_cancel)
            .await
        {
            Ok(outcome) => {
                info!(steps = outcome.steps.len(), "console request answered");
                writer.write_all(outcome.response.trim().as_bytes()).await?;
                writer.write_all(b"\n").await?;
            }
            Err(err) => {
                error!(%err, "console request failed");
                let message = format!("Error: {}\n", err.user_message());
                writer.write_all(message.as_bytes()).await?;
            }
        }
    }

    writer.write_all(b"Bye.\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::OrchestratorSettings;
    use crate::catalog::ToolCatalog;
    use crate::infrastructure::backend::BackendError;
    use crate::landscape::{
        CockpitSource, InventorySearch, LandscapeToolHost, OutputFormat, SearchResponse,
    };
    use crate::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl ModelProvider for Echo {
        async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            let prompt = &request.messages[1].content;
            if prompt == "boom" {
                return Err(ModelError::invalid_response(request.provider, "boom"));
            }
            Ok(ModelResponse::new(format!("echo: {prompt}")))
        }
    }

    struct Offline;

    #[async_trait]
    impl InventorySearch for Offline {
        async fn search(
            &self,
            _query: &str,
            _format: OutputFormat,
        ) -> Result<SearchResponse, BackendError> {
            Ok(SearchResponse::Json(json!([])))
        }
    }

    #[async_trait]
    impl CockpitSource for Offline {
        async fn fetch(&self, _objectid: &str, _systype: &str) -> Result<Value, BackendError> {
            Ok(json!({}))
        }
    }

    async fn console(input: &str) -> String {
        let agent = Orchestrator::new(
            Arc::new(Echo),
            ToolCatalog::landscape(),
            OrchestratorSettings::new("local", "llama3.1"),
        );
        let launcher =
            SessionLauncher::InProcess(LandscapeToolHost::new(Arc::new(Offline), Arc::new(Offline)));
        let mut output = Vec::new();
        run(
            &agent,
            &launcher,
            &AgentOptions::default(),
            &CancellationToken::new(),
            input.as_bytes(),
            &mut output,
        )
        .await
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[tokio::test]
    async fn errors_do_not_end_the_loop() {
        let output = console("boom\nhello\nquit\nnever\n").await;
        assert!(output.contains("Error: "));
        assert!(output.contains("echo: hello"));
        assert!(!output.contains("never"));
        assert!(output.ends_with("Bye.\n"));
    }

    #[tokio::test]
    async fn empty_line_leaves() {
        let output = console("\nhello\n").await;
        assert!(!output.contains("echo"));
    }
}
