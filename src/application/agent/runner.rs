use super::errors::AgentError;
use super::instructions::{
    FALLBACK_POLICY, ROUTING_PROMPT, StructuredDecision, structured_decision_schema,
    structured_instructions,
};
use super::models::{AgentOptions, AgentOutcome, AgentStep, OrchestratorSettings, Phase};
use crate::application::catalog::ToolCatalog;
use crate::application::tooling::{SessionLauncher, ToolSession, into_payload};
use crate::config::DecisionMode;
use crate::domain::{
    ChatMessage, ErrorKind, ToolFailure, ToolInvocation, ToolPayload, ToolResult, Transcript,
};
use crate::infrastructure::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DECISION_TURN: u32 = 1;

/// What the first turn asked for.
enum Decision {
    Answer(String),
    Invoke {
        content: String,
        calls: Vec<ToolInvocation>,
    },
    Finalize,
}

/// Runs one decide, dispatch, finalize cycle per request. Holds no
/// per-request state; every run builds and drops its own transcript.
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    catalog: ToolCatalog,
    settings: OrchestratorSettings,
}

struct Run<'a> {
    provider: String,
    model: String,
    mode: DecisionMode,
    session: &'a dyn ToolSession,
    phase: Phase,
    model_calls: usize,
}

impl Run<'_> {
    fn enter(&mut self, next: Phase) {
        info!(from = %self.phase, phase = %next, "phase transition");
        self.phase = next;
    }
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        catalog: ToolCatalog,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            provider,
            catalog,
            settings,
        }
    }

    /// Opens a fresh session, runs the request on it and closes it again.
    pub async fn respond(
        &self,
        prompt: &str,
        launcher: &SessionLauncher,
        options: AgentOptions,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome, AgentError> {
        debug!(session = launcher.describe().as_str(), "opening tool session");
        let session = self.guarded(cancel, launcher.open()).await??;
        let outcome = self.run(prompt, session.as_ref(), options, cancel).await;
        session.close().await;
        outcome
    }

    /// Runs one request against an open session. Cancellation and the
    /// request timeout discard everything produced so far.
    pub async fn run(
        &self,
        prompt: &str,
        session: &dyn ToolSession,
        options: AgentOptions,
        cancel: &CancellationToken,
    ) -> Result<AgentOutcome, AgentError> {
        self.guarded(cancel, self.cycle(prompt, session, options))
            .await?
    }

    async fn guarded<F: Future>(
        &self,
        cancel: &CancellationToken,
        work: F,
    ) -> Result<F::Output, AgentError> {
        let limit = self.settings.request_timeout;
        tokio::select! {
            _ = cancel.cancelled() => {
                warn!("request cancelled");
                Err(AgentError::Cancelled)
            }
            result = tokio::time::timeout(limit, work) => result.map_err(|_| {
                warn!(secs = limit.as_secs(), "request timed out");
                AgentError::TimedOut { secs: limit.as_secs() }
            }),
        }
    }

    async fn cycle(
        &self,
        prompt: &str,
        session: &dyn ToolSession,
        options: AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        let mut run = Run {
            provider: options
                .provider
                .unwrap_or_else(|| self.settings.provider.clone()),
            model: options.model.unwrap_or_else(|| self.settings.model.clone()),
            mode: options.decision_mode.unwrap_or(self.settings.decision_mode),
            session,
            phase: Phase::Idle,
            model_calls: 0,
        };
        info!(
            provider = run.provider.as_str(),
            model = run.model.as_str(),
            mode = ?run.mode,
            "agent run started"
        );

        self.check_hosted(session).await?;

        let system_prompt = options
            .system_prompt
            .or_else(|| self.settings.system_prompt.clone())
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| ROUTING_PROMPT.clone());
        let mut transcript = Transcript::new(system_prompt, prompt);

        run.enter(Phase::Deciding);
        let decision = self.decide(&mut run, &transcript).await?;

        let mut steps = Vec::new();
        match decision {
            Decision::Answer(text) => {
                run.enter(Phase::Done);
                return Ok(AgentOutcome {
                    response: text,
                    steps,
                    model_calls: run.model_calls,
                });
            }
            Decision::Invoke { content, calls } => {
                run.enter(Phase::Dispatching);
                transcript.push_invocations(content, calls.clone());
                for invocation in &calls {
                    let result = self.dispatch(&run, invocation).await?;
                    steps.push(AgentStep {
                        invocation_id: invocation.id.clone(),
                        tool: invocation.tool.clone(),
                        input: invocation.arguments.clone(),
                        success: !result.payload.is_error(),
                        output: result.payload.to_value(),
                    });
                    transcript.push_result(result);
                }
                debug!(results = transcript.results().len(), "dispatch complete");
            }
            Decision::Finalize => {}
        }

        run.enter(Phase::Finalizing);
        transcript.push(ChatMessage::system(FALLBACK_POLICY));
        let request = ModelRequest::new(
            run.provider.clone(),
            run.model.clone(),
            transcript.messages().to_vec(),
        );
        let response = self.complete(&mut run, request).await?;
        let answer = match response.text() {
            Some(text) => text.to_string(),
            None => {
                warn!(steps = steps.len(), "final answer was empty, summarising tool results");
                degraded_answer(&steps)
            }
        };

        run.enter(Phase::Done);
        Ok(AgentOutcome {
            response: answer,
            steps,
            model_calls: run.model_calls,
        })
    }

    async fn decide(&self, run: &mut Run<'_>, transcript: &Transcript) -> Result<Decision, AgentError> {
        match run.mode {
            DecisionMode::Native => {
                let request = ModelRequest::new(
                    run.provider.clone(),
                    run.model.clone(),
                    transcript.messages().to_vec(),
                )
                .with_tools(self.catalog.function_schemas());
                let response = self.complete(run, request).await?;

                if response.tool_calls.is_empty() {
                    let content = response.content.unwrap_or_default();
                    if content.trim().is_empty() {
                        return Err(AgentError::InvalidResponse(
                            "model returned neither content nor tool calls".into(),
                        ));
                    }
                    info!("model answered without tools");
                    return Ok(Decision::Answer(content));
                }

                let calls = response
                    .tool_calls
                    .into_iter()
                    .map(|call| invocation(call.id, call.name, call.arguments))
                    .collect::<Vec<_>>();
                info!(count = calls.len(), "model requested tools");
                Ok(Decision::Invoke {
                    content: response.content.unwrap_or_default(),
                    calls,
                })
            }
            DecisionMode::Structured => {
                let mut messages = transcript.messages().to_vec();
                messages.push(ChatMessage::system(structured_instructions(&self.catalog)));
                let request = ModelRequest::new(run.provider.clone(), run.model.clone(), messages)
                    .with_response_schema(structured_decision_schema());
                let response = self.complete(run, request).await?;
                let content = response.content.unwrap_or_default();
                let decision = StructuredDecision::parse(&content).map_err(|err| {
                    AgentError::InvalidResponse(format!("decision document: {err}"))
                })?;

                let calls: Vec<ToolInvocation> = decision
                    .tool_calls
                    .into_iter()
                    .filter(|entry| entry.wants_tool())
                    .map(|entry| {
                        debug!(
                            tool = entry.function.as_str(),
                            reason = entry.reason.as_str(),
                            "structured tool decision"
                        );
                        invocation(None, entry.function, entry.parameters)
                    })
                    .collect();

                if !calls.is_empty() {
                    info!(count = calls.len(), "model requested tools");
                    Ok(Decision::Invoke {
                        content: String::new(),
                        calls,
                    })
                } else if !decision.answer.trim().is_empty() {
                    info!("model answered without tools");
                    Ok(Decision::Answer(decision.answer))
                } else {
                    Ok(Decision::Finalize)
                }
            }
        }
    }

    /// Executes one invocation. Only session-level failures are returned as
    /// errors; everything else becomes the invocation's result.
    async fn dispatch(
        &self,
        run: &Run<'_>,
        invocation: &ToolInvocation,
    ) -> Result<ToolResult, AgentError> {
        let started = Instant::now();
        let Some(descriptor) = self.catalog.get(&invocation.tool) else {
            warn!(tool = invocation.tool.as_str(), "unknown tool requested");
            return Ok(ToolResult::failure(
                invocation,
                ToolFailure::execution(format!("Unknown tool '{}'", invocation.tool)),
            ));
        };

        let arguments = match descriptor.validate(&invocation.arguments) {
            Ok(arguments) => Value::Object(arguments),
            Err(err) => {
                warn!(tool = descriptor.name, %err, "rejected tool arguments");
                return Ok(ToolResult::failure(
                    invocation,
                    ToolFailure::execution(format!(
                        "Invalid arguments for '{}': {err}",
                        descriptor.name
                    )),
                ));
            }
        };

        let limit = self.settings.tool_timeout;
        let outcome =
            tokio::time::timeout(limit, run.session.call_tool(descriptor.name, arguments)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = match outcome {
            Err(_) => ToolResult::failure(
                invocation,
                ToolFailure::execution(format!(
                    "Tool '{}' did not finish within {}s",
                    descriptor.name,
                    limit.as_secs()
                )),
            ),
            Ok(Ok(output)) => match into_payload(&output) {
                ToolPayload::Value(value) => ToolResult::success(invocation, value),
                ToolPayload::Error(failure) => ToolResult::failure(invocation, failure),
            },
            Ok(Err(err)) if err.is_tool_level() => {
                ToolResult::failure(invocation, ToolFailure::execution(err.to_string()))
            }
            Ok(Err(err)) => return Err(AgentError::Session(err)),
        };
        info!(
            tool = descriptor.name,
            id = invocation.id.as_str(),
            elapsed_ms,
            error = result.payload.is_error(),
            kind = result.payload.failure_kind().map(ErrorKind::as_str),
            "tool finished"
        );
        Ok(result)
    }

    async fn complete(
        &self,
        run: &mut Run<'_>,
        request: ModelRequest,
    ) -> Result<ModelResponse, AgentError> {
        run.model_calls += 1;
        let limit = self.settings.model_timeout;
        match tokio::time::timeout(limit, self.provider.chat(request)).await {
            Ok(response) => Ok(response?),
            Err(_) => Err(ModelError::timeout(run.provider.clone(), limit.as_secs()).into()),
        }
    }

    async fn check_hosted(&self, session: &dyn ToolSession) -> Result<(), AgentError> {
        let hosted: HashSet<String> = session
            .list_tools()
            .await?
            .into_iter()
            .map(|tool| tool.name.to_lowercase())
            .collect();
        for name in self.catalog.names() {
            if !hosted.contains(&name.to_lowercase()) {
                warn!(tool = name, "catalog tool is not hosted by the tool session");
            }
        }
        Ok(())
    }
}

/// Stand-in answer when the final turn comes back blank.
fn degraded_answer(steps: &[AgentStep]) -> String {
    if steps.is_empty() {
        return "No answer could be produced for this request.".to_string();
    }
    let mut answer =
        String::from("No final answer was produced. Tool results gathered for this request:");
    for step in steps {
        let status = if step.success { "ok" } else { "failed" };
        answer.push_str(&format!("\n- {} ({status}): {}", step.tool, step.output));
    }
    answer
}

fn invocation(id: Option<String>, tool: String, arguments: Value) -> ToolInvocation {
    let id = id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(ToolInvocation::generated_id);
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    ToolInvocation::new(id, tool, arguments, DECISION_TURN)
}
